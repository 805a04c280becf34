//! Observability and Metrics
//!
//! Per-server counters for connection lifecycle, framing and dispatch.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector shared by the accept loop, sessions and dispatch tasks
#[derive(Debug)]
pub struct Metrics {
    /// Total connections accepted
    pub connections_total: AtomicU64,
    /// Currently live sessions
    pub connections_active: AtomicU64,
    /// Transient accept failures
    pub accept_errors: AtomicU64,
    /// Complete frames read
    pub frames_received: AtomicU64,
    /// Header and body bytes read
    pub bytes_received: AtomicU64,
    /// Read deadlines that expired without data
    pub read_timeouts: AtomicU64,
    /// Messages handed to a registered handler
    pub messages_dispatched: AtomicU64,
    /// Messages dropped for lack of a handler
    pub messages_unhandled: AtomicU64,
    /// Sessions that ended on an error rather than a clean close
    pub session_errors: AtomicU64,
    /// Frames rejected for exceeding the configured length
    pub oversized_frames: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            accept_errors: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            read_timeouts: AtomicU64::new(0),
            messages_dispatched: AtomicU64::new(0),
            messages_unhandled: AtomicU64::new(0),
            session_errors: AtomicU64::new(0),
            oversized_frames: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a new connection
    pub fn connection_established(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection closed
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn accept_error(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, byte_count: u64) {
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_timeout(&self) {
        self.read_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_dispatched(&self) {
        self.messages_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_unhandled(&self) {
        self.messages_unhandled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_error(&self) {
        self.session_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn oversized_frame(&self) {
        self.oversized_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
            messages_dispatched: self.messages_dispatched.load(Ordering::Relaxed),
            messages_unhandled: self.messages_unhandled.load(Ordering::Relaxed),
            session_errors: self.session_errors.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            connections_total = snapshot.connections_total,
            connections_active = snapshot.connections_active,
            accept_errors = snapshot.accept_errors,
            frames_received = snapshot.frames_received,
            bytes_received = snapshot.bytes_received,
            read_timeouts = snapshot.read_timeouts,
            messages_dispatched = snapshot.messages_dispatched,
            messages_unhandled = snapshot.messages_unhandled,
            session_errors = snapshot.session_errors,
            oversized_frames = snapshot.oversized_frames,
            uptime_seconds = snapshot.uptime_seconds,
            "Server metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub accept_errors: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub read_timeouts: u64,
    pub messages_dispatched: u64,
    pub messages_unhandled: u64,
    pub session_errors: u64,
    pub oversized_frames: u64,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_gauge() {
        let m = Metrics::new();
        m.connection_established();
        m.connection_established();
        m.connection_closed();
        let s = m.snapshot();
        assert_eq!(s.connections_total, 2);
        assert_eq!(s.connections_active, 1);
    }

    #[test]
    fn test_dispatch_counters() {
        let m = Metrics::default();
        m.message_dispatched();
        m.message_unhandled();
        m.message_unhandled();
        let s = m.snapshot();
        assert_eq!(s.messages_dispatched, 1);
        assert_eq!(s.messages_unhandled, 2);
    }
}
