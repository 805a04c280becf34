//! # Timeouts
//!
//! Default durations and a timeout wrapper that maps elapsed deadlines onto
//! [`ServerError::Timeout`].

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, ServerError};

/// Deadline for a single socket read. Expiry only re-polls the read.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for writing one outbound packet.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long `serve` waits for sessions and handlers after shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Back-off after a transient accept failure (e.g. file descriptor exhaustion).
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Run `fut`, failing with [`ServerError::Timeout`] if it does not finish in time.
pub async fn with_timeout_error<F, T>(fut: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(ServerError::Timeout),
    }
}
