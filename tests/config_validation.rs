//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use opcode_socket::config::{LoggingConfig, ServerConfig, SocketConfig};
use opcode_socket::{OpcodeWidth, Server};
use std::time::Duration;

#[test]
fn test_default_config_validates() {
    let config = SocketConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_hostname_server_address() {
    let config = ServerConfig::default_with_overrides(|c| c.address = "localhost".to_string());
    assert!(config.validate().is_empty());
    assert_eq!(config.bind_address(), "localhost:5000");
    assert!(Server::<u16>::builder(config).build().is_ok());
}

#[test]
fn test_blank_server_address() {
    let config = ServerConfig::default_with_overrides(|c| c.address = "   ".to_string());
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_empty_server_address() {
    let mut config = SocketConfig::default();
    config.server.address = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_zero_header_size() {
    let config = ServerConfig::default_with_overrides(|c| c.header_size = 0);
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Header size")));
}

#[test]
fn test_read_timeout_bounds() {
    let short = ServerConfig::default_with_overrides(|c| c.read_timeout = Duration::from_millis(1));
    assert!(short.validate().iter().any(|e| e.contains("too short")));

    let long = ServerConfig::default_with_overrides(|c| c.read_timeout = Duration::from_secs(600));
    assert!(long.validate().iter().any(|e| e.contains("too long")));
}

#[test]
fn test_zero_frame_limit() {
    let config = ServerConfig::default_with_overrides(|c| c.max_frame_length = 0);
    assert!(config.validate_strict().is_err());
}

#[test]
fn test_multiple_errors_are_collected() {
    let config = ServerConfig::default_with_overrides(|c| {
        c.address = String::new();
        c.header_size = 0;
        c.max_frame_length = 0;
    });
    assert_eq!(config.validate().len(), 3);

    let message = config.validate_strict().unwrap_err().to_string();
    assert!(message.contains("Configuration validation failed"));
}

#[test]
fn test_empty_log_level() {
    let logging = LoggingConfig {
        level: "  ".to_string(),
        ..LoggingConfig::default()
    };
    assert_eq!(logging.validate().len(), 1);
}

#[test]
fn test_full_toml_file() {
    let text = r#"
        [server]
        address = "127.0.0.1"
        port = 8484
        header_size = 4
        read_timeout = 2500
        max_frame_length = 4096
        shutdown_timeout = 3000
        opcode_width = "wide"

        [logging]
        level = "debug"
        json_format = true
    "#;

    let config = SocketConfig::from_toml(text).expect("valid TOML");
    assert_eq!(config.server.bind_address(), "127.0.0.1:8484");
    assert_eq!(config.server.read_timeout, Duration::from_millis(2500));
    assert_eq!(config.server.max_frame_length, 4096);
    assert_eq!(config.server.opcode_width, Some(OpcodeWidth::Wide));
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_format);
    assert!(!config.logging.show_target);
    assert!(config.validate().is_empty());
}

#[test]
fn test_config_file_roundtrip() {
    let path = std::env::temp_dir().join(format!("opcode-socket-{}.toml", std::process::id()));
    std::fs::write(&path, SocketConfig::example_config()).expect("write config");

    let loaded = SocketConfig::from_file(&path).expect("load config");
    assert_eq!(loaded.server.port, 5000);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_missing_file_is_config_error() {
    let err = SocketConfig::from_file("/nonexistent/opcode-socket.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_bad_toml_is_config_error() {
    assert!(SocketConfig::from_toml("[server]\nport = \"high\"").is_err());
}
