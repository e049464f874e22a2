// ==========================
// tests/unit/config_tests.rs
// ==========================
//! Unit tests for the configuration module
use backend_lib::config::{LogFormat, Settings, StorageBackend};
use std::path::Path;

/// The shipped configuration file at the workspace root
fn shipped_config() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../config/default.toml"))
}

#[test]
fn test_shipped_config_loads_and_matches_defaults() {
    let settings = Settings::load_from(shipped_config()).unwrap();
    let defaults = Settings::default();

    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.log_format, LogFormat::Pretty);
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
    assert_eq!(settings.auth.access_ttl_secs, defaults.auth.access_ttl_secs);
    assert_eq!(settings.auth.refresh_ttl_secs, defaults.auth.refresh_ttl_secs);
    assert_eq!(
        settings.circuit_breaker.reset_timeout_secs,
        defaults.circuit_breaker.reset_timeout_secs
    );
    assert_eq!(
        settings.rate_limit.login_max_attempts,
        defaults.rate_limit.login_max_attempts
    );
    assert!(settings.cors.allowed_origins.is_empty());
}

#[test]
fn test_shipped_config_keeps_dev_secrets_out_of_file() {
    // secrets come from defaults or the environment, never the checked-in file
    let settings = Settings::load_from(shipped_config()).unwrap();
    assert!(settings.auth.uses_dev_secrets());
}

#[test]
fn test_bind_addr() {
    let settings = Settings::load_from(shipped_config()).unwrap();
    assert_eq!(settings.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
}
