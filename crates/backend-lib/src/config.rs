// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered: compiled-in defaults, then an optional TOML file,
//! then environment variables prefixed with `TRADEDESK_` (nested keys use
//! `__`, e.g. `TRADEDESK_AUTH__ACCESS_SECRET`).
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "TRADEDESK_";

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const DEV_ACCESS_SECRET: &str = "dev-access-secret-change-me";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-change-me";

/// Errors raised while loading or validating settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener
    pub server: ServerSettings,
    /// `EnvFilter` directive, e.g. `info` or `info,tower_http=debug`
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// User persistence
    pub storage: StorageSettings,
    /// Token signing and password hashing
    pub auth: AuthSettings,
    /// Per-route circuit breakers
    pub circuit_breaker: CircuitBreakerSettings,
    /// Login attempt limiting
    pub rate_limit: RateLimitSettings,
    /// Cross-origin policy
    pub cors: CorsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Users live only as long as the process
    Memory,
    /// Users are kept in `<path>/users.json`
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

/// Token and password settings.
///
/// The two signing secrets must differ so that leaking one of them does not
/// allow forging the other kind of token.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    /// scrypt cost parameter (log2 of N)
    pub password_cost_log_n: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Upper bound for a single guarded call, 0 disables the bound
    pub timeout_ms: u64,
    /// Consecutive failures that trip a closed breaker
    pub error_threshold: u32,
    /// Cool-down before an open breaker admits trial requests
    pub reset_timeout_secs: u64,
    /// Length of the closed-state counting interval, 0 never resets
    pub interval_secs: u64,
    /// Requests needed in an interval before the failure ratio is considered
    pub min_requests: u32,
    /// Failure ratio that trips a closed breaker
    pub failure_ratio: f64,
    /// Trial requests admitted while half-open, also the successes needed to close
    pub half_open_max_requests: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub login_window_secs: u64,
    pub login_max_attempts: u64,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a proxy that overwrites these headers.
    pub trust_forwarded_headers: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            storage: StorageSettings::default(),
            auth: AuthSettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            rate_limit: RateLimitSettings::default(),
            cors: CorsSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("data"),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_secret: DEV_ACCESS_SECRET.to_string(),
            refresh_secret: DEV_REFRESH_SECRET.to_string(),
            access_ttl_secs: 10 * 60,
            refresh_ttl_secs: 168 * 60 * 60,
            password_cost_log_n: 15,
        }
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            error_threshold: 5,
            reset_timeout_secs: 30,
            interval_secs: 10,
            min_requests: 3,
            failure_ratio: 0.6,
            half_open_max_requests: 3,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login_window_secs: 15 * 60,
            login_max_attempts: 5,
            trust_forwarded_headers: false,
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("password_cost_log_n", &self.password_cost_log_n)
            .finish()
    }
}

impl AuthSettings {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    /// Whether either secret is still the compiled-in development value
    pub fn uses_dev_secrets(&self) -> bool {
        self.access_secret == DEV_ACCESS_SECRET || self.refresh_secret == DEV_REFRESH_SECRET
    }
}

impl CircuitBreakerSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }

    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl RateLimitSettings {
    pub fn login_window(&self) -> Duration {
        Duration::from_secs(self.login_window_secs)
    }
}

impl Settings {
    /// Load settings from the given TOML file and the environment.
    /// A missing file is not an error; defaults fill the gaps.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(path.as_ref())
            .extract()
            .map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The provider stack used by [`Settings::load_from`]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address: {e}")))
    }

    /// Reject settings the server cannot run safely with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            return invalid("log_level is not a valid filter directive");
        }

        let auth = &self.auth;
        if auth.access_secret.is_empty() || auth.refresh_secret.is_empty() {
            return invalid("signing secrets must not be empty");
        }
        if auth.access_secret == auth.refresh_secret {
            return invalid("access and refresh signing secrets must differ");
        }
        if auth.access_ttl_secs == 0 || auth.refresh_ttl_secs == 0 {
            return invalid("token lifetimes must be positive");
        }
        if !(1..=24).contains(&auth.password_cost_log_n) {
            return invalid("password_cost_log_n must be between 1 and 24");
        }

        let cb = &self.circuit_breaker;
        if cb.min_requests == 0 || cb.error_threshold == 0 {
            return invalid("circuit breaker thresholds must be positive");
        }
        if !(cb.failure_ratio > 0.0 && cb.failure_ratio <= 1.0) {
            return invalid("failure_ratio must be in (0, 1]");
        }
        if cb.half_open_max_requests == 0 || cb.reset_timeout_secs == 0 {
            return invalid("half-open trials and reset timeout must be positive");
        }

        if self.rate_limit.login_window_secs == 0 || self.rate_limit.login_max_attempts == 0 {
            return invalid("login rate limit window and attempts must be positive");
        }

        self.bind_addr().map(|_| ())
    }
}
