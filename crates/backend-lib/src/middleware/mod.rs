// crates/backend-lib/src/middleware/mod.rs

//! Request guards: access-token gate, login rate limit and circuit breaking.

pub mod auth;
pub mod circuit_breaker;
pub mod rate_limit;

pub use auth::require_auth;
pub use circuit_breaker::circuit_breaker;
pub use rate_limit::{client_key, login_rate_limit};
