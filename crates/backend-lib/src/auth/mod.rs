// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod rate_limit;
pub mod token;
mod service;
mod service_impl;

pub use password::{hash_password, verify_password, PasswordHashError};
pub use rate_limit::{AuthRateLimiter, RateLimitDecision};
pub use service::{AuthService, AuthenticatedUser};
pub use service_impl::DefaultAuth;
pub use token::{AccessClaims, RefreshClaims, TokenCodec, TokenError, TokenKind};
