// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const AUTH_SIGNUP: &str = "auth.signup";
pub const AUTH_LOGIN_SUCCESS: &str = "auth.login.success";
pub const AUTH_LOGIN_FAILURE: &str = "auth.login.failure";
pub const AUTH_REFRESH: &str = "auth.refresh";
pub const AUTH_RATE_LIMITED: &str = "auth.rate_limited";
pub const AUTH_RATE_LIMIT_STORE_ERRORS: &str = "auth.rate_limit.store_errors";
pub const BREAKER_STATE_CHANGES: &str = "breaker.state_changes";
pub const BREAKER_REJECTED: &str = "breaker.rejected";
pub const COUNTERS_PURGED: &str = "counters.purged";
