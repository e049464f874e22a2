use async_trait::async_trait;
use tradedesk_common::{AuthResponse, UserId};

use crate::error::AppError;

/// Identity attached to requests that passed the access-token gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new account and log it in
    async fn signup(&self, email: &str, password: &str) -> Result<AuthResponse, AppError>;

    /// Exchange credentials for a token pair
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError>;

    /// Exchange a refresh token for a fresh token pair
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError>;

    /// Check an access token and return who it belongs to
    fn validate_access_token(&self, token: &str) -> Result<AuthenticatedUser, AppError>;
}
