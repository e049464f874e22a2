use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use tradedesk_common::{AuthResponse, UserId};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{AuthService, AuthenticatedUser, TokenCodec, TokenError};
use crate::error::AppError;
use crate::metrics::{AUTH_LOGIN_FAILURE, AUTH_LOGIN_SUCCESS, AUTH_REFRESH, AUTH_SIGNUP};
use crate::storage::UserStore;
use crate::validation::{normalize_email, validate_email, validate_password};

/// Hashed once and verified against for unknown emails, so that login costs
/// one scrypt verification whether or not the account exists
const DUMMY_PASSWORD: &str = "tradedesk-unknown-account";

pub struct DefaultAuth {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenCodec>,
    password_cost_log_n: u8,
    dummy_hash: OnceCell<String>,
}

impl DefaultAuth {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenCodec>, password_cost_log_n: u8) -> Self {
        Self {
            users,
            tokens,
            password_cost_log_n,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Spend the same scrypt work as a real verification
    async fn verify_against_dummy(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| hash_password_blocking(DUMMY_PASSWORD, self.password_cost_log_n))
            .await;

        match dummy {
            Ok(hash) => {
                verify_password_blocking(hash.clone(), password).await;
            },
            Err(e) => warn!(error = %e, "failed to prepare dummy password hash"),
        }
    }

    fn issue_pair(&self, user_id: UserId, email: &str) -> Result<AuthResponse, AppError> {
        let access_token = self
            .tokens
            .issue_access(user_id, email)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let refresh_token = self
            .tokens
            .issue_refresh(user_id)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.tokens.access_ttl_secs(),
        })
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn signup(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let hash = hash_password_blocking(password, self.password_cost_log_n)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        // The store enforces uniqueness again for signups racing past the check above.
        let user = self.users.create(&email, &hash).await?;

        counter!(AUTH_SIGNUP).increment(1);
        info!(user_id = %user.id, "user signed up");

        self.issue_pair(user.id, &user.email)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.verify_against_dummy(password).await;
            counter!(AUTH_LOGIN_FAILURE).increment(1);
            debug!("login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password_blocking(user.password_hash.clone(), password).await {
            counter!(AUTH_LOGIN_FAILURE).increment(1);
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        counter!(AUTH_LOGIN_SUCCESS).increment(1);
        info!(user_id = %user.id, "user logged in");

        self.issue_pair(user.id, &user.email)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let claims = self
            .tokens
            .validate_refresh(refresh_token)
            .map_err(|e| match e {
                TokenError::Expired => AppError::RefreshTokenExpired,
                other => AppError::RefreshTokenInvalid(other),
            })?;

        let user = self
            .users
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        counter!(AUTH_REFRESH).increment(1);
        debug!(user_id = %user.id, "tokens refreshed");

        self.issue_pair(user.id, &user.email)
    }

    fn validate_access_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self
            .tokens
            .validate_access(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))?;

        Ok(AuthenticatedUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}
