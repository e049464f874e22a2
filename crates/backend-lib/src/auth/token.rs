// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed access and refresh tokens (HMAC JWTs).
//!
//! Access and refresh tokens are signed with different secrets and carry a
//! `token_type` claim, so neither kind can stand in for the other.
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tradedesk_common::UserId;
use uuid::Uuid;

use crate::config::AuthSettings;

/// `iss` claim of every token we mint
pub const ISSUER: &str = "trading-platform";

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Which of the two token kinds is expected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Claims of a short-lived access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: UserId,
    pub email: String,
    pub token_type: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub sub: String,
    pub iss: String,
    pub jti: String,
}

/// Claims of a long-lived refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub user_id: UserId,
    pub token_type: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub sub: String,
    pub iss: String,
    pub jti: String,
}

/// Token failures. Everything except [`TokenError::Signing`] is the
/// caller's fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token is signed with an unexpected algorithm")]
    WrongSigningAlgorithm,

    #[error("token issuer is not accepted")]
    WrongIssuer,

    #[error("expected {expected} token, got {found}")]
    WrongTokenType {
        expected: &'static str,
        found: String,
    },

    #[error("signing key misconfigured: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::WrongSigningAlgorithm
            },
            ErrorKind::InvalidIssuer => TokenError::WrongIssuer,
            _ => TokenError::Malformed,
        }
    }
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and validates both token kinds
pub struct TokenCodec {
    access: SigningKey,
    refresh: SigningKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec from settings. Fails if the secrets are empty or equal.
    pub fn new(settings: &AuthSettings) -> Result<Self, TokenError> {
        if settings.access_secret.is_empty() || settings.refresh_secret.is_empty() {
            return Err(TokenError::Signing("signing secret is empty".to_string()));
        }
        if settings.access_secret == settings.refresh_secret {
            return Err(TokenError::Signing(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        // Any HMAC variant is accepted; RSA/EC/EdDSA headers are rejected
        // before the signature is looked at.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss"]);

        Ok(Self {
            access: SigningKey::from_secret(&settings.access_secret),
            refresh: SigningKey::from_secret(&settings.refresh_secret),
            access_ttl: settings.access_ttl(),
            refresh_ttl: settings.refresh_ttl(),
            validation,
        })
    }

    /// Lifetime of access tokens in seconds, reported as `expires_in`
    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl.as_secs()
    }

    pub fn issue_access(&self, user_id: UserId, email: &str) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            user_id,
            email: email.to_string(),
            token_type: TokenKind::Access.as_str().to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl_secs(self.access_ttl),
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        };
        sign(&claims, &self.access.encoding)
    }

    pub fn issue_refresh(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            user_id,
            token_type: TokenKind::Refresh.as_str().to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl_secs(self.refresh_ttl),
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        };
        sign(&claims, &self.refresh.encoding)
    }

    pub fn validate_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.validate(token, TokenKind::Access)?;
        check_subject(&claims.sub, claims.user_id)?;
        Ok(claims)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.validate(token, TokenKind::Refresh)?;
        check_subject(&claims.sub, claims.user_id)?;
        Ok(claims)
    }

    /// Verify signature, algorithm, time window and issuer with the key of
    /// `kind`, then check the `token_type` claim before shaping the claims.
    fn validate<C: DeserializeOwned>(&self, token: &str, kind: TokenKind) -> Result<C, TokenError> {
        let key = match kind {
            TokenKind::Access => &self.access.decoding,
            TokenKind::Refresh => &self.refresh.decoding,
        };

        let raw = decode::<serde_json::Value>(token, key, &self.validation)?.claims;

        let found = raw
            .get("token_type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("none");
        if found != kind.as_str() {
            return Err(TokenError::WrongTokenType {
                expected: kind.as_str(),
                found: found.to_string(),
            });
        }

        serde_json::from_value(raw).map_err(|_| TokenError::Malformed)
    }
}

fn sign<C: Serialize>(claims: &C, key: &EncodingKey) -> Result<String, TokenError> {
    encode(&Header::new(SIGNING_ALGORITHM), claims, key)
        .map_err(|e| TokenError::Signing(e.to_string()))
}

fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 2)
}

fn check_subject(sub: &str, user_id: UserId) -> Result<(), TokenError> {
    if sub == user_id.to_string() {
        Ok(())
    } else {
        Err(TokenError::Malformed)
    }
}
