//! Authentication error types.

use sesame_core::error::SesameError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user {user_id} not found")]
    UserNotFound { user_id: Uuid },

    #[error("user {user_id} is disabled")]
    UserDisabled { user_id: Uuid },

    #[error("store failure: {0}")]
    Store(#[from] SesameError),

    #[error("could not issue access token: {0}")]
    Issuer(String),

    #[error("refresh token is invalid or has been revoked")]
    RefreshTokenInvalid,

    #[error("refresh token has expired")]
    RefreshTokenExpired,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("expiry offset of {offset_secs}s is out of range")]
    ExpiryOutOfRange { offset_secs: u64 },
}

impl From<AuthError> for SesameError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(inner) => inner,
            AuthError::Issuer(msg) => SesameError::Crypto(msg),
            AuthError::ExpiryOutOfRange { .. } => SesameError::Validation {
                message: err.to_string(),
            },
            AuthError::UserNotFound { .. }
            | AuthError::UserDisabled { .. }
            | AuthError::RefreshTokenInvalid
            | AuthError::RefreshTokenExpired
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => SesameError::AuthenticationFailed {
                reason: err.to_string(),
            },
        }
    }
}
