//! Session assembly: access token + refresh token + user projection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sesame_core::error::SesameError;
use sesame_core::models::refresh_token::CreateRefreshToken;
use sesame_core::models::user::{SessionUser, UpdateUser, User};
use sesame_core::repository::{RefreshTokenRepository, UserRepository};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock, compute_expiry};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::{self, AccessTokenIssuer};

/// A freshly issued session. Never persisted; the refresh token is the
/// durable handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub access_token_expires_in: u64,
    pub refresh_token: String,
    pub user: SessionUser,
}

/// Builds sessions for already-authenticated users.
///
/// Exposed on its own so a refresh endpoint can extend a session
/// without going through the sign-in decision again.
pub struct SessionAssembler<U, R, I> {
    user_repo: U,
    token_repo: R,
    issuer: I,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl<U, R, I> SessionAssembler<U, R, I>
where
    U: UserRepository + Clone + 'static,
    R: RefreshTokenRepository,
    I: AccessTokenIssuer,
{
    pub fn new(user_repo: U, token_repo: R, issuer: I, config: AuthConfig) -> Self {
        Self {
            user_repo,
            token_repo,
            issuer,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source (tests pin it with a `FixedClock`).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issue a session for `user`.
    ///
    /// With `current_refresh_token` the existing token's expiry is
    /// pushed forward and the same string is returned; without one a
    /// new token is inserted.
    pub async fn get_new_or_update_current_session(
        &self,
        user: &User,
        current_refresh_token: Option<&str>,
    ) -> Result<Session, AuthError> {
        self.touch_last_seen(user.id);

        let session_user = self.user_repo.get_session_user(user.id).await?;
        let access_token = self.issuer.create_access_token(user)?;

        let refresh_token = match current_refresh_token {
            Some(current) => self.extend_refresh_token(current).await?,
            None => self.insert_refresh_token(user.id).await?,
        };

        Ok(Session {
            access_token,
            access_token_expires_in: self.config.access_token_expires_in,
            refresh_token,
            user: session_user,
        })
    }

    /// Record `last_seen` in a detached task. Failures are logged and
    /// never reach the caller.
    fn touch_last_seen(&self, user_id: Uuid) {
        let repo = self.user_repo.clone();
        let update = UpdateUser {
            last_seen: Some(self.clock.now()),
            ..Default::default()
        };

        tokio::spawn(async move {
            if let Err(e) = repo.update(user_id, update).await {
                warn!(user_id = %user_id, error = %e, "Failed to update last_seen");
            }
        });
    }

    async fn extend_refresh_token(&self, token: &str) -> Result<String, AuthError> {
        let now = self.clock.now();
        let expires_at = compute_expiry(self.clock.as_ref(), self.config.refresh_token_expires_in)?;

        let stored = self
            .token_repo
            .update_expires_at(token, now, expires_at)
            .await
            .map_err(|e| match e {
                SesameError::NotFound { .. } => AuthError::RefreshTokenInvalid,
                other => other.into(),
            })?;

        debug!(user_id = %stored.user_id, %expires_at, "Extended refresh token");
        Ok(stored.token)
    }

    async fn insert_refresh_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let expires_at = compute_expiry(self.clock.as_ref(), self.config.refresh_token_expires_in)?;

        let stored = self
            .token_repo
            .create(CreateRefreshToken {
                user_id,
                token: token::generate_refresh_token(),
                expires_at,
            })
            .await?;

        debug!(user_id = %user_id, %expires_at, "Inserted refresh token");
        Ok(stored.token)
    }
}
