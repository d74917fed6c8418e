//! Authentication service: sign-in and refresh orchestration.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use sesame_core::error::SesameError;
use sesame_core::models::user::{MfaType, UpdateUser, User};
use sesame_core::repository::{RefreshTokenRepository, UserRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::mfa::{MfaChallenge, Ticket};
use crate::session::{Session, SessionAssembler};
use crate::token::AccessTokenIssuer;

/// Input for the sign-in flow. The caller has already verified the
/// user's primary credential.
#[derive(Debug, Clone)]
pub struct SignInInput {
    pub user_id: Uuid,
    /// Whether an active second factor should interrupt sign-in.
    pub check_mfa: bool,
}

/// Result of a sign-in: a session, or a challenge that must be
/// answered before one is granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SessionIssued(Session),
    MfaChallenge(MfaChallenge),
}

impl SignInOutcome {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SignInOutcome::SessionIssued(session) => Some(session),
            SignInOutcome::MfaChallenge(_) => None,
        }
    }

    pub fn mfa(&self) -> Option<&MfaChallenge> {
        match self {
            SignInOutcome::SessionIssued(_) => None,
            SignInOutcome::MfaChallenge(challenge) => Some(challenge),
        }
    }
}

/// Serialized as `{"session": …, "mfa": null}` or
/// `{"session": null, "mfa": {"ticket": …}}`.
impl Serialize for SignInOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            session: Option<&'a Session>,
            mfa: Option<&'a MfaChallenge>,
        }

        Body {
            session: self.session(),
            mfa: self.mfa(),
        }
        .serialize(serializer)
    }
}

/// Authentication service.
///
/// Generic over repository and issuer implementations so that the auth
/// layer has no dependency on the database crate.
pub struct AuthService<U, R, I> {
    user_repo: U,
    token_repo: R,
    sessions: SessionAssembler<U, R, I>,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl<U, R, I> AuthService<U, R, I>
where
    U: UserRepository + Clone + 'static,
    R: RefreshTokenRepository + Clone,
    I: AccessTokenIssuer,
{
    pub fn new(user_repo: U, token_repo: R, issuer: I, config: AuthConfig) -> Self {
        let sessions = SessionAssembler::new(
            user_repo.clone(),
            token_repo.clone(),
            issuer,
            config.clone(),
        );
        Self {
            user_repo,
            token_repo,
            sessions,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source for this service and its assembler.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.sessions = self.sessions.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    /// The session assembler, for callers that already hold a user and
    /// only need a session (e.g. a refresh endpoint).
    pub fn sessions(&self) -> &SessionAssembler<U, R, I> {
        &self.sessions
    }

    /// Sign a user in: issue an MFA challenge if one is required,
    /// otherwise a new session.
    pub async fn sign_in(&self, input: SignInInput) -> Result<SignInOutcome, AuthError> {
        let user = self.load_user(input.user_id).await?;

        if input.check_mfa && user.active_mfa_type == Some(MfaType::Totp) {
            let challenge = self.issue_challenge(&user, MfaType::Totp).await?;
            return Ok(SignInOutcome::MfaChallenge(challenge));
        }

        let session = self
            .sessions
            .get_new_or_update_current_session(&user, None)
            .await?;

        info!(user_id = %user.id, "Session issued");
        Ok(SignInOutcome::SessionIssued(session))
    }

    /// Extend the session behind `raw_refresh_token` and issue a new
    /// access token. The refresh token string stays the same.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<Session, AuthError> {
        let stored = self
            .token_repo
            .get_by_token(raw_refresh_token)
            .await
            .map_err(|e| match e {
                SesameError::NotFound { .. } => AuthError::RefreshTokenInvalid,
                other => other.into(),
            })?;

        if stored.is_expired_at(self.clock.now()) {
            if let Err(e) = self.token_repo.delete(raw_refresh_token).await {
                warn!(user_id = %stored.user_id, error = %e, "Failed to delete expired refresh token");
            }
            return Err(AuthError::RefreshTokenExpired);
        }

        let user = self.load_user(stored.user_id).await?;
        if user.disabled {
            return Err(AuthError::UserDisabled { user_id: user.id });
        }

        self.sessions
            .get_new_or_update_current_session(&user, Some(raw_refresh_token))
            .await
    }

    /// Revoke a single refresh token.
    pub async fn sign_out(&self, raw_refresh_token: &str) -> Result<(), AuthError> {
        self.token_repo.delete(raw_refresh_token).await?;
        Ok(())
    }

    /// Revoke every refresh token of a user.
    pub async fn sign_out_all(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.token_repo.delete_for_user(user_id).await?;
        info!(user_id = %user_id, "All refresh tokens revoked");
        Ok(())
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.user_repo
            .get_by_id(user_id)
            .await
            .map_err(|e| match e {
                SesameError::NotFound { .. } => AuthError::UserNotFound { user_id },
                other => other.into(),
            })
    }

    /// Store a fresh ticket on the user, replacing any earlier one.
    async fn issue_challenge(
        &self,
        user: &User,
        mfa_type: MfaType,
    ) -> Result<MfaChallenge, AuthError> {
        let ticket = Ticket::issue(mfa_type, self.clock.as_ref(), self.config.mfa_ticket_expires_in)?;

        self.user_repo
            .update(
                user.id,
                UpdateUser {
                    ticket: Some(Some(ticket.value.clone())),
                    ticket_expires_at: Some(Some(ticket.expires_at)),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            user_id = %user.id,
            mfa_type = %mfa_type,
            expires_at = %ticket.expires_at,
            "MFA challenge issued"
        );
        Ok(MfaChallenge::from(&ticket))
    }
}
