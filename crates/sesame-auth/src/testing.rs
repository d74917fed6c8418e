//! In-memory repositories and a fake issuer for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use sesame_core::error::{SesameError, SesameResult};
use sesame_core::models::refresh_token::{CreateRefreshToken, RefreshToken};
use sesame_core::models::user::{CreateUser, MfaType, SessionUser, UpdateUser, User};
use sesame_core::repository::{RefreshTokenRepository, UserRepository};
use uuid::Uuid;

use crate::error::AuthError;
use crate::token::AccessTokenIssuer;

/// Let detached tasks spawned on the current-thread test runtime run.
pub(crate) async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

pub(crate) fn user_fixture(mfa: Option<MfaType>, now: DateTime<Utc>) -> User {
    User {
        id: Uuid::new_v4(),
        email: Some("alice@example.com".into()),
        display_name: "Alice".into(),
        avatar_url: String::new(),
        locale: "en".into(),
        default_role: "user".into(),
        allowed_roles: vec!["user".into(), "me".into()],
        disabled: false,
        last_seen: None,
        active_mfa_type: mfa,
        ticket: None,
        ticket_expires_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn seed_user(users: &MemoryUsers, mfa: Option<MfaType>) -> User {
    let user = user_fixture(mfa, Utc::now());
    users.insert(user.clone());
    user
}

#[derive(Default)]
struct UsersState {
    users: HashMap<Uuid, User>,
    updates: Vec<(Uuid, UpdateUser)>,
    fail_updates: bool,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryUsers {
    state: Arc<Mutex<UsersState>>,
}

impl MemoryUsers {
    pub(crate) fn insert(&self, user: User) {
        self.state.lock().unwrap().users.insert(user.id, user);
    }

    pub(crate) fn get(&self, id: Uuid) -> Option<User> {
        self.state.lock().unwrap().users.get(&id).cloned()
    }

    pub(crate) fn updates(&self) -> Vec<(Uuid, UpdateUser)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub(crate) fn fail_updates(&self) {
        self.state.lock().unwrap().fail_updates = true;
    }
}

impl UserRepository for MemoryUsers {
    async fn create(&self, input: CreateUser) -> SesameResult<User> {
        let mut user = user_fixture(input.active_mfa_type, Utc::now());
        user.email = input.email;
        user.display_name = input.display_name;
        self.insert(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> SesameResult<User> {
        self.get(id).ok_or_else(|| SesameError::not_found("user", id))
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> SesameResult<User> {
        let mut state = self.state.lock().unwrap();
        state.updates.push((id, input.clone()));
        if state.fail_updates {
            return Err(SesameError::Database("user update failed".into()));
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| SesameError::not_found("user", id))?;
        if let Some(last_seen) = input.last_seen {
            user.last_seen = Some(last_seen);
        }
        if let Some(ticket) = input.ticket {
            user.ticket = ticket;
        }
        if let Some(ticket_expires_at) = input.ticket_expires_at {
            user.ticket_expires_at = ticket_expires_at;
        }
        if let Some(disabled) = input.disabled {
            user.disabled = disabled;
        }
        Ok(user.clone())
    }

    async fn get_session_user(&self, id: Uuid) -> SesameResult<SessionUser> {
        self.get(id)
            .map(|user| SessionUser::from(&user))
            .ok_or_else(|| SesameError::not_found("user", id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenCall {
    Create(CreateRefreshTokenCall),
    UpdateExpiresAt(String, DateTime<Utc>),
    Delete(String),
    DeleteForUser(Uuid),
}

/// Comparable copy of a [`CreateRefreshToken`] input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CreateRefreshTokenCall {
    pub(crate) user_id: Uuid,
    pub(crate) token: String,
    pub(crate) expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct TokensState {
    tokens: HashMap<String, RefreshToken>,
    calls: Vec<TokenCall>,
    fail_writes: bool,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryRefreshTokens {
    state: Arc<Mutex<TokensState>>,
}

impl MemoryRefreshTokens {
    pub(crate) fn seed(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) {
        self.state.lock().unwrap().tokens.insert(
            token.to_string(),
            RefreshToken {
                token: token.to_string(),
                user_id,
                expires_at,
                created_at: Utc::now(),
            },
        );
    }

    pub(crate) fn get(&self, token: &str) -> Option<RefreshToken> {
        self.state.lock().unwrap().tokens.get(token).cloned()
    }

    pub(crate) fn calls(&self) -> Vec<TokenCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }
}

impl RefreshTokenRepository for MemoryRefreshTokens {
    async fn create(&self, input: CreateRefreshToken) -> SesameResult<RefreshToken> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TokenCall::Create(CreateRefreshTokenCall {
            user_id: input.user_id,
            token: input.token.clone(),
            expires_at: input.expires_at,
        }));
        if state.fail_writes {
            return Err(SesameError::Database("refresh token insert failed".into()));
        }

        let token = RefreshToken {
            token: input.token,
            user_id: input.user_id,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        state.tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn get_by_token(&self, token: &str) -> SesameResult<RefreshToken> {
        self.get(token)
            .ok_or_else(|| SesameError::not_found("refresh_token", token))
    }

    async fn update_expires_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> SesameResult<RefreshToken> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(TokenCall::UpdateExpiresAt(token.to_string(), expires_at));
        if state.fail_writes {
            return Err(SesameError::Database("refresh token update failed".into()));
        }

        let stored = state
            .tokens
            .get_mut(token)
            .filter(|t| !t.is_expired_at(now))
            .ok_or_else(|| SesameError::not_found("refresh_token", token))?;
        stored.expires_at = expires_at;
        Ok(stored.clone())
    }

    async fn delete(&self, token: &str) -> SesameResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TokenCall::Delete(token.to_string()));
        state.tokens.remove(token);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> SesameResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TokenCall::DeleteForUser(user_id));
        state.tokens.retain(|_, t| t.user_id != user_id);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> SesameResult<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.tokens.len();
        state.tokens.retain(|_, t| !t.is_expired_at(now));
        Ok((before - state.tokens.len()) as u64)
    }
}

/// Issues `access-<user id>` or always fails.
#[derive(Clone, Default)]
pub(crate) struct FakeIssuer {
    fail: bool,
}

impl FakeIssuer {
    pub(crate) fn failing() -> Self {
        Self { fail: true }
    }
}

impl AccessTokenIssuer for FakeIssuer {
    fn create_access_token(&self, user: &User) -> Result<String, AuthError> {
        if self.fail {
            return Err(AuthError::Issuer("signing key unavailable".into()));
        }
        Ok(format!("access-{}", user.id))
    }
}
