//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations must be cheap
//! to clone so handles can be moved into detached tasks.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::SesameResult;
use crate::models::{
    refresh_token::{CreateRefreshToken, RefreshToken},
    user::{CreateUser, SessionUser, UpdateUser, User},
};

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = SesameResult<User>> + Send;
    /// Fails with [`SesameError::NotFound`](crate::error::SesameError::NotFound)
    /// when no user has this id.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SesameResult<User>> + Send;
    /// Apply a partial update. Fields left as `None` are not written.
    fn update(&self, id: Uuid, input: UpdateUser)
    -> impl Future<Output = SesameResult<User>> + Send;
    /// Load the projection embedded in session responses.
    fn get_session_user(&self, id: Uuid) -> impl Future<Output = SesameResult<SessionUser>> + Send;
}

pub trait RefreshTokenRepository: Send + Sync {
    fn create(
        &self,
        input: CreateRefreshToken,
    ) -> impl Future<Output = SesameResult<RefreshToken>> + Send;
    fn get_by_token(&self, token: &str) -> impl Future<Output = SesameResult<RefreshToken>> + Send;
    /// Move the expiry of a token that is still live at `now`. Fails with
    /// `NotFound` if the token is unknown or expired at `now`, so a stale
    /// token is never revived. `now` comes from the caller's clock; the
    /// store's own clock is not consulted.
    fn update_expires_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = SesameResult<RefreshToken>> + Send;
    fn delete(&self, token: &str) -> impl Future<Output = SesameResult<()>> + Send;
    /// Revoke every refresh token belonging to a user.
    fn delete_for_user(&self, user_id: Uuid) -> impl Future<Output = SesameResult<()>> + Send;
    /// Remove tokens that expired before `now`. Returns how many were
    /// removed.
    fn delete_expired(&self, now: DateTime<Utc>) -> impl Future<Output = SesameResult<u64>> + Send;
}
