//! SurrealDB implementation of [`RefreshTokenRepository`].

use chrono::{DateTime, Utc};
use sesame_core::error::SesameResult;
use sesame_core::models::refresh_token::{CreateRefreshToken, RefreshToken};
use sesame_core::repository::RefreshTokenRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RefreshTokenRow {
    user_id: String,
    token: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn try_into_refresh_token(self) -> Result<RefreshToken, DbError> {
        Ok(RefreshToken {
            user_id: parse_uuid(&self.user_id, "user")?,
            token: self.token,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

fn not_found() -> DbError {
    // The token itself is a credential and stays out of error messages.
    DbError::NotFound {
        entity: "refresh_token".into(),
        id: "<redacted>".into(),
    }
}

/// SurrealDB implementation of the RefreshToken repository.
#[derive(Clone)]
pub struct SurrealRefreshTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRefreshTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RefreshTokenRepository for SurrealRefreshTokenRepository<C> {
    async fn create(&self, input: CreateRefreshToken) -> SesameResult<RefreshToken> {
        let result = self
            .db
            .query(
                "CREATE refresh_token SET \
                 user_id = $user_id, \
                 token = $refresh_token, \
                 expires_at = $expires_at",
            )
            .bind(("user_id", input.user_id.to_string()))
            .bind(("refresh_token", input.token))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(not_found)?;

        Ok(row.try_into_refresh_token()?)
    }

    async fn get_by_token(&self, token: &str) -> SesameResult<RefreshToken> {
        let mut result = self
            .db
            .query("SELECT * FROM refresh_token WHERE token = $refresh_token")
            .bind(("refresh_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(not_found)?;

        Ok(row.try_into_refresh_token()?)
    }

    async fn update_expires_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> SesameResult<RefreshToken> {
        // Conditional on the token still being live at the caller's `now`:
        // an expired or revoked token matches no row and is never extended.
        let result = self
            .db
            .query(
                "UPDATE refresh_token SET expires_at = $expires_at \
                 WHERE token = $refresh_token AND expires_at > $now",
            )
            .bind(("refresh_token", token.to_string()))
            .bind(("now", now))
            .bind(("expires_at", expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(not_found)?;

        Ok(row.try_into_refresh_token()?)
    }

    async fn delete(&self, token: &str) -> SesameResult<()> {
        self.db
            .query("DELETE refresh_token WHERE token = $refresh_token")
            .bind(("refresh_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> SesameResult<()> {
        self.db
            .query("DELETE refresh_token WHERE user_id = $user_id")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> SesameResult<u64> {
        let result = self
            .db
            .query("DELETE refresh_token WHERE expires_at <= $now RETURN BEFORE")
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let removed: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        let total = removed.len() as u64;

        debug!(removed = total, "Expired refresh tokens removed");
        Ok(total)
    }
}
