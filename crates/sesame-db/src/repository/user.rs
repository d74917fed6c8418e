//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use sesame_core::error::SesameResult;
use sesame_core::models::user::{CreateUser, MfaType, SessionUser, UpdateUser, User};
use sesame_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserRow {
    email: Option<String>,
    display_name: String,
    avatar_url: String,
    locale: String,
    default_role: String,
    allowed_roles: Vec<String>,
    disabled: bool,
    last_seen: Option<DateTime<Utc>>,
    active_mfa_type: Option<String>,
    ticket: Option<String>,
    ticket_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Columns needed for the session projection only.
#[derive(Debug, SurrealValue)]
struct SessionUserRow {
    email: Option<String>,
    display_name: String,
    avatar_url: String,
    locale: String,
    default_role: String,
    allowed_roles: Vec<String>,
    active_mfa_type: Option<String>,
}

fn parse_mfa_type(raw: Option<String>) -> Result<Option<MfaType>, DbError> {
    raw.map(|s| s.parse::<MfaType>())
        .transpose()
        .map_err(|e| DbError::Decode(e.to_string()))
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            locale: self.locale,
            default_role: self.default_role,
            allowed_roles: self.allowed_roles,
            disabled: self.disabled,
            last_seen: self.last_seen,
            active_mfa_type: parse_mfa_type(self.active_mfa_type)?,
            ticket: self.ticket,
            ticket_expires_at: self.ticket_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SessionUserRow {
    fn into_session_user(self, id: Uuid) -> Result<SessionUser, DbError> {
        Ok(SessionUser {
            id,
            display_name: self.display_name,
            email: self.email,
            avatar_url: self.avatar_url,
            locale: self.locale,
            default_role: self.default_role,
            roles: self.allowed_roles,
            active_mfa_type: parse_mfa_type(self.active_mfa_type)?,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Look a user up by a ticket previously issued to them.
    pub async fn get_by_ticket(&self, ticket: &str) -> SesameResult<User> {
        #[derive(Debug, SurrealValue)]
        struct IdRow {
            record_id: String,
        }

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id FROM user WHERE ticket = $ticket")
            .bind(("ticket", ticket.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: "ticket=<redacted>".into(),
        })?;

        self.get_by_id(parse_uuid(&row.record_id, "user")?).await
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> SesameResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, \
                 display_name = $display_name, \
                 avatar_url = $avatar_url, \
                 locale = $locale, \
                 default_role = $default_role, \
                 allowed_roles = $allowed_roles, \
                 active_mfa_type = $active_mfa_type",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("display_name", input.display_name))
            .bind(("avatar_url", input.avatar_url.unwrap_or_default()))
            .bind(("locale", input.locale.unwrap_or_else(|| "en".into())))
            .bind((
                "default_role",
                input.default_role.unwrap_or_else(|| "user".into()),
            ))
            .bind((
                "allowed_roles",
                input
                    .allowed_roles
                    .unwrap_or_else(|| vec!["user".into(), "me".into()]),
            ))
            .bind((
                "active_mfa_type",
                input.active_mfa_type.map(|t| t.as_str().to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> SesameResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> SesameResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.disabled.is_some() {
            sets.push("disabled = $disabled");
        }
        if input.last_seen.is_some() {
            sets.push("last_seen = $last_seen");
        }
        if input.active_mfa_type.is_some() {
            sets.push("active_mfa_type = $active_mfa_type");
        }
        if input.ticket.is_some() {
            sets.push("ticket = $ticket");
        }
        if input.ticket_expires_at.is_some() {
            sets.push("ticket_expires_at = $ticket_expires_at");
        }
        sets.push("updated_at = time::now()");

        // UPDATE on a record id never creates it; a missing user yields
        // no rows.
        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(disabled) = input.disabled {
            builder = builder.bind(("disabled", disabled));
        }
        if let Some(last_seen) = input.last_seen {
            builder = builder.bind(("last_seen", last_seen));
        }
        if let Some(active_mfa_type) = input.active_mfa_type {
            // Some(None) clears the factor.
            builder = builder.bind((
                "active_mfa_type",
                active_mfa_type.map(|t| t.as_str().to_string()),
            ));
        }
        if let Some(ticket) = input.ticket {
            builder = builder.bind(("ticket", ticket));
        }
        if let Some(ticket_expires_at) = input.ticket_expires_at {
            builder = builder.bind(("ticket_expires_at", ticket_expires_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_session_user(&self, id: Uuid) -> SesameResult<SessionUser> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT email, display_name, avatar_url, locale, \
                 default_role, allowed_roles, active_mfa_type \
                 FROM type::record('user', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_session_user(id)?)
    }
}
