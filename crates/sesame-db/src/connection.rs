//! SurrealDB connection management.

use std::fmt;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::repository::SurrealRefreshTokenRepository;
use crate::schema::run_migrations;

/// Where the user and refresh-token tables live.
#[derive(Clone)]
pub struct DbConfig {
    /// WebSocket endpoint, `host:port` (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// Namespace holding the Sesame database.
    pub namespace: String,
    /// Database holding the `user` and `refresh_token` tables.
    pub database: String,
    /// Root username used to sign in before selecting the database.
    pub username: String,
    /// Root password. Never logged; `Debug` prints it redacted.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "sesame".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A signed-in, migrated session store.
///
/// Cloning is cheap; every clone shares the underlying client, so
/// repositories handed out here can be moved into background tasks.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect, sign in as root and select the configured namespace and
    /// database. The schema is left untouched; see [`DbManager::open`].
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to session store"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Ok(Self { db })
    }

    /// Connect and bring the schema up to date.
    pub async fn open(config: &DbConfig) -> Result<Self, DbError> {
        let manager = Self::connect(config).await?;
        run_migrations(&manager.db).await?;
        info!("Session store ready");
        Ok(manager)
    }

    pub fn refresh_tokens(&self) -> SurrealRefreshTokenRepository<Client> {
        SurrealRefreshTokenRepository::new(self.db.clone())
    }
}
