//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings; enums are
//! stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE option<string>;
DEFINE FIELD display_name ON TABLE user TYPE string;
DEFINE FIELD avatar_url ON TABLE user TYPE string DEFAULT '';
DEFINE FIELD locale ON TABLE user TYPE string DEFAULT 'en';
DEFINE FIELD default_role ON TABLE user TYPE string DEFAULT 'user';
DEFINE FIELD allowed_roles ON TABLE user TYPE array<string> DEFAULT [];
DEFINE FIELD disabled ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD last_seen ON TABLE user TYPE option<datetime>;
DEFINE FIELD active_mfa_type ON TABLE user TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['totp', 'sms'];
DEFINE FIELD ticket ON TABLE user TYPE option<string>;
DEFINE FIELD ticket_expires_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email;
DEFINE INDEX idx_user_ticket ON TABLE user COLUMNS ticket;

-- =======================================================================
-- Refresh tokens
-- =======================================================================
DEFINE TABLE refresh_token SCHEMAFULL;
DEFINE FIELD user_id ON TABLE refresh_token TYPE string;
DEFINE FIELD token ON TABLE refresh_token TYPE string;
DEFINE FIELD expires_at ON TABLE refresh_token TYPE datetime;
DEFINE FIELD created_at ON TABLE refresh_token TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_refresh_token_token ON TABLE refresh_token \
    COLUMNS token UNIQUE;
DEFINE INDEX idx_refresh_token_user ON TABLE refresh_token \
    COLUMNS user_id;
DEFINE INDEX idx_refresh_token_expiry ON TABLE refresh_token \
    COLUMNS expires_at;
";

/// Bring the session store schema up to date.
///
/// Versions already recorded in `_migration` are skipped, so running this
/// on every start is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let applied = latest_applied_version(db).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > applied);

    for migration in pending {
        apply(db, migration).await?;
    }

    Ok(())
}

async fn latest_applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map_or(0, |m| m.version))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    let failed = |stage: &str, e: surrealdb::Error| {
        DbError::Migration(format!(
            "v{} ({}) {stage}: {e}",
            migration.version, migration.name
        ))
    };

    db.query(migration.sql)
        .await?
        .check()
        .map_err(|e| failed("did not apply", e))?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| failed("was not recorded", e))?;

    info!(
        version = migration.version,
        name = migration.name,
        "Schema migration applied"
    );
    Ok(())
}
