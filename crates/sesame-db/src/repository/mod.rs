//! SurrealDB repository implementations.

mod refresh_token;
mod user;

pub use refresh_token::SurrealRefreshTokenRepository;
pub use user::SurrealUserRepository;

use uuid::Uuid;

use crate::error::DbError;

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}
