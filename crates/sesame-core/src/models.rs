//! Domain models for Sesame.
//!
//! Users are owned by the persistence layer; the session core only
//! reads them and requests partial updates. Refresh tokens are the
//! durable handle of a session.

pub mod refresh_token;
pub mod user;
