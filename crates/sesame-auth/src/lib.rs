//! Sesame Auth: session issuance and MFA challenge tickets.

pub mod clock;
pub mod config;
pub mod error;
pub mod mfa;
pub mod service;
pub mod session;
pub mod token;

#[cfg(test)]
mod testing;

pub use clock::{Clock, FixedClock, SystemClock, compute_expiry};
pub use config::{AuthConfig, MAX_EXPIRES_IN_SECS};
pub use error::AuthError;
pub use mfa::{MfaChallenge, Ticket};
pub use service::{AuthService, SignInInput, SignInOutcome};
pub use session::{Session, SessionAssembler};
pub use token::{AccessTokenClaims, AccessTokenIssuer, JwtIssuer};
