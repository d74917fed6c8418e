//! MFA challenge tickets.
//!
//! A ticket is issued in place of a session when the user has a second
//! factor that must be verified first. Verifying the factor happens
//! elsewhere; this module only mints the handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sesame_core::models::user::MfaType;
use uuid::Uuid;

use crate::clock::{Clock, compute_expiry};
use crate::error::AuthError;

/// A namespaced challenge handle, e.g. `mfaTotp:3f1c…`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Ticket {
    /// Mint a fresh ticket for `mfa_type` valid for `lifetime_secs`.
    pub fn issue(
        mfa_type: MfaType,
        clock: &dyn Clock,
        lifetime_secs: u64,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            value: format!("{}:{}", mfa_type.ticket_prefix(), Uuid::new_v4()),
            expires_at: compute_expiry(clock, lifetime_secs)?,
        })
    }
}

/// Payload returned to the caller when a challenge is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MfaChallenge {
    pub ticket: String,
}

impl From<&Ticket> for MfaChallenge {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket: ticket.value.clone(),
        }
    }
}
