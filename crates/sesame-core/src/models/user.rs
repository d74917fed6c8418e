//! User domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SesameError;

/// Second factor a user has activated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MfaType {
    /// Time-based one-time code from an authenticator app.
    Totp,
    Sms,
}

impl MfaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MfaType::Totp => "totp",
            MfaType::Sms => "sms",
        }
    }

    /// Namespace prepended to challenge tickets issued for this factor.
    pub fn ticket_prefix(&self) -> &'static str {
        match self {
            MfaType::Totp => "mfaTotp",
            MfaType::Sms => "mfaSms",
        }
    }
}

impl fmt::Display for MfaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MfaType {
    type Err = SesameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "totp" => Ok(MfaType::Totp),
            "sms" => Ok(MfaType::Sms),
            other => Err(SesameError::Validation {
                message: format!("unknown MFA type: {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: String,
    pub avatar_url: String,
    pub locale: String,
    pub default_role: String,
    pub allowed_roles: Vec<String>,
    pub disabled: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub active_mfa_type: Option<MfaType>,
    /// Latest MFA challenge ticket. Issuing a new one replaces it.
    pub ticket: Option<String>,
    pub ticket_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub locale: Option<String>,
    pub default_role: Option<String>,
    pub allowed_roles: Option<Vec<String>>,
    pub active_mfa_type: Option<MfaType>,
}

/// Partial user update. `None` leaves a field untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub disabled: Option<bool>,
    pub last_seen: Option<DateTime<Utc>>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub active_mfa_type: Option<Option<MfaType>>,
    pub ticket: Option<Option<String>>,
    pub ticket_expires_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Reduced view of a user embedded in session responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: String,
    pub locale: String,
    pub default_role: String,
    pub roles: Vec<String>,
    pub active_mfa_type: Option<MfaType>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            locale: user.locale.clone(),
            default_role: user.default_role.clone(),
            roles: user.allowed_roles.clone(),
            active_mfa_type: user.active_mfa_type,
        }
    }
}
