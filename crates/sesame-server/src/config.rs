//! Server configuration loaded from the environment.
//!
//! | Env Var                          | Required | Default          |
//! |----------------------------------|----------|------------------|
//! | `AUTH_ACCESS_TOKEN_EXPIRES_IN`   | no       | `900`            |
//! | `AUTH_REFRESH_TOKEN_EXPIRES_IN`  | no       | `2592000`        |
//! | `AUTH_MFA_TICKET_EXPIRES_IN`     | no       | `300`            |
//! | `AUTH_JWT_PRIVATE_KEY_PEM`       | **yes**  | --               |
//! | `AUTH_JWT_PUBLIC_KEY_PEM`        | **yes**  | --               |
//! | `AUTH_JWT_ISSUER`                | no       | `sesame`         |
//! | `SESAME_DB_URL`                  | no       | `127.0.0.1:8000` |
//! | `SESAME_DB_NAMESPACE`            | no       | `sesame`         |
//! | `SESAME_DB_DATABASE`             | no       | `main`           |
//! | `SESAME_DB_USERNAME`             | no       | `root`           |
//! | `SESAME_DB_PASSWORD`             | no       | `root`           |
//! | `SESAME_TOKEN_SWEEP_INTERVAL_SECS` | no     | `3600`           |

use std::str::FromStr;

use sesame_auth::{AuthConfig, MAX_EXPIRES_IN_SECS};
use sesame_db::DbConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub auth: AuthConfig,
    pub db: DbConfig,
    /// How often expired refresh tokens are swept, in seconds.
    pub token_sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Load from the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth_defaults = AuthConfig::default();
        let db_defaults = DbConfig::default();

        let auth = AuthConfig {
            access_token_expires_in: expires_in(
                &lookup,
                "AUTH_ACCESS_TOKEN_EXPIRES_IN",
                auth_defaults.access_token_expires_in,
            )?,
            refresh_token_expires_in: expires_in(
                &lookup,
                "AUTH_REFRESH_TOKEN_EXPIRES_IN",
                auth_defaults.refresh_token_expires_in,
            )?,
            mfa_ticket_expires_in: expires_in(
                &lookup,
                "AUTH_MFA_TICKET_EXPIRES_IN",
                auth_defaults.mfa_ticket_expires_in,
            )?,
            jwt_private_key_pem: required(&lookup, "AUTH_JWT_PRIVATE_KEY_PEM")?,
            jwt_public_key_pem: required(&lookup, "AUTH_JWT_PUBLIC_KEY_PEM")?,
            jwt_issuer: lookup("AUTH_JWT_ISSUER").unwrap_or(auth_defaults.jwt_issuer),
        };

        let db = DbConfig {
            url: lookup("SESAME_DB_URL").unwrap_or(db_defaults.url),
            namespace: lookup("SESAME_DB_NAMESPACE").unwrap_or(db_defaults.namespace),
            database: lookup("SESAME_DB_DATABASE").unwrap_or(db_defaults.database),
            username: lookup("SESAME_DB_USERNAME").unwrap_or(db_defaults.username),
            password: lookup("SESAME_DB_PASSWORD").unwrap_or(db_defaults.password),
        };

        let token_sweep_interval_secs: u64 = parse_or(&lookup, "SESAME_TOKEN_SWEEP_INTERVAL_SECS", 3600)?;
        if token_sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SESAME_TOKEN_SWEEP_INTERVAL_SECS",
                value: "0".into(),
                reason: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            auth,
            db,
            token_sweep_interval_secs,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

/// A lifetime in seconds, bounded so expiry arithmetic cannot overflow.
fn expires_in<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, key, default)?;
    if secs > MAX_EXPIRES_IN_SECS {
        return Err(ConfigError::Invalid {
            key,
            value: secs.to_string(),
            reason: format!("must be at most {MAX_EXPIRES_IN_SECS} seconds"),
        });
    }
    Ok(secs)
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const KEYS: [(&str, &str); 2] = [
        ("AUTH_JWT_PRIVATE_KEY_PEM", "private"),
        ("AUTH_JWT_PUBLIC_KEY_PEM", "public"),
    ];

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&KEYS)).unwrap();
        assert_eq!(config.auth.access_token_expires_in, 900);
        assert_eq!(config.auth.refresh_token_expires_in, 2_592_000);
        assert_eq!(config.auth.mfa_ticket_expires_in, 300);
        assert_eq!(config.auth.jwt_issuer, "sesame");
        assert_eq!(config.db.namespace, "sesame");
        assert_eq!(config.token_sweep_interval_secs, 3600);
    }

    #[test]
    fn durations_are_read_from_the_environment() {
        let mut vars = KEYS.to_vec();
        vars.push(("AUTH_ACCESS_TOKEN_EXPIRES_IN", "60"));
        vars.push(("AUTH_REFRESH_TOKEN_EXPIRES_IN", " 86400 "));

        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.auth.access_token_expires_in, 60);
        assert_eq!(config.auth.refresh_token_expires_in, 86_400);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut vars = KEYS.to_vec();
        vars.push(("AUTH_REFRESH_TOKEN_EXPIRES_IN", "-5"));

        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "AUTH_REFRESH_TOKEN_EXPIRES_IN",
                ..
            }
        ));
    }

    #[test]
    fn oversized_duration_is_rejected() {
        let mut vars = KEYS.to_vec();
        vars.push(("AUTH_REFRESH_TOKEN_EXPIRES_IN", "18446744073709551615"));

        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "AUTH_REFRESH_TOKEN_EXPIRES_IN",
                ..
            }
        ));
    }

    #[test]
    fn duration_bound_is_inclusive() {
        let max = MAX_EXPIRES_IN_SECS.to_string();
        let over = (MAX_EXPIRES_IN_SECS + 1).to_string();

        let mut vars = KEYS.to_vec();
        vars.push(("AUTH_ACCESS_TOKEN_EXPIRES_IN", max.as_str()));
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.auth.access_token_expires_in, MAX_EXPIRES_IN_SECS);

        let mut vars = KEYS.to_vec();
        vars.push(("AUTH_MFA_TICKET_EXPIRES_IN", over.as_str()));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid {
                key: "AUTH_MFA_TICKET_EXPIRES_IN",
                ..
            })
        ));
    }

    #[test]
    fn signing_keys_are_required() {
        let err = ServerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_JWT_PRIVATE_KEY_PEM")));
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let mut vars = KEYS.to_vec();
        vars.push(("SESAME_TOKEN_SWEEP_INTERVAL_SECS", "0"));
        assert!(ServerConfig::from_lookup(lookup(&vars)).is_err());
    }
}
