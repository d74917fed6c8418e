//! Authentication configuration.

/// Upper bound accepted for any configured lifetime: ten years.
pub const MAX_EXPIRES_IN_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration for session issuance.
///
/// Built once at startup and injected into the services; nothing in
/// this crate reads the environment.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_expires_in: u64,
    /// Refresh token lifetime in seconds (default: 2_592_000 = 30 days).
    pub refresh_token_expires_in: u64,
    /// MFA challenge ticket lifetime in seconds (default: 300 = 5 minutes).
    pub mfa_ticket_expires_in: u64,
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_expires_in: 900,
            refresh_token_expires_in: 2_592_000,
            mfa_ticket_expires_in: 300,
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            jwt_issuer: "sesame".into(),
        }
    }
}
