//! Access token issuance/verification and opaque refresh token
//! generation.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sesame_core::models::user::User;
use uuid::Uuid;

use crate::clock::offset_after;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Mints signed, time-bounded access credentials.
pub trait AccessTokenIssuer: Send + Sync {
    fn create_access_token(&self, user: &User) -> Result<String, AuthError>;
}

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject, the user ID (UUID string).
    pub sub: String,
    pub default_role: String,
    pub allowed_roles: Vec<String>,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// EdDSA (Ed25519) JWT issuer.
///
/// Keys are parsed once at construction.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetime_secs: u64,
}

impl JwtIssuer {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_private_key_pem.as_bytes())
            .map_err(|e| AuthError::Issuer(format!("bad private key: {e}")))?;
        let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
            .map_err(|e| AuthError::Issuer(format!("bad public key: {e}")))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            issuer: config.jwt_issuer.clone(),
            lifetime_secs: config.access_token_expires_in,
        })
    }

    /// Decode and verify an access token (signature, expiry, issuer).
    pub fn decode_access_token(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }

    /// Validate an access token and return the verified claims.
    ///
    /// Purely stateless; no store lookup is performed.
    pub fn validate_access_token(&self, token: &str) -> Result<ValidatedClaims, AuthError> {
        self.decode_access_token(token).map(ValidatedClaims)
    }
}

impl AccessTokenIssuer for JwtIssuer {
    fn create_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = offset_after(now, self.lifetime_secs)?;
        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            default_role: user.default_role.clone(),
            allowed_roles: user.allowed_roles.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::EdDSA);
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AuthError::Issuer(format!("JWT encode: {e}")))
    }
}

/// Validated JWT claims; holding one proves the token was verified.
#[derive(Debug, Clone)]
pub struct ValidatedClaims(pub AccessTokenClaims);

/// Generate a new opaque refresh token (random UUID v4 text).
pub fn generate_refresh_token() -> String {
    Uuid::new_v4().to_string()
}
