//! Authentication primitives: JWT bearer tokens and password hashing
//!
//! # Architecture
//!
//! - Bearer tokens are HS256 JWTs with the account guid as subject and a
//!   24-hour expiry.
//! - The signing secret is resolved from the `MIRROR_JWT_SECRET` environment
//!   variable, falling back to the `jwt_secret` row of the settings table.
//!   On first run a random secret is generated and persisted there.
//! - Passwords are hashed with Argon2id in PHC string format.
//!
//! This module contains only pure functions and database operations. No HTTP
//! framework dependencies - those live in service-specific code.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{Error, Result};

/// Token lifetime: 24 hours
pub const TOKEN_TTL_HOURS: i64 = 24;

/// JWT claims carried by every bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account guid
    pub sub: String,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

/// Signing/verification key pair derived from the shared secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for the given account guid
    pub fn issue(&self, account_guid: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_guid.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Auth(format!("Failed to sign token: {}", e)))
    }

    /// Issue a token with an explicit expiry offset (used by tests to mint
    /// already-expired tokens)
    pub fn issue_with_ttl(&self, account_guid: &str, ttl_seconds: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_guid.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Auth(format!("Failed to sign token: {}", e)))
    }

    /// Validate a token and return its claims
    ///
    /// Checks signature and expiry. Any failure maps to `Error::Auth`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::Auth(format!("Invalid token: {}", e)))
    }
}

/// Load the JWT signing secret
///
/// Resolution order: `MIRROR_JWT_SECRET` environment variable, then the
/// `jwt_secret` settings row. A missing settings row is generated and
/// persisted so the secret survives restarts.
pub async fn load_jwt_secret(db: &SqlitePool) -> Result<String> {
    if let Ok(secret) = std::env::var("MIRROR_JWT_SECRET") {
        if !secret.trim().is_empty() {
            return Ok(secret);
        }
    }

    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'jwt_secret'")
            .fetch_optional(db)
            .await?;

    match result {
        Some((value,)) if !value.is_empty() => Ok(value),
        _ => initialize_jwt_secret(db).await,
    }
}

/// Generate a random secret and store it in the settings table
pub async fn initialize_jwt_secret(db: &SqlitePool) -> Result<String> {
    use rand::Rng;

    let bytes: [u8; 32] = rand::thread_rng().gen();
    let secret: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();

    sqlx::query(
        "INSERT INTO settings (key, value) VALUES ('jwt_secret', ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(&secret)
    .execute(db)
    .await?;

    tracing::info!("Generated new JWT signing secret");
    Ok(secret)
}

/// Hash a password with Argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored PHC hash string
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Check password strength policy
///
/// At least 8 characters with one uppercase, one lowercase, one digit, and
/// one character outside those three classes.
pub fn password_meets_policy(password: &str) -> bool {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    password.chars().count() >= 8 && has_upper && has_lower && has_digit && has_special
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = JwtKeys::new(b"test-secret");
        let token = keys.issue("acct-1234").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "acct-1234");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_rejected() {
        let keys = JwtKeys::new(b"test-secret");
        let token = keys.issue_with_ttl("acct-1234", -120).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let keys = JwtKeys::new(b"test-secret");
        let other = JwtKeys::new(b"other-secret");
        let token = keys.issue("acct-1234").unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        let keys = JwtKeys::new(b"test-secret");
        assert!(keys.verify("not.a.token").is_err());
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("Password123!").unwrap();
        assert_ne!(hash, "Password123!");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Password123!", &hash));
        assert!(!verify_password("WrongPassword1!", &hash));
    }

    #[test]
    fn verify_tolerates_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn password_policy() {
        assert!(password_meets_policy("Password123!"));
        assert!(!password_meets_policy("Sh0rt!7"));
        assert!(!password_meets_policy("alllowercase1!"));
        assert!(!password_meets_policy("ALLUPPERCASE1!"));
        assert!(!password_meets_policy("NoDigits!!"));
        assert!(!password_meets_policy("NoSpecial123"));
    }
}
