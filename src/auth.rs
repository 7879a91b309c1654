// ABOUTME: JWT access token issuance/validation and opaque refresh token generation
// ABOUTME: AuthManager is the single authority for bearer credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Authentication
//!
//! Access tokens are short-lived HS256 JWTs carrying the user id, email, and
//! admin flag. Refresh tokens are opaque random values stored server-side
//! and rotated on every use.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::User;

/// Issuer claim stamped into every access token
const TOKEN_ISSUER: &str = "cadence-api";
/// Random bytes backing a refresh token
const REFRESH_TOKEN_BYTES: usize = 32;

/// Claims embedded in an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    /// User email
    pub email: String,
    /// Whether the user is an admin
    pub admin: bool,
    /// Issuer
    pub iss: String,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// The authenticated identity attached to a request
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// Authenticated user id
    pub user_id: Uuid,
    /// User email from the token
    pub email: String,
    /// Whether the token grants admin rights
    pub is_admin: bool,
}

/// Access/refresh token pair returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived JWT
    pub access_token: String,
    /// Opaque rotating refresh token
    pub refresh_token: String,
    /// Access token expiry, RFC 3339
    pub expires_at: String,
}

/// Issues and validates bearer credentials
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: i64,
}

impl AuthManager {
    /// Create a manager from the shared HS256 secret
    #[must_use]
    pub fn new(secret: &str, access_token_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
        }
    }

    /// Generate a signed access token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn generate_access_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expires = now + Duration::minutes(self.access_token_minutes);
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            admin: user.is_admin,
            iss: TOKEN_ISSUER.to_owned(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))
    }

    /// Validate a raw JWT and return the authenticated identity
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` for expired tokens and `AuthInvalid` for
    /// anything else that fails validation.
    pub fn validate_token(&self, token: &str) -> AppResult<AuthResult> {
        let mut validation = Validation::default();
        validation.set_issuer(&[TOKEN_ISSUER]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            if matches!(
                e.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            ) {
                AppError::auth_expired("Access token has expired")
            } else {
                AppError::auth_invalid(format!("Invalid access token: {e}"))
            }
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::auth_invalid("Token subject is not a valid user id"))?;

        Ok(AuthResult {
            user_id,
            email: data.claims.email,
            is_admin: data.claims.admin,
        })
    }

    /// Validate a `Bearer <token>` authorization header value
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` when the header is malformed or the token fails
    /// validation.
    pub fn authenticate_header(&self, header: Option<&str>) -> AppResult<AuthResult> {
        let header = header.ok_or_else(|| AppError::auth_invalid("Missing authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Authorization header must use Bearer scheme"))?;
        self.validate_token(token.trim())
    }

    /// When a token minted now would expire, RFC 3339
    #[must_use]
    pub fn access_token_expiry(&self) -> String {
        (Utc::now() + Duration::minutes(self.access_token_minutes)).to_rfc3339()
    }

    /// Generate an opaque refresh token (256 bits, URL-safe base64)
    #[must_use]
    pub fn generate_refresh_token() -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn test_user() -> User {
        User::new(
            "streaker@example.com".to_owned(),
            "hash".to_owned(),
            Some("Streaker".to_owned()),
        )
    }

    #[test]
    fn access_token_round_trips() {
        let manager = AuthManager::new("unit-test-secret", 30);
        let user = test_user();
        let token = manager.generate_access_token(&user).unwrap();

        let auth = manager.validate_token(&token).unwrap();
        assert_eq!(auth.user_id, user.id);
        assert_eq!(auth.email, user.email);
        assert!(!auth.is_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let manager = AuthManager::new("secret-a", 30);
        let other = AuthManager::new("secret-b", 30);
        let token = manager.generate_access_token(&test_user()).unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        let manager = AuthManager::new("unit-test-secret", 30);
        let token = manager.generate_access_token(&test_user()).unwrap();

        assert!(manager
            .authenticate_header(Some(&format!("Bearer {token}")))
            .is_ok());
        assert!(manager.authenticate_header(Some(&token)).is_err());
        assert!(manager.authenticate_header(None).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique() {
        let a = AuthManager::generate_refresh_token();
        let b = AuthManager::generate_refresh_token();
        assert_ne!(a, b);
        assert!(a.len() >= 40);
    }
}
