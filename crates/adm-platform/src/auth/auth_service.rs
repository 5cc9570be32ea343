//! Authentication Service
//!
//! JWT access token generation and validation (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::error::{AdmissionsError, Result};

/// JWT Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (account id)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Configuration for the auth service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens
    pub secret_key: String,

    /// Token issuer
    pub issuer: String,

    /// Access token expiration in seconds
    pub token_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            issuer: "admissions-platform".to_string(),
            token_expiry_secs: 86400 * 30, // 30 days
        }
    }
}

/// Authentication service for token management
pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        info!("AuthService initialized with HS256");

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate an access token bound to an account id
    pub fn generate_token(&self, account_id: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_expiry_secs);

        let claims = AccessTokenClaims {
            sub: account_id.to_string(),
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key).map_err(|e| AdmissionsError::Internal {
            message: format!("Failed to encode JWT: {}", e),
        })
    }

    /// Validate an access token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AdmissionsError::TokenExpired,
                _ => AdmissionsError::InvalidToken,
            })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    if auth_header.starts_with("Bearer ") {
        Some(&auth_header[7..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig {
            secret_key: "test-secret".to_string(),
            ..AuthConfig::default()
        })
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = test_service();

        let token = service.generate_token("0HZXEQ5Y8JY5Z").unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "0HZXEQ5Y8JY5Z");
        assert_eq!(claims.iss, "admissions-platform");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = test_service();
        let other = AuthService::new(AuthConfig {
            secret_key: "different-secret".to_string(),
            ..AuthConfig::default()
        });

        let token = other.generate_token("0HZXEQ5Y8JY5Z").unwrap();
        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, AdmissionsError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = AuthService::new(AuthConfig {
            secret_key: "test-secret".to_string(),
            // Past the validator's default 60s leeway
            token_expiry_secs: -300,
            ..AuthConfig::default()
        });

        let token = service.generate_token("0HZXEQ5Y8JY5Z").unwrap();
        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, AdmissionsError::TokenExpired));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
