// src/auth.rs

//! Session tokens.
//!
//! Tokens are JWTs whose `sub` is the user id. They carry no role or
//! organization claims: those are looked up again for every request.

use std::fs;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::config::JwtConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read key file {0}: {1}")]
    KeyReadFailed(String, std::io::Error),
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

// === Claims ===

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// A freshly issued token and its lifetime in seconds.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

// === Issuer ===

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// HS256 issuer over a shared secret.
    pub fn hmac(secret: &[u8], ttl: Duration) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// RS256 issuer over a PEM key pair.
    pub fn rsa(private_key_pem: &[u8], public_key_pem: &[u8], ttl: Duration) -> Result<Self, AuthError> {
        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding: EncodingKey::from_rsa_pem(private_key_pem)
                .map_err(|e| AuthError::InvalidKeyFormat(e.to_string()))?,
            decoding: DecodingKey::from_rsa_pem(public_key_pem)
                .map_err(|e| AuthError::InvalidKeyFormat(e.to_string()))?,
            ttl,
        })
    }

    /// Build the issuer described by the `security.jwt` section.
    ///
    /// Without a secret or key pair a random secret is generated, so tokens
    /// do not survive a restart.
    pub fn from_config(config: &JwtConfig) -> Result<Self, AuthError> {
        match config.algorithm.to_ascii_uppercase().as_str() {
            "HS256" => match &config.secret_key {
                Some(secret) if !secret.is_empty() => Ok(Self::hmac(secret.as_bytes(), config.token_expiry)),
                _ => {
                    warn!("No JWT secret configured, generating an ephemeral one");
                    let mut secret = [0u8; 32];
                    rand::thread_rng().fill_bytes(&mut secret);
                    Ok(Self::hmac(&secret, config.token_expiry))
                }
            },
            "RS256" => {
                let (Some(private_path), Some(public_path)) = (&config.private_key_path, &config.public_key_path) else {
                    return Err(AuthError::InvalidKeyFormat(
                        "RS256 needs private_key_path and public_key_path".to_string(),
                    ));
                };
                let private_pem = fs::read(private_path).map_err(|e| AuthError::KeyReadFailed(private_path.clone(), e))?;
                let public_pem = fs::read(public_path).map_err(|e| AuthError::KeyReadFailed(public_path.clone(), e))?;
                Self::rsa(&private_pem, &public_pem, config.token_expiry)
            }
            other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken, AuthError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.ttl.as_secs() as usize,
            iat: now,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(IssuedToken {
            token,
            expires_in: self.ttl.as_secs(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}
