use crate::config::AuthConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the session cookie
pub const COOKIE_NAME: &str = "token";

/// Session token payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    pub id: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("session expired")]
    Expired,
    #[error("invalid session token")]
    Invalid,
    #[error("failed to sign session token: {0}")]
    Signing(String),
}

impl Claims {
    pub fn new(id: &str, username: &str, is_admin: bool, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            username: username.to_string(),
            id: id.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + Duration::hours(ttl_hours)).timestamp(),
        }
    }
}

pub fn issue(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Check signature and expiry
pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    Ok(data.claims)
}

/// Sign a session for the given user using the configured secret and lifetime
pub fn issue_for(auth: &AuthConfig, id: &str, username: &str, is_admin: bool) -> Result<String, TokenError> {
    let claims = Claims::new(id, username, is_admin, auth.token_ttl_hours);
    issue(&claims, &auth.token_secret)
}
