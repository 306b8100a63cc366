use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Declared token kind, embedded in the claims so an access token can never
/// be replayed as a refresh token or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn ttl(&self) -> Duration {
        let auth = &config::config().auth;
        match self {
            TokenKind::Access => Duration::minutes(auth.access_ttl_minutes),
            TokenKind::Refresh => Duration::days(auth.refresh_ttl_days),
        }
    }

    fn secret(&self) -> &'static str {
        let auth = &config::config().auth;
        match self {
            TokenKind::Access => &auth.access_secret,
            TokenKind::Refresh => &auth.refresh_secret,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, kind: TokenKind) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            token_type: kind,
            iat: now.timestamp(),
            exp: (now + kind.ttl()).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    Generation(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Wrong token type: expected {expected}, got {actual}")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Signed access+refresh pair issued on login, registration, and refresh
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn issue_pair(user_id: Uuid) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access: issue(user_id, TokenKind::Access)?,
        refresh: issue(user_id, TokenKind::Refresh)?,
    })
}

pub fn issue(user_id: Uuid, kind: TokenKind) -> Result<String, TokenError> {
    let secret = kind.secret();
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let claims = Claims::new(user_id, kind);
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

/// Verify signature, expiry, and declared type. An expired token maps to
/// `TokenError::Expired` so the API can return a TOKEN_EXPIRED code; a type
/// mismatch is reported as `WrongType` and treated as invalid upstream.
pub fn verify(token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
    let secret = kind.secret();
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    if data.claims.token_type != kind {
        return Err(TokenError::WrongType {
            expected: kind.as_str(),
            actual: data.claims.token_type.as_str(),
        });
    }

    Ok(data.claims)
}
