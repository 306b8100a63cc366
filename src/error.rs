// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation { message: String, errors: Vec<String> },

    // 401 Unauthorized
    Unauthorized(String),
    /// Expired access token; carries a machine-readable code so clients
    /// know to attempt a refresh instead of a full re-login.
    TokenExpired(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Validation { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::TokenExpired(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Validation { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::TokenExpired(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body (standard `{success: false, ...}` envelope)
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation { message, errors } => json!({
                "success": false,
                "message": message,
                "errors": errors,
            }),
            ApiError::TokenExpired(message) => json!({
                "success": false,
                "message": message,
                "code": "TOKEN_EXPIRED",
            }),
            _ => json!({
                "success": false,
                "message": self.message(),
            }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(errors: Vec<String>) -> Self {
        ApiError::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn token_expired(message: impl Into<String>) -> Self {
        ApiError::TokenExpired(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                // Unique violation; the only unique constraints are user email
                // and (owner_id, email) on leads
                ApiError::conflict("A record with this email already exists")
            }
            sqlx::Error::PoolTimedOut => {
                tracing::error!("Database pool timed out");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            _ => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", err);
                ApiError::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<crate::auth::tokens::TokenError> for ApiError {
    fn from(err: crate::auth::tokens::TokenError) -> Self {
        use crate::auth::tokens::TokenError;
        match err {
            TokenError::Expired => {
                ApiError::token_expired("Access token expired. Please refresh your token.")
            }
            TokenError::MissingSecret => {
                tracing::error!("JWT secret not configured");
                ApiError::internal_server_error("Internal server error")
            }
            TokenError::Generation(msg) => {
                tracing::error!("JWT generation error: {}", msg);
                ApiError::internal_server_error("Internal server error")
            }
            TokenError::Invalid(_) | TokenError::WrongType { .. } => {
                ApiError::unauthorized("Invalid access token.")
            }
        }
    }
}

impl From<crate::auth::password::PasswordError> for ApiError {
    fn from(err: crate::auth::password::PasswordError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        ApiError::internal_server_error("Internal server error")
    }
}

// Malformed request bodies get the same envelope as every other error
impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::bad_request(err.body_text())
    }
}

impl From<crate::filter::FilterError> for ApiError {
    fn from(err: crate::filter::FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
