use axum::{extract::State, Json};
use serde_json::json;

use crate::app::AppState;
use crate::database;
use crate::error::ApiError;

/// GET /health — liveness plus a database ping
pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    database::health_check(&state.db).await.map_err(|err| {
        tracing::error!("health check failed: {}", err);
        ApiError::service_unavailable("Database unavailable")
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
    })))
}
