use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::Pagination;
use crate::app::AppState;
use crate::error::ApiError;
use crate::filter::LeadFilter;
use crate::middleware::CurrentUser;
use crate::store::{LeadStore, ListOptions};
use crate::validation::{self, LeadInput};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    /// JSON object, see the filter module
    pub filters: Option<String>,
}

/// POST /api/leads
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(Json(payload), _): WithRejection<Json<LeadInput>, ApiError>,
) -> Result<Response, ApiError> {
    let new_lead = validation::validate_new_lead(&payload).map_err(ApiError::validation)?;

    let leads = LeadStore::new(&state.db);
    if leads.email_taken(user.id, &new_lead.email, None).await? {
        return Err(ApiError::conflict("Lead with this email already exists"));
    }

    let lead = leads.create(user.id, new_lead).await?;
    tracing::info!(lead_id = %lead.id, owner_id = %user.id, "lead created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Lead created successfully",
            "data": lead,
        })),
    )
        .into_response())
}

/// GET /api/leads
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = match query.filters.as_deref() {
        Some(raw) => LeadFilter::from_json(raw)?,
        None => LeadFilter::default(),
    };
    let opts = ListOptions::from_raw(
        query.page,
        query.limit,
        query.sort.as_deref(),
        query.order.as_deref(),
    );

    let page = LeadStore::new(&state.db).list(user.id, &filter, &opts).await?;
    let pagination = Pagination::from(&page);

    Ok(Json(json!({
        "success": true,
        "data": page.leads,
        "pagination": pagination,
    })))
}

/// GET /api/leads/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = LeadStore::new(&state.db).stats(user.id).await?;
    Ok(Json(json!({
        "success": true,
        "data": stats,
    })))
}

/// GET /api/leads/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_lead_id(&id)?;
    let lead = LeadStore::new(&state.db)
        .get(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found"))?;

    Ok(Json(json!({
        "success": true,
        "data": lead,
    })))
}

/// PUT /api/leads/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<LeadInput>, ApiError>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_lead_id(&id)?;
    let changes = validation::validate_lead_changes(&payload).map_err(ApiError::validation)?;

    let leads = LeadStore::new(&state.db);
    if let Some(email) = changes.email.as_deref() {
        if leads.email_taken(user.id, email, Some(id)).await? {
            return Err(ApiError::conflict("Lead with this email already exists"));
        }
    }

    let lead = leads
        .update(user.id, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Lead updated successfully",
        "data": lead,
    })))
}

/// DELETE /api/leads/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_lead_id(&id)?;
    let deleted = LeadStore::new(&state.db).delete(user.id, id).await?;
    if !deleted {
        return Err(ApiError::not_found("Lead not found"));
    }

    tracing::info!(lead_id = %id, owner_id = %user.id, "lead deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Lead deleted successfully",
    })))
}

/// A malformed id is a 400, not a 404
fn parse_lead_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid lead ID"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_is_bad_request() {
        let err = parse_lead_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid lead ID");
    }

    #[test]
    fn well_formed_id_parses() {
        assert!(parse_lead_id("7f1fd161-2c83-4a8a-9c2d-9f1b0c8d9e10").is_ok());
    }
}
