use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use crate::api::PublicUser;
use crate::app::AppState;
use crate::auth::cookies::{self, REFRESH_COOKIE};
use crate::auth::{password, tokens, TokenKind, TokenPair};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::store::UserStore;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterPayload>, ApiError>,
) -> Result<Response, ApiError> {
    let errors = validation::validate_registration(
        payload.name.as_deref(),
        payload.email.as_deref(),
        payload.password.as_deref(),
    );
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    // validated non-empty above
    let name = payload.name.as_deref().unwrap_or_default().trim();
    let email = validation::normalize_email(payload.email.as_deref().unwrap_or_default());
    let raw_password = payload.password.as_deref().unwrap_or_default();

    let users = UserStore::new(&state.db);
    if users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("User already exists with this email"));
    }

    let hash = password::hash_password(raw_password)?;
    let user = users.create(name, &email, &hash).await?;
    let pair = start_session(&users, &user).await?;

    tracing::info!(user_id = %user.id, "user registered");
    let jar = cookies::set_token_cookies(jar, &pair);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "user": PublicUser::summary(&user),
        })),
    )
        .into_response())
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginPayload>, ApiError>,
) -> Result<Response, ApiError> {
    let errors = validation::validate_login(payload.email.as_deref(), payload.password.as_deref());
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let email = validation::normalize_email(payload.email.as_deref().unwrap_or_default());
    let raw_password = payload.password.as_deref().unwrap_or_default();

    let users = UserStore::new(&state.db);
    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !password::verify_password(raw_password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let pair = start_session(&users, &user).await?;

    tracing::info!(user_id = %user.id, "user logged in");
    let jar = cookies::set_token_cookies(jar, &pair);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Login successful",
            "user": PublicUser::summary(&user),
        })),
    )
        .into_response())
}

/// POST /api/auth/logout (authenticated)
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    UserStore::new(&state.db)
        .set_refresh_token(user.id, None)
        .await?;

    let jar = cookies::clear_token_cookies(jar);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Logout successful",
        })),
    )
        .into_response())
}

/// GET /api/auth/me (authenticated)
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "user": PublicUser::detailed(&user),
    }))
}

/// POST /api/auth/refresh
///
/// Any failure after the cookie is found clears both cookies so a stale
/// session cannot loop on a dead refresh token.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    let Some(cookie) = jar.get(REFRESH_COOKIE) else {
        return Err(ApiError::unauthorized(
            "Access denied. No refresh token provided.",
        ));
    };
    let presented = cookie.value().to_string();

    match rotate_session(&state, &presented).await {
        Ok((user, pair)) => {
            let jar = cookies::set_token_cookies(jar, &pair);
            Ok((
                jar,
                Json(json!({
                    "success": true,
                    "message": "Tokens refreshed successfully",
                    "user": PublicUser::summary(&user),
                })),
            )
                .into_response())
        }
        Err(err) => {
            tracing::debug!("refresh rejected: {}", err);
            let jar = cookies::clear_token_cookies(jar);
            Ok((
                StatusCode::UNAUTHORIZED,
                jar,
                Json(json!({
                    "success": false,
                    "message": "Invalid refresh token",
                })),
            )
                .into_response())
        }
    }
}

/// Issue a fresh token pair and persist the refresh half
async fn start_session(users: &UserStore<'_>, user: &User) -> Result<TokenPair, ApiError> {
    let pair = tokens::issue_pair(user.id)?;
    users.set_refresh_token(user.id, Some(&pair.refresh)).await?;
    Ok(pair)
}

/// Verify a presented refresh token against the stored one, then rotate
async fn rotate_session(state: &AppState, presented: &str) -> Result<(User, TokenPair), ApiError> {
    let claims = tokens::verify(presented, TokenKind::Refresh)?;

    let users = UserStore::new(&state.db);
    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token. User not found."))?;

    // single-session policy: only the most recently issued refresh token
    // is accepted
    if user.refresh_token.as_deref() != Some(presented) {
        return Err(ApiError::unauthorized("Invalid refresh token"));
    }

    let pair = start_session(&users, &user).await?;
    Ok((user, pair))
}
