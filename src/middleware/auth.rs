use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::app::AppState;
use crate::auth::cookies::ACCESS_COOKIE;
use crate::auth::{tokens, TokenKind};
use crate::database::models::User;
use crate::error::ApiError;
use crate::store::UserStore;

/// Authenticated user attached to the request by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Verify the access-token cookie and load the user it names. Expired
/// tokens surface the TOKEN_EXPIRED code so clients know to refresh.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::unauthorized("Access denied. No access token provided."))?;

    let claims = tokens::verify(&token, TokenKind::Access)?;

    let user = UserStore::new(&state.db)
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid access token. User not found."))?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
