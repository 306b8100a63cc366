use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config;
use crate::handlers::{auth, health, leads};
use crate::middleware::require_auth;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

pub fn build_router(state: AppState) -> Router {
    let auth_public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let auth_protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let lead_routes = Router::new()
        .route("/", post(leads::create).get(leads::list))
        .route("/stats", get(leads::stats))
        .route(
            "/:id",
            get(leads::get).put(leads::update).delete(leads::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/auth", auth_public.merge(auth_protected))
        .nest("/api/leads", lead_routes)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browser clients send the session cookies cross-origin, so credentials
/// must be allowed and origins listed explicitly.
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
