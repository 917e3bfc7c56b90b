//! OnAir backend library.
//!
//! This module exposes the application builder for use in tests.

use axum::http::HeaderValue;
use axum::http::{header, Method};
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::time::Duration, Expiry, MemoryStore, SessionManagerLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod openapi;
pub mod paths;
pub mod state;
pub mod storage;
pub mod stream;
pub mod version;

use state::AppState;

/// Create the Axum application router with a given state, auth configuration, and CORS origins.
///
/// If `cors_allowed_origins` is empty, any origin is allowed.
/// Otherwise, only the specified origins are allowed.
pub fn create_app_with_config(
    state: AppState,
    auth_config: auth::AuthConfig,
    cors_allowed_origins: Vec<String>,
) -> Router {
    let auth_config = Arc::new(auth_config);

    if auth_config.enabled {
        tracing::info!("Authentication enabled");
        if auth_config.has_session_auth() {
            tracing::info!("  - Session authentication configured");
        }
        if auth_config.has_api_key_auth() {
            tracing::info!("  - API key authentication configured");
        }
    } else {
        tracing::warn!("Authentication disabled - endpoint administration is public!");
    }

    // Create session store (in-memory, sessions lost on restart)
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)))
        .with_secure(false);

    // Media server webhooks; publishers authenticate with endpoint credentials
    let stream_router = Router::new()
        .route("/publish", post(api::hooks::publish))
        .route("/unpublish", post(api::hooks::unpublish))
        .route("/auth", post(api::hooks::legacy_auth));

    let protected_api_router = Router::new()
        .route(
            "/endpoints",
            get(api::endpoints::list_endpoints).post(api::endpoints::create_endpoint),
        )
        .route(
            "/endpoints/{id}",
            get(api::endpoints::get_endpoint)
                .put(api::endpoints::update_endpoint)
                .delete(api::endpoints::delete_endpoint),
        )
        .route(
            "/endpoints/{id}/reset",
            post(api::endpoints::reset_endpoint),
        )
        .route("/version", get(api::version::get_version))
        .layer(middleware::from_fn(auth::auth_middleware));

    let public_api_router = Router::new()
        .route("/login", post(auth::login_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/auth/status", get(auth::auth_status_handler));

    let api_router = Router::new()
        .merge(public_api_router)
        .merge(protected_api_router)
        .layer(Extension(auth_config.clone()));

    // Swagger UI behind authentication
    let swagger_router = Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(middleware::from_fn(auth::auth_middleware))
        .layer(Extension(auth_config));

    Router::new()
        .route("/health", get(health))
        .merge(swagger_router)
        .nest("/stream", stream_router)
        .nest("/api", api_router)
        .layer(session_layer)
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::COOKIE,
                ]);

            if cors_allowed_origins.is_empty() {
                cors.allow_origin(Any)
            } else {
                let origins: Vec<HeaderValue> = cors_allowed_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins).allow_credentials(true)
            }
        })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}
