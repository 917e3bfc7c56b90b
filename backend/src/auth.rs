//! Admin authentication for the management API.
//!
//! Webhook routes under `/stream` are never behind this; the media server
//! authenticates publishers through endpoint credentials instead.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;
use utoipa::ToSchema;

const SESSION_USER_KEY: &str = "admin_authenticated";

/// Authentication configuration loaded from environment variables
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Admin username (from ONAIR_ADMIN_USER env var)
    pub admin_user: Option<String>,
    /// Admin password bcrypt hash (from ONAIR_ADMIN_PASSWORD_HASH env var)
    pub admin_password_hash: Option<String>,
    /// API key for bearer token auth (from ONAIR_API_KEY env var)
    pub api_key: Option<String>,
    /// Whether authentication is enabled
    pub enabled: bool,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("ONAIR_ADMIN_USER").ok(),
            std::env::var("ONAIR_ADMIN_PASSWORD_HASH").ok(),
            std::env::var("ONAIR_API_KEY").ok(),
        )
    }

    /// Authentication is enabled if any method is configured.
    pub fn new(
        admin_user: Option<String>,
        admin_password_hash: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        let enabled = admin_user.is_some() || api_key.is_some();
        Self {
            admin_user,
            admin_password_hash,
            api_key,
            enabled,
        }
    }

    /// No authentication; every admin route is public.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn has_session_auth(&self) -> bool {
        self.admin_user.is_some() && self.admin_password_hash.is_some()
    }

    pub fn has_api_key_auth(&self) -> bool {
        self.api_key.is_some()
    }

    /// Verify username and password against configured credentials
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        match (&self.admin_user, &self.admin_password_hash) {
            (Some(user), Some(hash)) if user == username => {
                bcrypt::verify(password, hash).unwrap_or(false)
            }
            _ => false,
        }
    }

    pub fn verify_api_key(&self, key: &str) -> bool {
        self.api_key.as_deref().is_some_and(|k| k == key)
    }
}

/// Login request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

/// Authentication status response
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub auth_required: bool,
    pub methods: Vec<String>,
}

/// Accept a logged-in session or a `Bearer` API key.
pub async fn auth_middleware(
    Extension(config): Extension<Arc<AuthConfig>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !config.enabled {
        return Ok(next.run(request).await);
    }

    if let Ok(Some(true)) = session.get::<bool>(SESSION_USER_KEY).await {
        return Ok(next.run(request).await);
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if bearer.is_some_and(|token| config.verify_api_key(token)) {
        return Ok(next.run(request).await);
    }

    Err(StatusCode::UNAUTHORIZED)
}

/// Login handler
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login attempt result", body = LoginResponse)
    )
)]
pub async fn login_handler(
    Extension(config): Extension<Arc<AuthConfig>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, StatusCode> {
    if !config.has_session_auth() {
        return Ok(Json(LoginResponse {
            success: false,
            message: "Session authentication not configured".to_string(),
        }));
    }

    if config.verify_credentials(&payload.username, &payload.password) {
        session
            .insert(SESSION_USER_KEY, true)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        tracing::info!(user = %payload.username, "Admin logged in");

        Ok(Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
        }))
    } else {
        tracing::warn!(user = %payload.username, "Failed admin login");
        Ok(Json(LoginResponse {
            success: false,
            message: "Invalid username or password".to_string(),
        }))
    }
}

/// Logout handler
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session cleared", body = LoginResponse)
    )
)]
pub async fn logout_handler(session: Session) -> Result<Json<LoginResponse>, StatusCode> {
    session
        .delete()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}

/// Get authentication status
#[utoipa::path(
    get,
    path = "/api/auth/status",
    tag = "auth",
    responses(
        (status = 200, description = "Current authentication state", body = AuthStatusResponse)
    )
)]
pub async fn auth_status_handler(
    Extension(config): Extension<Arc<AuthConfig>>,
    session: Session,
) -> Json<AuthStatusResponse> {
    let authenticated = !config.enabled
        || session
            .get::<bool>(SESSION_USER_KEY)
            .await
            .ok()
            .flatten()
            .unwrap_or(false);

    let mut methods = Vec::new();
    if config.has_session_auth() {
        methods.push("session".to_string());
    }
    if config.has_api_key_auth() {
        methods.push("api_key".to_string());
    }

    Json(AuthStatusResponse {
        authenticated,
        auth_required: config.enabled,
        methods,
    })
}

/// Generate a value for ONAIR_ADMIN_PASSWORD_HASH.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(bcrypt::verify(password, &hash).unwrap());
        assert!(!bcrypt::verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_auth_config_disabled() {
        let config = AuthConfig::disabled();

        assert!(!config.has_session_auth());
        assert!(!config.has_api_key_auth());
        assert!(!config.enabled);
        assert!(!config.verify_api_key(""));
    }

    #[test]
    fn test_verify_credentials() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        let config = AuthConfig::new(Some("admin".to_string()), Some(hash), None);

        assert!(config.enabled);
        assert!(config.verify_credentials("admin", "hunter2"));
        assert!(!config.verify_credentials("admin", "wrong"));
        assert!(!config.verify_credentials("someone", "hunter2"));
    }

    #[test]
    fn test_verify_api_key() {
        let config = AuthConfig::new(None, None, Some("k3y".to_string()));

        assert!(config.enabled);
        assert!(!config.has_session_auth());
        assert!(config.verify_api_key("k3y"));
        assert!(!config.verify_api_key("other"));
    }
}
