//! Version information API endpoint.

use axum::{extract::State, Json};

use crate::state::AppState;
use crate::version::VersionInfo;

/// Get version and build information
#[utoipa::path(
    get,
    path = "/api/version",
    tag = "System",
    responses(
        (status = 200, description = "Version information", body = VersionInfo)
    )
)]
pub async fn get_version(State(state): State<AppState>) -> Json<VersionInfo> {
    Json(VersionInfo::get(state.storage_backend()))
}
