//! Endpoint administration handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use onair_types::{
    api::{EndpointListQuery, EndpointListResponse, EndpointResponse, ErrorResponse},
    EndpointId, NewStreamEndpoint, UpdateStreamEndpoint,
};
use tracing::info;

use crate::state::AppState;
use crate::storage::{EndpointQuery, StorageError};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Endpoint not found")),
    )
}

fn storage_error(context: &str, e: StorageError) -> ApiError {
    match e {
        StorageError::NotFound => not_found(),
        e => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_details(context, e.to_string())),
        ),
    }
}

fn invalid(details: impl Into<String>) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse::with_details("Invalid endpoint", details)),
    )
}

/// Field validation plus the start-before-end rule garde cannot express.
fn check(report: Result<(), garde::Report>, ordered_window: bool) -> Result<(), ApiError> {
    report.map_err(|e| invalid(e.to_string()))?;
    if !ordered_window {
        return Err(invalid("start_valid must not be after end_valid"));
    }
    Ok(())
}

/// List endpoints.
#[utoipa::path(
    get,
    path = "/api/endpoints",
    tag = "endpoints",
    params(EndpointListQuery),
    responses(
        (status = 200, description = "Endpoints ordered by ID", body = EndpointListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_endpoints(
    State(state): State<AppState>,
    Query(filter): Query<EndpointListQuery>,
) -> Result<Json<EndpointListResponse>, ApiError> {
    let endpoints = state
        .storage()
        .list(&filter)
        .await
        .map_err(|e| storage_error("Failed to list endpoints", e))?;
    Ok(Json(EndpointListResponse { endpoints }))
}

/// Get a specific endpoint by ID.
#[utoipa::path(
    get,
    path = "/api/endpoints/{id}",
    tag = "endpoints",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    responses(
        (status = 200, description = "Endpoint found", body = EndpointResponse),
        (status = 404, description = "Endpoint not found", body = ErrorResponse)
    )
)]
pub async fn get_endpoint(
    State(state): State<AppState>,
    Path(id): Path<EndpointId>,
) -> Result<Json<EndpointResponse>, ApiError> {
    let endpoint = state
        .storage()
        .find(&EndpointQuery::by_id(id))
        .await
        .map_err(|e| storage_error("Failed to load endpoint", e))?;
    Ok(Json(EndpointResponse { endpoint }))
}

/// Create a new endpoint. New endpoints start inactive.
#[utoipa::path(
    post,
    path = "/api/endpoints",
    tag = "endpoints",
    request_body = NewStreamEndpoint,
    responses(
        (status = 201, description = "Endpoint created", body = EndpointResponse),
        (status = 422, description = "Invalid endpoint", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_endpoint(
    State(state): State<AppState>,
    Json(req): Json<NewStreamEndpoint>,
) -> Result<(StatusCode, Json<EndpointResponse>), ApiError> {
    check(req.validate(), req.has_ordered_window())?;

    let endpoint = state
        .storage()
        .create(req)
        .await
        .map_err(|e| storage_error("Failed to save endpoint", e))?;

    info!(
        endpoint_id = endpoint.endpoint_id,
        application = %endpoint.application,
        name = %endpoint.name,
        "Created endpoint"
    );
    Ok((StatusCode::CREATED, Json(EndpointResponse { endpoint })))
}

/// Replace the editable fields of an endpoint.
#[utoipa::path(
    put,
    path = "/api/endpoints/{id}",
    tag = "endpoints",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    request_body = UpdateStreamEndpoint,
    responses(
        (status = 200, description = "Endpoint updated", body = EndpointResponse),
        (status = 404, description = "Endpoint not found", body = ErrorResponse),
        (status = 422, description = "Invalid endpoint", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_endpoint(
    State(state): State<AppState>,
    Path(id): Path<EndpointId>,
    Json(req): Json<UpdateStreamEndpoint>,
) -> Result<Json<EndpointResponse>, ApiError> {
    check(req.validate(), req.has_ordered_window())?;

    let storage = state.storage();
    let mut endpoint = storage
        .find(&EndpointQuery::by_id(id))
        .await
        .map_err(|e| storage_error("Failed to load endpoint", e))?;
    endpoint.apply(req);
    storage
        .update(&endpoint)
        .await
        .map_err(|e| storage_error("Failed to save endpoint", e))?;

    info!(endpoint_id = id, "Updated endpoint");
    Ok(Json(EndpointResponse { endpoint }))
}

/// Delete an endpoint permanently.
#[utoipa::path(
    delete,
    path = "/api/endpoints/{id}",
    tag = "endpoints",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    responses(
        (status = 204, description = "Endpoint deleted"),
        (status = 404, description = "Endpoint not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_endpoint(
    State(state): State<AppState>,
    Path(id): Path<EndpointId>,
) -> Result<StatusCode, ApiError> {
    state
        .storage()
        .delete(id)
        .await
        .map_err(|e| storage_error("Failed to delete endpoint", e))?;
    info!(endpoint_id = id, "Deleted endpoint");
    Ok(StatusCode::NO_CONTENT)
}

/// Clear a stuck `active` flag, e.g. after the media server missed an
/// unpublish callback.
#[utoipa::path(
    post,
    path = "/api/endpoints/{id}/reset",
    tag = "endpoints",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    responses(
        (status = 200, description = "Endpoint marked inactive", body = EndpointResponse),
        (status = 404, description = "Endpoint not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn reset_endpoint(
    State(state): State<AppState>,
    Path(id): Path<EndpointId>,
) -> Result<Json<EndpointResponse>, ApiError> {
    let endpoint = state
        .storage()
        .deactivate(id)
        .await
        .map_err(|e| storage_error("Failed to reset endpoint", e))?;
    info!(endpoint_id = id, "Reset endpoint to inactive");
    Ok(Json(EndpointResponse { endpoint }))
}
