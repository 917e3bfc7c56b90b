//! Media server webhook handlers.
//!
//! Responses are plain text: the media server only looks at the status code
//! and expects the body `0` on success.

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::state::AppState;
use crate::stream::{
    self,
    wire::{HookError, HookRequest, SrsHook},
    PublishDecision,
};

/// Body the media server expects on success.
pub const HOOK_OK: &str = "0";

fn ok() -> Response {
    (StatusCode::OK, HOOK_OK).into_response()
}

fn deny(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, reason.to_string()).into_response()
}

/// Authorize a stream publish.
///
/// Accepts a form-encoded nginx-rtmp/srtrelay callback (`app`, `name`, `pwd`,
/// `call`) or an SRS JSON callback. Any failure denies the stream.
#[utoipa::path(
    post,
    path = "/stream/publish",
    tag = "stream",
    request_body(
        content = SrsHook,
        content_type = "application/json",
        description = "SRS callback; form-encoded FormHook bodies are also accepted"
    ),
    responses(
        (status = 200, description = "Publish authorized, body is `0`", body = String),
        (status = 401, description = "Publish refused", body = String)
    )
)]
pub async fn publish(
    State(state): State<AppState>,
    request: Result<HookRequest, HookError>,
) -> Response {
    let hook = match request.and_then(HookRequest::into_publish) {
        Ok(Some(hook)) => hook,
        Ok(None) => {
            debug!("Ignoring non-publish call on publish hook");
            return ok();
        }
        Err(e) => {
            warn!(error = %e, "Rejecting malformed publish callback");
            return deny(&e.to_string());
        }
    };

    let policy = state.activation_policy(Utc::now());
    match stream::publish(state.storage(), &hook, &policy).await {
        PublishDecision::Authorized(_) => ok(),
        PublishDecision::Denied(reason) => deny(reason.public_message()),
    }
}

/// Record that a stream stopped.
///
/// Always acknowledged so the media server never retries a teardown.
#[utoipa::path(
    post,
    path = "/stream/unpublish",
    tag = "stream",
    request_body(
        content = SrsHook,
        content_type = "application/json",
        description = "SRS callback; form-encoded FormHook bodies are also accepted"
    ),
    responses(
        (status = 200, description = "Acknowledged, body is `0`", body = String)
    )
)]
pub async fn unpublish(
    State(state): State<AppState>,
    request: Result<HookRequest, HookError>,
) -> Response {
    match request.and_then(HookRequest::into_unpublish) {
        Ok(Some(hook)) => {
            stream::unpublish(state.storage(), &hook).await;
        }
        Ok(None) => debug!("Ignoring non-unpublish call on unpublish hook"),
        Err(e) => warn!(error = %e, "Unrecognized unpublish callback acknowledged"),
    }
    ok()
}

/// Legacy stream-key form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LegacyAuthForm {
    pub name: Option<String>,
}

/// Static stream-key gate for integrations that predate endpoint records.
#[utoipa::path(
    post,
    path = "/stream/auth",
    tag = "stream",
    request_body(content = LegacyAuthForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Key accepted"),
        (status = 404, description = "Key not recognized")
    )
)]
pub async fn legacy_auth(
    State(state): State<AppState>,
    form: Result<Form<LegacyAuthForm>, FormRejection>,
) -> StatusCode {
    let provided = match form {
        Ok(Form(form)) => form.name.unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "Malformed legacy auth form");
            String::new()
        }
    };

    if stream::authorize(&provided, &state.stream_config().legacy_keys) {
        StatusCode::CREATED
    } else {
        StatusCode::NOT_FOUND
    }
}
