//! OpenAPI documentation configuration.

use crate::api::hooks::LegacyAuthForm;
use crate::auth::{AuthStatusResponse, LoginRequest, LoginResponse};
use crate::stream::wire::{FormHook, SrsHook};
use crate::version::VersionInfo;
use onair_types::api::{EndpointListResponse, EndpointResponse, ErrorResponse};
use onair_types::{NewStreamEndpoint, StreamEndpoint, UpdateStreamEndpoint};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::hooks::publish,
        crate::api::hooks::unpublish,
        crate::api::hooks::legacy_auth,
        crate::api::endpoints::list_endpoints,
        crate::api::endpoints::get_endpoint,
        crate::api::endpoints::create_endpoint,
        crate::api::endpoints::update_endpoint,
        crate::api::endpoints::delete_endpoint,
        crate::api::endpoints::reset_endpoint,
        crate::auth::login_handler,
        crate::auth::logout_handler,
        crate::auth::auth_status_handler,
        crate::api::version::get_version,
    ),
    components(
        schemas(
            StreamEndpoint,
            NewStreamEndpoint,
            UpdateStreamEndpoint,
            EndpointResponse,
            EndpointListResponse,
            ErrorResponse,
            FormHook,
            SrsHook,
            LegacyAuthForm,
            LoginRequest,
            LoginResponse,
            AuthStatusResponse,
            VersionInfo,
        )
    ),
    tags(
        (name = "stream", description = "Media server webhooks"),
        (name = "endpoints", description = "Stream endpoint administration"),
        (name = "auth", description = "Admin authentication"),
        (name = "System", description = "System information endpoints")
    ),
    info(
        title = "OnAir Stream Endpoint API",
        version = "0.3.0",
        description = "Publish authorization webhooks and endpoint management for the society media server",
        license(
            name = "MIT OR Apache-2.0"
        )
    )
)]
pub struct ApiDoc;
