//! Publish authorization and the endpoint activation state machine.
//!
//! An endpoint is either idle or live. A publish callback moves it from idle
//! to live when the credentials match and the endpoint is not blocked; an
//! unpublish callback moves it back. Publish fails closed, unpublish fails
//! open.

pub mod wire;

use crate::storage::{ActivationPolicy, EndpointQuery, EndpointStore, StorageError};
use onair_types::EndpointId;
use tracing::{error, info, warn};
use wire::StreamHook;

/// Why a publish was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No endpoint matches the credentials.
    UnknownEndpoint,
    /// The endpoint already has a live session.
    AlreadyActive,
    Blocked,
    OutsideValidityWindow,
    /// The store could not answer; ambiguity resolves to denial.
    StoreFailure,
}

impl DenyReason {
    /// Text sent back to the media server. Store failures and unknown
    /// credentials share one message.
    pub fn public_message(self) -> &'static str {
        match self {
            DenyReason::UnknownEndpoint | DenyReason::StoreFailure => "unauthorized",
            DenyReason::AlreadyActive => "stream already active",
            DenyReason::Blocked => "endpoint blocked",
            DenyReason::OutsideValidityWindow => "endpoint not valid at this time",
        }
    }
}

/// Result of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDecision {
    Authorized(EndpointId),
    Denied(DenyReason),
}

/// Result of an unpublish notification. Every variant is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpublishOutcome {
    Deactivated,
    NotFound,
    Failed,
}

/// Authorize a publish and mark the endpoint live.
///
/// The lookup only picks the record and the refusal reason. The transition
/// itself is the store's conditional activation, so of several concurrent
/// publishes for one endpoint at most one is authorized.
pub async fn publish(
    store: &dyn EndpointStore,
    hook: &StreamHook,
    policy: &ActivationPolicy,
) -> PublishDecision {
    let query = EndpointQuery::by_credentials(
        hook.application.as_str(),
        hook.name.as_str(),
        hook.password.clone(),
    );

    let endpoint = match store.find(&query).await {
        Ok(endpoint) => endpoint,
        Err(StorageError::NotFound) => {
            info!(
                application = %hook.application,
                name = %hook.name,
                "Publish denied: no matching endpoint"
            );
            return PublishDecision::Denied(DenyReason::UnknownEndpoint);
        }
        Err(e) => {
            warn!(
                application = %hook.application,
                name = %hook.name,
                error = %e,
                "Publish denied: endpoint lookup failed"
            );
            return PublishDecision::Denied(DenyReason::StoreFailure);
        }
    };

    if !policy.permits(&endpoint) {
        let reason = if endpoint.blocked {
            DenyReason::Blocked
        } else if endpoint.active {
            DenyReason::AlreadyActive
        } else {
            DenyReason::OutsideValidityWindow
        };
        info!(
            endpoint_id = endpoint.endpoint_id,
            application = %endpoint.application,
            name = %endpoint.name,
            ?reason,
            "Publish denied"
        );
        return PublishDecision::Denied(reason);
    }

    match store.activate(endpoint.endpoint_id, policy).await {
        Ok(()) => {
            info!(
                endpoint_id = endpoint.endpoint_id,
                application = %endpoint.application,
                name = %endpoint.name,
                "Stream published"
            );
            PublishDecision::Authorized(endpoint.endpoint_id)
        }
        Err(StorageError::NotActivatable(id)) => {
            info!(endpoint_id = id, "Publish denied: endpoint changed concurrently");
            PublishDecision::Denied(DenyReason::AlreadyActive)
        }
        Err(StorageError::NotFound) => {
            info!(
                endpoint_id = endpoint.endpoint_id,
                "Publish denied: endpoint removed concurrently"
            );
            PublishDecision::Denied(DenyReason::UnknownEndpoint)
        }
        Err(e) => {
            warn!(
                endpoint_id = endpoint.endpoint_id,
                error = %e,
                "Publish denied: activation failed"
            );
            PublishDecision::Denied(DenyReason::StoreFailure)
        }
    }
}

/// Mark the matching endpoint idle. Never fails; the outcome is only
/// informational.
pub async fn unpublish(store: &dyn EndpointStore, hook: &StreamHook) -> UnpublishOutcome {
    let result = store
        .set_inactive_by_match(&hook.application, &hook.name, hook.password.as_deref())
        .await;

    match result {
        Ok(()) => {
            info!(
                application = %hook.application,
                name = %hook.name,
                "Stream unpublished"
            );
            UnpublishOutcome::Deactivated
        }
        Err(StorageError::NotFound) => {
            info!(
                application = %hook.application,
                name = %hook.name,
                "Unpublish for unknown endpoint ignored"
            );
            UnpublishOutcome::NotFound
        }
        Err(e) => {
            error!(
                application = %hook.application,
                name = %hook.name,
                error = %e,
                "Failed to mark endpoint inactive"
            );
            UnpublishOutcome::Failed
        }
    }
}

/// Static stream-key check for the legacy auth integration.
pub fn authorize(provided: &str, allowed: &[String]) -> bool {
    !provided.is_empty() && allowed.iter().any(|key| key == provided)
}
