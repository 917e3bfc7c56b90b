//! Storage layer for stream endpoint records.

mod json_storage;
mod postgres_storage;

pub use json_storage::JsonFileStorage;
pub use postgres_storage::PostgresStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use onair_types::api::EndpointListQuery;
use onair_types::{normalize_password, EndpointId, NewStreamEndpoint, StreamEndpoint};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Endpoint not found")]
    NotFound,

    #[error("Endpoint {0} is active, blocked or outside its validity window")]
    NotActivatable(EndpointId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Selects a single endpoint, either by ID or by its credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointQuery {
    pub endpoint_id: Option<EndpointId>,
    pub application: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

impl EndpointQuery {
    pub fn by_id(endpoint_id: EndpointId) -> Self {
        Self {
            endpoint_id: Some(endpoint_id),
            ..Default::default()
        }
    }

    pub fn by_credentials(
        application: impl Into<String>,
        name: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            endpoint_id: None,
            application: Some(application.into()),
            name: Some(name.into()),
            password: normalize_password(password),
        }
    }

    /// The credential triple, if this query is not an ID lookup and is fully specified.
    pub(crate) fn credentials(&self) -> Option<(&str, &str, Option<&str>)> {
        match (&self.application, &self.name) {
            (Some(application), Some(name)) => {
                Some((application.as_str(), name.as_str(), self.password.as_deref()))
            }
            _ => None,
        }
    }
}

/// Conditions under which a publish may flip an endpoint to active.
#[derive(Debug, Clone, Copy)]
pub struct ActivationPolicy {
    pub now: DateTime<Utc>,
    pub enforce_validity_window: bool,
}

impl ActivationPolicy {
    pub fn permits(&self, endpoint: &StreamEndpoint) -> bool {
        !endpoint.active
            && !endpoint.blocked
            && (!self.enforce_validity_window || endpoint.is_valid_at(self.now))
    }
}

pub(crate) fn filter_accepts(filter: &EndpointListQuery, endpoint: &StreamEndpoint) -> bool {
    filter
        .application
        .as_deref()
        .is_none_or(|app| endpoint.application == app)
        && filter.active.is_none_or(|active| endpoint.active == active)
        && filter.blocked.is_none_or(|blocked| endpoint.blocked == blocked)
}

/// Trait for endpoint storage backends.
///
/// Every state transition is a single atomic operation in the backend, so
/// concurrent webhook calls never observe a half-applied change.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Find one endpoint. ID lookups take precedence over credentials; when
    /// several records share the same credentials the lowest ID wins.
    async fn find(&self, query: &EndpointQuery) -> Result<StreamEndpoint>;

    /// List endpoints ordered by ID.
    async fn list(&self, filter: &EndpointListQuery) -> Result<Vec<StreamEndpoint>>;

    /// Set `active` if the endpoint is inactive, unblocked and, when the policy
    /// asks for it, inside its validity window. Check and write are one step.
    async fn activate(&self, endpoint_id: EndpointId, policy: &ActivationPolicy) -> Result<()>;

    /// Clear `active` on the endpoint matching the given credentials.
    async fn set_inactive_by_match(
        &self,
        application: &str,
        name: &str,
        password: Option<&str>,
    ) -> Result<()>;

    /// Clear `active` on an endpoint by ID and return the updated record.
    async fn deactivate(&self, endpoint_id: EndpointId) -> Result<StreamEndpoint>;

    /// Insert a new endpoint and return it with its assigned ID.
    async fn create(&self, endpoint: NewStreamEndpoint) -> Result<StreamEndpoint>;

    /// Replace a stored endpoint.
    async fn update(&self, endpoint: &StreamEndpoint) -> Result<()>;

    /// Delete an endpoint permanently.
    async fn delete(&self, endpoint_id: EndpointId) -> Result<()>;
}
