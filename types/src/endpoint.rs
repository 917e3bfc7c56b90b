//! Stream endpoint definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Unique identifier for a stream endpoint.
pub type EndpointId = i64;

/// A configured ingest point on the media server.
///
/// An endpoint is identified towards the media server by its
/// `(application, name, password)` triple. While a publisher is live on it,
/// `active` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StreamEndpoint {
    /// Unique identifier, assigned by the store on insert
    pub endpoint_id: EndpointId,
    /// RTMP application namespace (e.g. "live")
    pub application: String,
    /// Stream key within the application
    pub name: String,
    /// Extra shared secret the publisher has to present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Publishing is refused before this instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_valid: Option<DateTime<Utc>>,
    /// Publishing is refused after this instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_valid: Option<DateTime<Utc>>,
    /// Operator notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// A publish session is currently live
    #[serde(default)]
    pub active: bool,
    /// Administrative kill-switch
    #[serde(default)]
    pub blocked: bool,
    /// Hint for external cleanup tooling
    #[serde(default)]
    pub auto_remove: bool,
}

impl StreamEndpoint {
    /// Whether this endpoint is the one addressed by the given credentials.
    ///
    /// Password comparison is exact, and an endpoint without a password only
    /// matches a request without one.
    pub fn matches(&self, application: &str, name: &str, password: Option<&str>) -> bool {
        self.application == application && self.name == name && self.password.as_deref() == password
    }

    /// Whether `now` lies inside the validity window. Unset bounds are open.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.start_valid.is_none_or(|start| start <= now)
            && self.end_valid.is_none_or(|end| now <= end)
    }

    /// Overwrite every editable field from an update request.
    pub fn apply(&mut self, update: UpdateStreamEndpoint) {
        self.application = update.application;
        self.name = update.name;
        self.password = normalize_password(update.password);
        self.start_valid = update.start_valid;
        self.end_valid = update.end_valid;
        self.notes = update.notes;
        self.active = update.active;
        self.blocked = update.blocked;
        self.auto_remove = update.auto_remove;
    }
}

/// Treat an empty password the same as no password.
pub fn normalize_password(password: Option<String>) -> Option<String> {
    password.filter(|p| !p.is_empty())
}

/// Request to create a new endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "validation", derive(garde::Validate))]
pub struct NewStreamEndpoint {
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 255)))]
    pub application: String,
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 255)))]
    pub name: String,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(length(max = 255)))]
    pub password: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub start_valid: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub end_valid: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub notes: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub blocked: bool,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub auto_remove: bool,
}

impl NewStreamEndpoint {
    /// Create a request for an open, passwordless endpoint.
    pub fn new(application: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            name: name.into(),
            password: None,
            start_valid: None,
            end_valid: None,
            notes: None,
            blocked: false,
            auto_remove: false,
        }
    }

    /// Set the shared secret.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Whether the validity window is well formed (start not after end).
    pub fn has_ordered_window(&self) -> bool {
        ordered_window(self.start_valid, self.end_valid)
    }

    /// Build the stored record. New endpoints always start inactive.
    pub fn into_endpoint(self, endpoint_id: EndpointId) -> StreamEndpoint {
        StreamEndpoint {
            endpoint_id,
            application: self.application,
            name: self.name,
            password: normalize_password(self.password),
            start_valid: self.start_valid,
            end_valid: self.end_valid,
            notes: self.notes,
            active: false,
            blocked: self.blocked,
            auto_remove: self.auto_remove,
        }
    }
}

/// Request to replace the editable fields of an endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "validation", derive(garde::Validate))]
pub struct UpdateStreamEndpoint {
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 255)))]
    pub application: String,
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 255)))]
    pub name: String,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(length(max = 255)))]
    pub password: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub start_valid: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub end_valid: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub notes: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub active: bool,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub blocked: bool,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub auto_remove: bool,
}

impl UpdateStreamEndpoint {
    /// Whether the validity window is well formed (start not after end).
    pub fn has_ordered_window(&self) -> bool {
        ordered_window(self.start_valid, self.end_valid)
    }
}

fn ordered_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start <= end,
        _ => true,
    }
}
