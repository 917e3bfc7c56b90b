//! Application state management.

use crate::config::StreamConfig;
use crate::storage::{ActivationPolicy, EndpointStore, JsonFileStorage};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Storage backend
    storage: Arc<dyn EndpointStore>,
    /// Publish authorization settings
    stream: StreamConfig,
}

impl AppState {
    /// Create new application state with the given storage backend.
    pub fn new(storage: impl EndpointStore + 'static, stream: StreamConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                storage: Arc::new(storage),
                stream,
            }),
        }
    }

    /// Create application state backed by a JSON file.
    pub fn with_json_storage(endpoints_path: impl AsRef<Path>, stream: StreamConfig) -> Self {
        Self::new(JsonFileStorage::new(endpoints_path), stream)
    }

    pub fn storage(&self) -> &dyn EndpointStore {
        self.inner.storage.as_ref()
    }

    pub fn storage_backend(&self) -> &'static str {
        self.inner.storage.backend_name()
    }

    pub fn stream_config(&self) -> &StreamConfig {
        &self.inner.stream
    }

    /// Activation rules as of `now`.
    pub fn activation_policy(&self, now: DateTime<Utc>) -> ActivationPolicy {
        ActivationPolicy {
            now,
            enforce_validity_window: self.inner.stream.enforce_validity_window,
        }
    }
}
