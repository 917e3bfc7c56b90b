//! JSON file-based storage implementation.

use super::{filter_accepts, ActivationPolicy, EndpointQuery, EndpointStore, Result, StorageError};
use async_trait::async_trait;
use onair_types::api::EndpointListQuery;
use onair_types::{EndpointId, NewStreamEndpoint, StreamEndpoint};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// JSON file storage format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageFormat {
    version: u32,
    #[serde(default = "first_id")]
    next_id: EndpointId,
    endpoints: Vec<StreamEndpoint>,
}

fn first_id() -> EndpointId {
    1
}

impl Default for StorageFormat {
    fn default() -> Self {
        Self {
            version: 1,
            next_id: first_id(),
            endpoints: Vec::new(),
        }
    }
}

impl StorageFormat {
    fn position(&self, endpoint_id: EndpointId) -> Result<usize> {
        self.endpoints
            .iter()
            .position(|e| e.endpoint_id == endpoint_id)
            .ok_or(StorageError::NotFound)
    }

    /// Endpoints are kept sorted by ID, so the first match is the lowest ID.
    fn position_by_credentials(
        &self,
        application: &str,
        name: &str,
        password: Option<&str>,
    ) -> Result<usize> {
        self.endpoints
            .iter()
            .position(|e| e.matches(application, name, password))
            .ok_or(StorageError::NotFound)
    }
}

/// Storage backend that persists endpoints to a JSON file.
///
/// The file is loaded once and kept in memory. All operations run under one
/// lock, and a mutation is only committed to memory after the file write
/// succeeded.
pub struct JsonFileStorage {
    path: PathBuf,
    state: Mutex<Option<StorageFormat>>,
}

impl JsonFileStorage {
    /// Create a new JSON file storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Mutex::new(None),
        }
    }

    async fn load_from_file(&self) -> Result<StorageFormat> {
        debug!("Loading endpoints from {:?}", self.path);

        if !self.path.exists() {
            info!("Storage file does not exist, starting with no endpoints");
            return Ok(StorageFormat::default());
        }

        let contents = fs::read_to_string(&self.path).await?;

        if contents.trim().is_empty() {
            info!("Storage file is empty, starting with no endpoints");
            return Ok(StorageFormat::default());
        }

        let mut storage: StorageFormat = serde_json::from_str(&contents)?;
        storage.endpoints.sort_by_key(|e| e.endpoint_id);

        // Hand-edited files may carry a stale counter
        if let Some(max) = storage.endpoints.iter().map(|e| e.endpoint_id).max() {
            if storage.next_id <= max {
                warn!(
                    "next_id {} in {:?} is not above highest id {}, adjusting",
                    storage.next_id, self.path, max
                );
                storage.next_id = max + 1;
            }
        }

        info!("Loaded {} endpoints from storage", storage.endpoints.len());
        Ok(storage)
    }

    /// Write the store to file (atomic via temp file + rename).
    async fn write_to_file(&self, storage: &StorageFormat) -> Result<()> {
        debug!(
            "Writing {} endpoints to {:?}",
            storage.endpoints.len(),
            self.path
        );

        let json = serde_json::to_string_pretty(storage)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }

    async fn read<T>(&self, f: impl FnOnce(&StorageFormat) -> Result<T>) -> Result<T> {
        let mut guard = self.state.lock().await;
        if guard.is_none() {
            *guard = Some(self.load_from_file().await?);
        }
        f(guard.get_or_insert_with(StorageFormat::default))
    }

    /// Apply a mutation to a copy of the store, persist it, then commit it.
    async fn mutate<T>(&self, f: impl FnOnce(&mut StorageFormat) -> Result<T>) -> Result<T> {
        let mut guard = self.state.lock().await;
        if guard.is_none() {
            *guard = Some(self.load_from_file().await?);
        }
        let current = guard.get_or_insert_with(StorageFormat::default);

        let mut next = current.clone();
        let value = f(&mut next)?;
        self.write_to_file(&next).await?;
        *current = next;

        Ok(value)
    }

    /// Drop the in-memory copy so the next operation re-reads the file.
    pub async fn invalidate_cache(&self) {
        *self.state.lock().await = None;
        debug!("Cache invalidated");
    }
}

#[async_trait]
impl EndpointStore for JsonFileStorage {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    async fn find(&self, query: &EndpointQuery) -> Result<StreamEndpoint> {
        self.read(|s| {
            let index = match (query.endpoint_id, query.credentials()) {
                (Some(id), _) => s.position(id)?,
                (None, Some((app, name, pwd))) => s.position_by_credentials(app, name, pwd)?,
                (None, None) => return Err(StorageError::NotFound),
            };
            Ok(s.endpoints[index].clone())
        })
        .await
    }

    async fn list(&self, filter: &EndpointListQuery) -> Result<Vec<StreamEndpoint>> {
        self.read(|s| {
            Ok(s.endpoints
                .iter()
                .filter(|e| filter_accepts(filter, e))
                .cloned()
                .collect())
        })
        .await
    }

    async fn activate(&self, endpoint_id: EndpointId, policy: &ActivationPolicy) -> Result<()> {
        self.mutate(|s| {
            let index = s.position(endpoint_id)?;
            let endpoint = &mut s.endpoints[index];
            if !policy.permits(endpoint) {
                return Err(StorageError::NotActivatable(endpoint_id));
            }
            endpoint.active = true;
            Ok(())
        })
        .await
    }

    async fn set_inactive_by_match(
        &self,
        application: &str,
        name: &str,
        password: Option<&str>,
    ) -> Result<()> {
        self.mutate(|s| {
            let index = s.position_by_credentials(application, name, password)?;
            s.endpoints[index].active = false;
            Ok(())
        })
        .await
    }

    async fn deactivate(&self, endpoint_id: EndpointId) -> Result<StreamEndpoint> {
        self.mutate(|s| {
            let index = s.position(endpoint_id)?;
            s.endpoints[index].active = false;
            Ok(s.endpoints[index].clone())
        })
        .await
    }

    async fn create(&self, endpoint: NewStreamEndpoint) -> Result<StreamEndpoint> {
        self.mutate(|s| {
            let created = endpoint.into_endpoint(s.next_id);
            s.next_id += 1;
            s.endpoints.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn update(&self, endpoint: &StreamEndpoint) -> Result<()> {
        self.mutate(|s| {
            let index = s.position(endpoint.endpoint_id)?;
            s.endpoints[index] = endpoint.clone();
            Ok(())
        })
        .await
    }

    async fn delete(&self, endpoint_id: EndpointId) -> Result<()> {
        self.mutate(|s| {
            let index = s.position(endpoint_id).inspect_err(|_| {
                warn!("Attempted to delete non-existent endpoint: {}", endpoint_id);
            })?;
            s.endpoints.remove(index);
            Ok(())
        })
        .await
    }
}
