//! Version and build information embedded at compile time.

use serde::Serialize;
use utoipa::ToSchema;

/// Build and version information
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VersionInfo {
    /// Package version from Cargo.toml
    pub version: &'static str,
    /// Git commit hash (short)
    pub git_hash: &'static str,
    /// Git tag (if on a tagged commit)
    pub git_tag: &'static str,
    /// Git branch name
    pub git_branch: &'static str,
    /// Whether the working directory had uncommitted changes
    pub git_dirty: bool,
    /// Build timestamp (ISO 8601 format)
    pub build_timestamp: &'static str,
    /// Storage backend in use ("postgres" or "json")
    pub storage_backend: &'static str,
}

impl VersionInfo {
    pub fn get(storage_backend: &'static str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            git_tag: env!("GIT_TAG"),
            git_branch: env!("GIT_BRANCH"),
            git_dirty: env!("GIT_DIRTY") == "true",
            build_timestamp: env!("BUILD_TIMESTAMP"),
            storage_backend,
        }
    }

    /// Human-readable version string.
    ///
    /// - "v0.1.0" on a tagged release
    /// - "v0.1.0-dev+abc12345" otherwise
    /// - "v0.1.0-dev+abc12345-dirty" with uncommitted changes
    pub fn version_string(&self) -> String {
        if !self.git_tag.is_empty() {
            self.git_tag.to_string()
        } else {
            let mut version = format!("v{}-dev+{}", self.version, self.git_hash);
            if self.git_dirty {
                version.push_str("-dirty");
            }
            version
        }
    }
}
