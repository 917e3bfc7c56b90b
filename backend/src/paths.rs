//! Cross-platform data path resolution.
//!
//! Decides where the JSON endpoint store lives when no database is
//! configured, based on platform conventions and Docker detection.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const ENDPOINTS_FILE: &str = "endpoints.json";

/// Resolved paths for application data storage.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Path to the endpoint storage file
    pub endpoints_path: PathBuf,
}

/// Configuration for path resolution.
#[derive(Debug, Default)]
pub struct PathConfig {
    /// Explicit data directory (endpoints.json will be inside)
    pub data_dir: Option<PathBuf>,
    /// Explicit path to the endpoints file
    pub endpoints_path: Option<PathBuf>,
}

impl DataPaths {
    /// Resolve data paths based on configuration.
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit endpoints_path
    /// 2. Explicit data_dir
    /// 3. Default directory (platform-specific or Docker-detected)
    pub fn resolve(config: PathConfig) -> anyhow::Result<Self> {
        if let Some(path) = config.endpoints_path {
            if let Some(base_dir) = &config.data_dir {
                Self::log_path_override(&path, base_dir);
            }
            info!("Endpoint store: {}", path.display());
            return Ok(Self {
                endpoints_path: path,
            });
        }

        let base_dir = match config.data_dir {
            Some(dir) => dir,
            None => Self::default_data_dir(),
        };

        if !base_dir.exists() {
            std::fs::create_dir_all(&base_dir)?;
            info!("Created data directory: {}", base_dir.display());
        }

        let endpoints_path = base_dir.join(ENDPOINTS_FILE);
        info!("Endpoint store: {}", endpoints_path.display());

        Ok(Self { endpoints_path })
    }

    /// Determine the default data directory based on platform and environment.
    fn default_data_dir() -> PathBuf {
        if Self::is_docker() {
            info!("Docker environment detected, using ./data/ for storage");
            return PathBuf::from("./data");
        }

        if let Some(proj_dirs) = ProjectDirs::from("", "", "onair") {
            let data_dir = proj_dirs.data_dir().to_path_buf();
            info!(
                "Using platform-specific data directory: {}",
                data_dir.display()
            );
            data_dir
        } else {
            warn!("Could not determine user data directory, falling back to ./data/");
            PathBuf::from("./data")
        }
    }

    /// Detect if running inside a Docker container.
    fn is_docker() -> bool {
        if Path::new("/.dockerenv").exists() {
            return true;
        }

        if let Ok(cgroup) = std::fs::read_to_string("/proc/self/cgroup") {
            if cgroup.contains("docker") || cgroup.contains("containerd") {
                return true;
            }
        }

        false
    }

    fn log_path_override(path: &Path, base_dir: &Path) {
        let base_path = base_dir.join(ENDPOINTS_FILE);
        if path != base_path {
            info!(
                "Using custom endpoints path: {} (overriding default: {})",
                path.display(),
                base_path.display()
            );
        }
    }
}
