//! Configuration service implementation.
//!
//! Loads the studio configuration from the configuration file
//! (~/.mobile-studio/config.toml). A missing file yields defaults.

use crate::paths::StudioPaths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Default generation model when the config file does not override it.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// User-tunable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Generation model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// HTTP request timeout for generation calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Configuration service that loads and caches the studio configuration.
///
/// The configuration is read from config.toml and cached to avoid
/// repeated file IO.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<StudioConfig>>>,
}

impl ConfigService {
    /// Creates a new ConfigService.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// Any load failure (missing file, unreadable file, parse error)
    /// falls back to defaults; a parse error is logged.
    pub fn get_config(&self) -> StudioConfig {
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = StudioPaths::config_file()
            .map(|path| Self::load_from_path(&path))
            .unwrap_or_default();

        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    fn load_from_path(path: &Path) -> StudioConfig {
        if !path.exists() {
            return StudioConfig::default();
        }
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("Failed to parse {}: {err}", path.display());
                    StudioConfig::default()
                }
            },
            Err(err) => {
                tracing::warn!("Failed to read {}: {err}", path.display());
                StudioConfig::default()
            }
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
