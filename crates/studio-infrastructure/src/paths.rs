//! Path resolution for studio data files.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Base directory name under the user's home directory.
const BASE_DIR_NAME: &str = ".mobile-studio";

/// Resolves the locations of studio configuration and session data.
///
/// # Directory Structure
///
/// ```text
/// ~/.mobile-studio/
/// ├── config.toml       # Optional user configuration
/// └── sessions.json     # The persisted session collection
/// ```
pub struct StudioPaths;

impl StudioPaths {
    /// Returns the studio base directory (`~/.mobile-studio`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn base_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home_dir.join(BASE_DIR_NAME))
    }

    /// Returns the path of the persisted session collection.
    pub fn sessions_file() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("sessions.json"))
    }

    /// Returns the path of the user configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }
}
