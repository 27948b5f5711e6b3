//! Session collection persistence.
//!
//! The whole session list is persisted as one JSON document under a
//! fixed file name. It is read once at startup and rewritten whenever
//! the session list changes (callers debounce via
//! [`crate::debounce::DebouncedSaver`]).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use studio_core::session::ChatSession;

use crate::paths::StudioPaths;

/// File name of the persisted collection, the fixed storage key.
pub const SESSIONS_FILE_NAME: &str = "sessions.json";

/// Reads and writes the persisted session collection.
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    /// Creates a store rooted at the given base directory.
    ///
    /// The directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).context("Failed to create studio data directory")?;

        Ok(Self {
            file_path: base_dir.join(SESSIONS_FILE_NAME),
        })
    }

    /// Creates a store at the default location (~/.mobile-studio).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or
    /// the directory cannot be created.
    pub fn default_location() -> Result<Self> {
        Self::new(StudioPaths::base_dir()?)
    }

    /// Loads the session collection.
    ///
    /// A missing file is an empty collection. Timestamps and all other
    /// fields are returned exactly as written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or does
    /// not parse.
    pub fn load(&self) -> Result<Vec<ChatSession>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&self.file_path)
            .context(format!("Failed to read sessions file: {:?}", self.file_path))?;

        let sessions: Vec<ChatSession> =
            serde_json::from_str(&json).context("Failed to deserialize session collection")?;

        Ok(sessions)
    }

    /// Writes the session collection, replacing the previous contents.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be
    /// written.
    pub fn save(&self, sessions: &[ChatSession]) -> Result<()> {
        let json = serde_json::to_string_pretty(sessions)
            .context("Failed to serialize session collection")?;

        fs::write(&self.file_path, json)
            .context(format!("Failed to write sessions file: {:?}", self.file_path))?;

        Ok(())
    }

    /// Returns the path of the backing file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}
