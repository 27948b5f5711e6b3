//! Chat session domain model.
//!
//! A session is the persisted unit: an id, a display title, the last
//! modification time, and the owned `AppState` snapshot. Sessions are
//! independent of each other and are only deleted explicitly.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;

/// Title given to sessions created without a first message.
pub const DEFAULT_SESSION_TITLE: &str = "New Project";

/// Maximum number of characters taken from the first message for a title.
const TITLE_PREFIX_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    /// Last-modified time, epoch milliseconds.
    pub timestamp: i64,
    pub state: AppState,
}

impl ChatSession {
    /// Creates a fresh session with default state.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            timestamp: Utc::now().timestamp_millis(),
            state: AppState::new(),
        }
    }

    /// Creates a session titled from the first prompt text.
    pub fn from_first_message(text: &str) -> Self {
        Self::new(derive_title(text))
    }

    /// Refreshes the last-modified timestamp.
    pub fn touch(&mut self) {
        self.timestamp = Utc::now().timestamp_millis();
    }

    /// Renames the session. Blank titles are ignored.
    pub fn rename(&mut self, title: &str) {
        let trimmed = title.trim();
        if !trimmed.is_empty() {
            self.title = trimmed.to_string();
        }
    }
}

/// Derives a session title from the first prompt: the first 30
/// characters, or the default title when the prompt is empty.
pub fn derive_title(text: &str) -> String {
    let prefix: String = text.chars().take(TITLE_PREFIX_LEN).collect();
    if prefix.is_empty() {
        DEFAULT_SESSION_TITLE.to_string()
    } else {
        prefix
    }
}
