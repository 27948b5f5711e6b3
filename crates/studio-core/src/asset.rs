//! Generated asset model.
//!
//! Assets are transient values derived from a single model response by
//! the extractor. They are folded into [`crate::app_state::AppState`]
//! by the reducer and never persisted on their own.

use strum::Display;

/// The kind of content a fenced block carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AssetKind {
    Code,
    Preview,
    Analysis,
}

/// A typed unit of generated content extracted from one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAsset {
    pub kind: AssetKind,
    pub content: String,
    pub language: Option<String>,
    pub title: Option<String>,
}

impl GeneratedAsset {
    pub fn new(kind: AssetKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            language: None,
            title: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
