//! Per-session application state.
//!
//! `AppState` is the mutable aggregate a session owns: the ordered
//! message log plus the current derived artifacts (code, preview
//! document, analysis scorecard) and the generation-in-progress flag.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::analysis::{default_scorecard, AnalysisMetric};
use crate::message::Message;

/// Placeholder shown in the code panel before anything is generated.
pub const INITIAL_CODE: &str = "// React Native code will appear here...";

/// Welcome document shown in the preview panel before anything is generated.
pub const INITIAL_PREVIEW_HTML: &str = r#"
<div class="flex flex-col items-center justify-center h-full bg-gray-900 p-6 text-center">
  <div class="w-16 h-16 bg-indigo-500 rounded-2xl flex items-center justify-center mb-6 shadow-lg shadow-indigo-500/20">
    <svg xmlns="http://www.w3.org/2000/svg" width="32" height="32" viewBox="0 0 24 24" fill="none" stroke="white" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><path d="m5 8 6 6"/><path d="m4 14 6-6 2-3"/><path d="M2 5h12"/><path d="M7 2h1"/><path d="m22 22-5-10-5 10"/><path d="M14 17h6"/></svg>
  </div>
  <h1 class="text-2xl font-bold text-white mb-2">AI Mobile Studio</h1>
  <p class="text-gray-400 text-sm">Describe your app idea to generate a live preview and React Native code.</p>
</div>
"#;

/// Which derived output is currently presented as primary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActiveView {
    #[default]
    Preview,
    Code,
    Analysis,
}

/// The canonical per-session state the reducer folds assets into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub messages: Vec<Message>,
    #[serde(rename = "currentCode")]
    pub current_code: String,
    #[serde(rename = "currentPreviewHtml")]
    pub current_preview_html: String,
    #[serde(rename = "isGenerating")]
    pub is_generating: bool,
    #[serde(rename = "analysisData")]
    pub analysis_data: Vec<AnalysisMetric>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            current_code: INITIAL_CODE.to_string(),
            current_preview_html: INITIAL_PREVIEW_HTML.to_string(),
            is_generating: false,
            analysis_data: default_scorecard(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the user message appended and the in-flight
    /// flag raised, the optimistic update done at request dispatch.
    pub fn with_pending_message(&self, message: Message) -> Self {
        let mut next = self.clone();
        next.messages.push(message);
        next.is_generating = true;
        next
    }
}
