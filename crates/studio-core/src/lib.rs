//! Domain layer for Mobile Studio.
//!
//! This crate holds the pure, synchronous core of the studio: the chat
//! domain models, the fenced-block asset extractor, and the session
//! state reducer. It performs no IO and has no async surface; the
//! infrastructure and interaction crates sit on top of it.

pub mod analysis;
pub mod app_state;
pub mod asset;
pub mod error;
pub mod extractor;
pub mod message;
pub mod reducer;
pub mod session;

// Re-export common error type
pub use error::StudioError;

pub use analysis::{default_scorecard, parse_analysis_metrics, AnalysisMetric};
pub use app_state::{ActiveView, AppState};
pub use asset::{AssetKind, GeneratedAsset};
pub use extractor::extract_assets;
pub use message::{Attachment, Message, MessageRole};
pub use session::ChatSession;
