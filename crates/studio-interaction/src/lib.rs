//! Interaction layer for Mobile Studio.
//!
//! Provides the [`GenerationSource`] seam the application layer streams
//! responses through, and the Gemini REST implementation behind it.

pub mod gemini_client;

pub use gemini_client::{GeminiClient, DEFAULT_GEMINI_MODEL, SYSTEM_INSTRUCTION};

use async_trait::async_trait;
use std::time::Duration;
use studio_core::message::{Attachment, Message};
use thiserror::Error;

/// Errors produced by a generation source.
#[derive(Error, Debug)]
pub enum InteractionError {
    /// No API key available, generation cannot start.
    #[error("API key is missing: set GEMINI_API_KEY (or API_KEY) in the environment")]
    MissingApiKey,

    /// Transport-level failure before or during the stream.
    #[error("Generation request failed: {message}")]
    Request { message: String, is_retryable: bool },

    /// Non-success HTTP status from the generation service.
    #[error("Generation service returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    /// The service responded but the payload could not be decoded.
    #[error("Failed to parse generation response: {0}")]
    Parse(String),

    /// The stream completed without producing any text.
    #[error("Generation produced an empty response")]
    EmptyResponse,
}

impl InteractionError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { is_retryable, .. } => *is_retryable,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Callback invoked with each text fragment as it arrives, in order.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// An ordered streaming text source for one generation turn.
///
/// Implementations yield text fragments strictly in arrival order via
/// the sink, then return the full accumulated text (or fail). The
/// trailing entry of `history` is expected to be the optimistically
/// appended user message for this turn; it is sent as the current
/// message, not as history.
#[async_trait]
pub trait GenerationSource: Send + Sync {
    async fn stream_message(
        &self,
        history: &[Message],
        new_message: &str,
        attachments: &[Attachment],
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, InteractionError>;
}
