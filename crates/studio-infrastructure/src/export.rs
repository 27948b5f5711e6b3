//! Project export.
//!
//! Serializes a single session to a downloadable JSON document named
//! from its sanitized title.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use studio_core::session::ChatSession;

/// Fallback file-name stem when a session has an empty title.
const FALLBACK_STEM: &str = "project";

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Serializes a session to its export document (pretty JSON).
pub fn export_session(session: &ChatSession) -> Result<String> {
    serde_json::to_string_pretty(session).context("Failed to serialize session for export")
}

/// Builds the export file name: every whitespace run in the title
/// (leading and trailing ones included) becomes one underscore; only
/// an empty title falls back to `project`.
pub fn export_file_name(title: &str) -> String {
    let stem = if title.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        WHITESPACE_RUN.replace_all(title, "_").into_owned()
    };
    format!("{stem}_export.json")
}

/// Writes the export document into `out_dir` and returns the file path.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be
/// written.
pub fn write_export(session: &ChatSession, out_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let path = out_dir.as_ref().join(export_file_name(&session.title));
    let json = export_session(session)?;
    fs::write(&path, json).context(format!("Failed to write export file: {:?}", path))?;
    Ok(path)
}
