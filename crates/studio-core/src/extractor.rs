//! Fenced-block asset extraction.
//!
//! A completed model response may carry up to three kinds of fenced
//! blocks: a `html-preview` block, code blocks tagged with one of the
//! React Native language markers, and a `json-analysis` block. The tag
//! decides which pattern a block satisfies; no block can satisfy two
//! patterns. Absent or malformed blocks simply yield no asset.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::asset::{AssetKind, GeneratedAsset};

static PREVIEW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```html-preview(.*?)```").expect("valid preview regex"));

static CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(tsx|typescript|javascript|jsx)(.*?)```").expect("valid code regex")
});

static ANALYSIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json-analysis(.*?)```").expect("valid analysis regex"));

/// Splits a complete response into its typed assets.
///
/// The returned order is fixed: the preview (first match only, if any),
/// then every code block in document order, then the analysis block
/// (first match only, if any). The analysis asset carries the raw
/// trimmed block body; decoding it into metrics is the reducer's job.
pub fn extract_assets(response: &str) -> Vec<GeneratedAsset> {
    let mut assets = Vec::new();

    if let Some(caps) = PREVIEW_RE.captures(response) {
        if let Some(body) = caps.get(1) {
            assets.push(
                GeneratedAsset::new(AssetKind::Preview, body.as_str().trim())
                    .with_language("html")
                    .with_title("UI Preview"),
            );
        }
    }

    for caps in CODE_RE.captures_iter(response) {
        let lang = &caps[1];
        // The tag alternation cannot match the preview marker, so a
        // preview block is never double-counted as code.
        assets.push(
            GeneratedAsset::new(AssetKind::Code, caps[2].trim())
                .with_language(lang)
                .with_title("React Native Component"),
        );
    }

    if let Some(caps) = ANALYSIS_RE.captures(response) {
        if let Some(body) = caps.get(1) {
            assets.push(
                GeneratedAsset::new(AssetKind::Analysis, body.as_str().trim())
                    .with_title("Project Analysis"),
            );
        }
    }

    assets
}
