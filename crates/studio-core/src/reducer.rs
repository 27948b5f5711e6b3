//! Session state reducer.
//!
//! Pure fold of extracted assets into the next [`AppState`], plus the
//! failure path. No ambient state: callers pass the previous state and
//! receive the next one.

use crate::analysis::parse_analysis_metrics;
use crate::app_state::{ActiveView, AppState};
use crate::asset::{AssetKind, GeneratedAsset};
use crate::message::{Message, MessageRole};

/// Notice appended as a system message when the generation call fails.
pub const GENERATION_FAILURE_NOTICE: &str = "Error: Failed to connect to Gemini AI.";

/// Folds a completed generation into the session state.
///
/// The view-selection rules are an order-sensitive fold, applied per
/// asset in encounter order:
///
/// - `preview` replaces the preview document and forces the active
///   view to preview.
/// - `code` replaces the current code (last block wins) and claims the
///   view only if preview has not already claimed it.
/// - `analysis` replaces the scorecard and claims the view. Because
///   this rule is evaluated last for each asset, a response carrying
///   both a preview and an analysis block ends on the analysis view.
///
/// That last point is deliberate: view selection is behavior callers
/// depend on, so the rule order is kept verbatim and pinned by tests.
///
/// The raw accumulated response is appended to the log as a model
/// message and the in-flight flag is cleared.
pub fn apply_generation(
    prev: &AppState,
    active_view: ActiveView,
    assets: &[GeneratedAsset],
    raw_response: &str,
) -> (AppState, ActiveView) {
    let mut next = prev.clone();
    let mut next_view = active_view;

    for asset in assets {
        match asset.kind {
            AssetKind::Preview => {
                next.current_preview_html = asset.content.clone();
                next_view = ActiveView::Preview;
            }
            AssetKind::Code => {
                next.current_code = asset.content.clone();
                if next_view != ActiveView::Preview {
                    next_view = ActiveView::Code;
                }
            }
            AssetKind::Analysis => {
                next.analysis_data = parse_analysis_metrics(&asset.content);
                next_view = ActiveView::Analysis;
            }
        }
    }

    next.messages
        .push(Message::new(MessageRole::Model, raw_response));
    next.is_generating = false;

    (next, next_view)
}

/// Folds a failed generation into the session state.
///
/// Appends a system message with the notice, leaves code, preview and
/// analysis untouched, and clears the in-flight flag.
pub fn apply_failure(prev: &AppState, notice: &str) -> AppState {
    let mut next = prev.clone();
    next.messages.push(Message::new(MessageRole::System, notice));
    next.is_generating = false;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::GeneratedAsset;
    use crate::extractor::extract_assets;

    fn generating_state() -> AppState {
        let mut state = AppState::new();
        state.is_generating = true;
        state
    }

    #[test]
    fn test_preview_only_selects_preview() {
        let assets = vec![GeneratedAsset::new(AssetKind::Preview, "<div>Hi</div>")];
        let (next, view) = apply_generation(&generating_state(), ActiveView::Code, &assets, "raw");
        assert_eq!(view, ActiveView::Preview);
        assert_eq!(next.current_preview_html, "<div>Hi</div>");
        assert!(!next.is_generating);
    }

    #[test]
    fn test_code_does_not_override_preview() {
        let assets = vec![
            GeneratedAsset::new(AssetKind::Preview, "<div>ui</div>"),
            GeneratedAsset::new(AssetKind::Code, "const X = 1;").with_language("tsx"),
        ];
        let (next, view) =
            apply_generation(&generating_state(), ActiveView::Analysis, &assets, "raw");
        assert_eq!(view, ActiveView::Preview);
        // Code content still lands even though it did not win the view.
        assert_eq!(next.current_code, "const X = 1;");
    }

    #[test]
    fn test_analysis_overrides_preview() {
        // Pinned precedence quirk: analysis is evaluated last, so it
        // wins the view even when a preview asset is present.
        let assets = vec![
            GeneratedAsset::new(AssetKind::Preview, "<div>ui</div>"),
            GeneratedAsset::new(AssetKind::Analysis, "[]"),
        ];
        let (_, view) = apply_generation(&generating_state(), ActiveView::Preview, &assets, "raw");
        assert_eq!(view, ActiveView::Analysis);
    }

    #[test]
    fn test_analysis_before_preview_in_asset_order() {
        // Encounter order: analysis first, preview second. The preview
        // rule runs later in the fold and reclaims the view.
        let assets = vec![
            GeneratedAsset::new(AssetKind::Analysis, "[]"),
            GeneratedAsset::new(AssetKind::Preview, "<div>ui</div>"),
        ];
        let (_, view) = apply_generation(&generating_state(), ActiveView::Code, &assets, "raw");
        assert_eq!(view, ActiveView::Preview);
    }

    #[test]
    fn test_last_code_asset_wins_content() {
        let assets = vec![
            GeneratedAsset::new(AssetKind::Code, "const A = 1;"),
            GeneratedAsset::new(AssetKind::Code, "const B = 2;"),
        ];
        let (next, view) = apply_generation(&generating_state(), ActiveView::Preview, &assets, "raw");
        assert_eq!(next.current_code, "const B = 2;");
        // Active view was already preview, so code never claims it.
        assert_eq!(view, ActiveView::Preview);
    }

    #[test]
    fn test_no_assets_keeps_view_and_appends_message() {
        let (next, view) = apply_generation(
            &generating_state(),
            ActiveView::Code,
            &[],
            "just some advice",
        );
        assert_eq!(view, ActiveView::Code);
        assert_eq!(next.messages.len(), 1);
        assert_eq!(next.messages[0].role, MessageRole::Model);
        assert_eq!(next.messages[0].content, "just some advice");
    }

    #[test]
    fn test_malformed_analysis_recovers_to_empty() {
        let assets = vec![GeneratedAsset::new(AssetKind::Analysis, "{not valid")];
        let (next, view) = apply_generation(&generating_state(), ActiveView::Preview, &assets, "raw");
        assert!(next.analysis_data.is_empty());
        assert_eq!(view, ActiveView::Analysis);
    }

    #[test]
    fn test_end_to_end_preview_and_code_scenario() {
        let response = "```html-preview\n<div>Hi</div>\n```\n```tsx\nconst X = () => null;\n```";
        let assets = extract_assets(response);
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].kind, AssetKind::Preview);
        assert_eq!(assets[0].content, "<div>Hi</div>");
        assert_eq!(assets[1].kind, AssetKind::Code);
        assert_eq!(assets[1].content, "const X = () => null;");
        assert_eq!(assets[1].language.as_deref(), Some("tsx"));

        let (next, view) =
            apply_generation(&generating_state(), ActiveView::Code, &assets, response);
        assert_eq!(view, ActiveView::Preview);
        assert_eq!(next.current_preview_html, "<div>Hi</div>");
        assert_eq!(next.current_code, "const X = () => null;");
    }

    #[test]
    fn test_end_to_end_malformed_analysis_scenario() {
        let response = "```json-analysis\n{not valid\n```";
        let assets = extract_assets(response);
        let (next, view) =
            apply_generation(&generating_state(), ActiveView::Preview, &assets, response);
        assert!(next.analysis_data.is_empty());
        assert_eq!(view, ActiveView::Analysis);
    }

    #[test]
    fn test_failure_path() {
        let mut prev = generating_state();
        prev.current_code = "const kept = true;".to_string();
        let next = apply_failure(&prev, GENERATION_FAILURE_NOTICE);
        assert!(!next.is_generating);
        assert_eq!(next.current_code, "const kept = true;");
        assert_eq!(next.current_preview_html, prev.current_preview_html);
        assert_eq!(next.analysis_data, prev.analysis_data);
        let last = next.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::System);
        assert_eq!(last.content, GENERATION_FAILURE_NOTICE);
    }
}
