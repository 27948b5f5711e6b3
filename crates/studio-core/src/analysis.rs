//! Analysis scorecard model and decoding.

use serde::{Deserialize, Serialize};

/// A named metric with a fixed upper bound, one spoke of the scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetric {
    pub name: String,
    pub value: f64,
    /// Upper bound for the metric. Serialized as `fullMark`.
    #[serde(rename = "fullMark")]
    pub full_mark: f64,
}

impl AnalysisMetric {
    pub fn new(name: impl Into<String>, value: f64, full_mark: f64) -> Self {
        Self {
            name: name.into(),
            value,
            full_mark,
        }
    }
}

/// The five-entry scorecard every fresh session starts with.
pub fn default_scorecard() -> Vec<AnalysisMetric> {
    ["Performance", "Accessibility", "Best Practices", "SEO", "PWA"]
        .into_iter()
        .map(|name| AnalysisMetric::new(name, 0.0, 100.0))
        .collect()
}

/// Decodes the inner text of a `json-analysis` block.
///
/// Decoding fails soft: a payload that is not a valid metric array is
/// logged and mapped to an empty collection. This never errors, per the
/// recovery contract for malformed analysis data.
pub fn parse_analysis_metrics(json: &str) -> Vec<AnalysisMetric> {
    match serde_json::from_str::<Vec<AnalysisMetric>>(json) {
        Ok(metrics) => metrics,
        Err(err) => {
            tracing::warn!("Failed to parse analysis JSON: {err}");
            Vec::new()
        }
    }
}
