//! Content items as produced by the (out-of-scope) collection stage.
//!
//! Items are consumed read-only; cluster assignments and scores are
//! attached by the pipeline as separate annotation types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single collected content unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable identifier, unique per source + canonical URL pair
    pub id: String,

    /// Origin collector/channel name (used for diversity accounting)
    pub source_id: String,

    /// Canonical location (used for the exact-dedup key)
    pub url: String,

    /// Normalized title, HTML already stripped
    #[serde(default)]
    pub title: String,

    /// Normalized body text
    #[serde(default)]
    pub body: String,

    /// Publication timestamp; items without one are dropped as malformed
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Topic/category labels (may be empty)
    #[serde(default)]
    pub topics: BTreeSet<String>,

    /// Independently computed sub-scores, each in [0,1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_signals: Option<QualitySignals>,
}

impl ContentItem {
    /// Why this item cannot enter the pipeline, if anything.
    ///
    /// Missing required fields are reported as warnings and the item is
    /// dropped from the pool; they never abort a run.
    pub fn malformed_reason(&self) -> Option<&'static str> {
        if self.id.trim().is_empty() {
            return Some("missing id");
        }
        if self.url.trim().is_empty() {
            return Some("missing url");
        }
        if self.published_at.is_none() {
            return Some("missing published_at");
        }
        None
    }

    /// Short identifier for diagnostics, falling back to the URL when the
    /// id itself is the missing field.
    pub fn id_hint(&self) -> String {
        if self.id.trim().is_empty() {
            self.url.chars().take(80).collect()
        } else {
            self.id.clone()
        }
    }
}

/// Per-item quality sub-scores, each in [0,1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualitySignals {
    pub originality: f64,
    pub depth: f64,
    pub credibility: f64,
    pub relevance: f64,
    pub freshness: f64,
    pub readability: f64,
}

impl QualitySignals {
    /// Aggregate the content-quality dimensions (originality, depth,
    /// credibility, readability) into a single [0,1] score.
    pub fn aggregate(&self) -> f64 {
        let dims = [
            self.originality,
            self.depth,
            self.credibility,
            self.readability,
        ];
        dims.iter().map(|d| d.clamp(0.0, 1.0)).sum::<f64>() / dims.len() as f64
    }
}

impl Default for QualitySignals {
    fn default() -> Self {
        Self {
            originality: 0.5,
            depth: 0.5,
            credibility: 0.5,
            relevance: 0.5,
            freshness: 0.5,
            readability: 0.5,
        }
    }
}
