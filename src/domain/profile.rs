//! User interest profiles consumed by the relevance dimension.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A weighted set of interest terms plus source preferences.
///
/// Produced by the out-of-scope personalization module; consumed read-only
/// by the scorer. Everything here is optional: an empty profile simply
/// contributes a relevance score of zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Interest terms with weights; matched against title, body, and topics
    #[serde(default)]
    pub interests: BTreeMap<String, f64>,

    /// Sources that get a small relevance boost
    #[serde(default)]
    pub preferred_sources: BTreeSet<String>,

    /// Sources whose items are filtered out before deduplication
    #[serde(default)]
    pub blocked_sources: BTreeSet<String>,

    /// Terms that penalize relevance when present
    #[serde(default)]
    pub excluded_terms: Vec<String>,
}

impl UserProfile {
    pub fn is_blocked(&self, source_id: &str) -> bool {
        self.blocked_sources.contains(source_id)
    }
}
