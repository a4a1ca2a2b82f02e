//! Selection results and per-section diagnostics.
//!
//! A run never fails because one item or one section is problematic;
//! everything recoverable is surfaced here as structured data instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::ContentItem;

/// The ordered output of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Unique identifier for this run
    pub run_id: Uuid,

    /// The `now` the run was evaluated against
    pub generated_at: DateTime<Utc>,

    /// One entry per section config, in input order
    pub sections: Vec<SectionSelection>,
}

impl SelectionResult {
    pub fn section(&self, section_id: &str) -> Option<&SectionSelection> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    pub fn total_items(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

/// Ranked selection for a single section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSelection {
    pub section_id: String,

    /// Selected items, rank 1 first
    pub items: Vec<RankedItem>,

    /// Stage-by-stage drop counts and warnings
    pub report: SectionReport,
}

/// A selected item with its rank and audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedItem {
    pub item: ContentItem,

    /// 1-based rank within the section
    pub rank: usize,

    pub score: ScoreBreakdown,

    /// Cluster this item represents
    pub cluster_id: String,

    /// Ids of duplicate items collapsed into this representative
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
}

/// Per-dimension scores plus the weighted composite, all in [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub authority: f64,
    pub freshness: f64,
    pub relevance: f64,
    pub quality: f64,
    pub composite: f64,
}

/// Counts of items dropped at each stage of a section run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionReport {
    /// Size of the item pool handed to this section
    pub candidates_in: usize,

    /// Items dropped for missing required fields
    pub malformed_dropped: usize,

    /// Items removed by the section allow-list or profile block-list
    pub source_filtered: usize,

    /// Non-representative duplicates collapsed by deduplication
    pub duplicates_collapsed: usize,

    /// Representatives below the quality threshold
    pub below_quality: usize,

    /// Representatives outside the section time window
    pub outside_window: usize,

    /// Per-source ratio actually in effect after relaxation
    pub effective_source_ratio: f64,

    /// How many +0.1 relaxation steps were taken
    pub relaxation_steps: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SectionWarning>,
}

/// Recoverable problems surfaced alongside a (still valid) selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionWarning {
    /// An item was dropped for a missing required field
    MalformedItem { id_hint: String, reason: String },

    /// `min_source_count` could not be met even after relaxation
    DiversityUnsatisfiable { required: usize, achieved: usize },

    /// `min_topic_count` was not reached by the final selection
    TopicCoverageLow { required: usize, achieved: usize },

    /// The section config was invalid; the section was skipped entirely
    SectionSkipped { error: String },
}
