//! Section and scoring configuration.
//!
//! Configs are defined in YAML (or constructed directly) and validated
//! before use. A section with an invalid config is skipped; it never
//! affects other sections.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ranking order for a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Composite score, highest first
    #[default]
    Relevance,
    /// Publication time, newest first
    Time,
    /// Authority dimension, highest first
    Popularity,
}

/// Deduplication strategy for a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Merge on normalized-URL equality only
    Exact,
    /// Merge on URL equality, then on text similarity
    #[default]
    Semantic,
    /// Every item is its own cluster
    None,
}

/// Source-diversity constraints for a section
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiversityConfig {
    /// Maximum fraction of the selection a single source may contribute,
    /// in (0, 1]. 1.0 means unconstrained.
    #[serde(default = "default_max_ratio_per_source")]
    pub max_ratio_per_source: f64,

    /// Preferred minimum number of distinct sources. A soft constraint:
    /// unmet means a warning, never a failure.
    #[serde(default = "default_min_source_count")]
    pub min_source_count: usize,
}

fn default_max_ratio_per_source() -> f64 {
    1.0
}
fn default_min_source_count() -> usize {
    1
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            max_ratio_per_source: default_max_ratio_per_source(),
            min_source_count: default_min_source_count(),
        }
    }
}

/// Per-section selection policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Section identifier (used in the result and in logs)
    pub id: String,

    /// Upper bound on the number of selected items
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub dedup_strategy: DedupStrategy,

    #[serde(default)]
    pub diversity: DiversityConfig,

    /// Recency cutoff; items older than this are excluded before ranking
    #[serde(default)]
    pub time_window_hours: Option<i64>,

    /// Minimum quality-dimension score in [0, 1]
    #[serde(default)]
    pub min_quality_score: f64,

    /// Source allow-list; empty means all sources
    #[serde(default)]
    pub sources: Vec<String>,

    /// Preferred minimum number of distinct topics in the selection.
    /// Soft constraint, like `min_source_count`.
    #[serde(default)]
    pub min_topic_count: Option<usize>,
}

fn default_max_items() -> usize {
    10
}

impl SectionConfig {
    /// A section config with defaults for everything but the id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            max_items: default_max_items(),
            sort_by: SortBy::default(),
            dedup_strategy: DedupStrategy::default(),
            diversity: DiversityConfig::default(),
            time_window_hours: None,
            min_quality_score: 0.0,
            sources: Vec::new(),
            min_topic_count: None,
        }
    }

    /// Validate the section config
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptySectionId);
        }
        let ratio = self.diversity.max_ratio_per_source;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::RatioOutOfRange(ratio));
        }
        if self.diversity.min_source_count == 0 {
            return Err(ConfigError::MinSourceCountZero);
        }
        if !(0.0..=1.0).contains(&self.min_quality_score) {
            return Err(ConfigError::QualityThresholdOutOfRange(
                self.min_quality_score,
            ));
        }
        if let Some(hours) = self.time_window_hours {
            if hours <= 0 {
                return Err(ConfigError::TimeWindowNotPositive(hours));
            }
        }
        Ok(())
    }

    /// Check an item's source against the allow-list
    pub fn allows_source(&self, source_id: &str) -> bool {
        self.sources.is_empty() || self.sources.iter().any(|s| s == source_id)
    }
}

/// Weights for the composite score dimensions.
///
/// Weights are normalized before use; they only need a positive sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_weight_authority")]
    pub authority: f64,
    #[serde(default = "default_weight_freshness")]
    pub freshness: f64,
    #[serde(default = "default_weight_relevance")]
    pub relevance: f64,
    #[serde(default = "default_weight_quality")]
    pub quality: f64,
}

fn default_weight_authority() -> f64 {
    0.3
}
fn default_weight_freshness() -> f64 {
    0.4
}
fn default_weight_relevance() -> f64 {
    0.1
}
fn default_weight_quality() -> f64 {
    0.2
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            authority: default_weight_authority(),
            freshness: default_weight_freshness(),
            relevance: default_weight_relevance(),
            quality: default_weight_quality(),
        }
    }
}

impl ScoreWeights {
    /// Scale the weights to sum to 1.0
    pub fn normalized(&self) -> std::result::Result<ScoreWeights, ConfigError> {
        let sum = self.authority + self.freshness + self.relevance + self.quality;
        if !(sum.is_finite() && sum > 0.0)
            || [self.authority, self.freshness, self.relevance, self.quality]
                .iter()
                .any(|w| *w < 0.0)
        {
            return Err(ConfigError::WeightsNotNormalizable(sum));
        }
        Ok(ScoreWeights {
            authority: self.authority / sum,
            freshness: self.freshness / sum,
            relevance: self.relevance / sum,
            quality: self.quality / sum,
        })
    }
}

/// Global scoring and deduplication knobs, shared by all sections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    /// Per-source authority weight in [0, 1]; unknown sources get 0.5
    #[serde(default)]
    pub source_authority: HashMap<String, f64>,

    /// Age at which freshness decays to zero
    #[serde(default = "default_freshness_max_age_hours")]
    pub freshness_max_age_hours: i64,

    /// Jaccard similarity at or above which clusters merge
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f64,

    /// Only compare items published within this many hours of each other
    #[serde(default = "default_semantic_window_hours")]
    pub semantic_window_hours: i64,

    /// Bottom-k sketch size for similarity signatures
    #[serde(default = "default_signature_size")]
    pub signature_size: usize,

    /// Word n-gram length for shingling
    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,
}

fn default_freshness_max_age_hours() -> i64 {
    48
}
fn default_semantic_threshold() -> f64 {
    0.8
}
fn default_semantic_window_hours() -> i64 {
    72
}
fn default_signature_size() -> usize {
    64
}
fn default_shingle_size() -> usize {
    3
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            source_authority: HashMap::new(),
            freshness_max_age_hours: default_freshness_max_age_hours(),
            semantic_threshold: default_semantic_threshold(),
            semantic_window_hours: default_semantic_window_hours(),
            signature_size: default_signature_size(),
            shingle_size: default_shingle_size(),
        }
    }
}

impl ScoringConfig {
    /// Validate the scoring config
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.weights.normalized()?;
        if !(0.0..=1.0).contains(&self.semantic_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.semantic_threshold));
        }
        if self.freshness_max_age_hours <= 0 {
            return Err(ConfigError::TimeWindowNotPositive(
                self.freshness_max_age_hours,
            ));
        }
        if self.semantic_window_hours <= 0 {
            return Err(ConfigError::TimeWindowNotPositive(self.semantic_window_hours));
        }
        if self.signature_size == 0 || self.shingle_size == 0 {
            return Err(ConfigError::SketchParamsZero);
        }
        Ok(())
    }

    /// Authority weight for a source, clamped to [0, 1]; 0.5 if unknown
    pub fn authority_for(&self, source_id: &str) -> f64 {
        self.source_authority
            .get(source_id)
            .copied()
            .unwrap_or(0.5)
            .clamp(0.0, 1.0)
    }
}

/// Top-level config file: scoring knobs plus the section list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,

    pub sections: Vec<SectionConfig>,
}

impl CuratorConfig {
    /// Load a config from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse a config from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse curator config YAML")
    }

    /// Validate scoring and every section
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.scoring.validate()?;
        for section in &self.sections {
            section.validate()?;
        }
        Ok(())
    }
}

/// Invalid configuration values.
///
/// The only hard errors in the crate; everything else degrades to
/// warnings on the section report.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("section id cannot be empty")]
    EmptySectionId,

    #[error("max_ratio_per_source must be in (0, 1], got {0}")]
    RatioOutOfRange(f64),

    #[error("min_source_count must be at least 1")]
    MinSourceCountZero,

    #[error("min_quality_score must be in [0, 1], got {0}")]
    QualityThresholdOutOfRange(f64),

    #[error("semantic_threshold must be in [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("time windows must be positive, got {0} hours")]
    TimeWindowNotPositive(i64),

    #[error("score weights must have a positive finite sum, got {0}")]
    WeightsNotNormalizable(f64),

    #[error("signature_size and shingle_size must be at least 1")]
    SketchParamsZero,
}
