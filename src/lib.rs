//! curator - Content selection for daily digests
//!
//! Reduces a pool of collected content items to a small, high-quality,
//! diverse per-section selection: deduplication, composite scoring, and
//! diversity-constrained top-k selection.
//!
//! # Architecture
//!
//! The pipeline is a pure batch computation:
//! - Items arrive fully materialized from out-of-scope collectors
//! - Each run is a function of (items, section configs, profile, now)
//! - No state is held between runs; sections are independent and run
//!   in parallel
//! - Per-item and per-section problems become structured diagnostics,
//!   never run failures
//!
//! # Modules
//!
//! - `config`: Section policies and scoring knobs (YAML-loadable)
//! - `core`: Fingerprinting, dedup, scoring, selection, orchestration
//! - `domain`: Data structures (ContentItem, UserProfile, SelectionResult)
//!
//! # Usage
//!
//! ```no_run
//! use chrono::Utc;
//! use curator::{Pipeline, ScoringConfig, SectionConfig};
//!
//! let pipeline = Pipeline::new(ScoringConfig::default())?;
//! let items = vec![]; // from collectors
//! let sections = vec![SectionConfig::new("tech")];
//!
//! let result = pipeline.run(&items, &sections, None, Utc::now());
//! for section in &result.sections {
//!     println!("{}: {} items", section.section_id, section.items.len());
//! }
//! # Ok::<(), curator::ConfigError>(())
//! ```

pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use config::{
    ConfigError, CuratorConfig, DedupStrategy, DiversityConfig, ScoreWeights, ScoringConfig,
    SectionConfig, SortBy,
};
pub use core::Pipeline;
pub use domain::{
    ContentItem, QualitySignals, RankedItem, ScoreBreakdown, SectionReport, SectionSelection,
    SectionWarning, SelectionResult, UserProfile,
};
