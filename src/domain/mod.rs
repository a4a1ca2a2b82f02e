//! Domain types for the curator pipeline.
//!
//! This module contains the core data structures:
//! - ContentItem: A collected unit, consumed read-only
//! - UserProfile: Weighted interest terms for relevance scoring
//! - SelectionResult: Ranked per-section output with diagnostics

pub mod item;
pub mod profile;
pub mod report;

// Re-export commonly used types
pub use item::{ContentItem, QualitySignals};
pub use profile::UserProfile;
pub use report::{
    RankedItem, ScoreBreakdown, SectionReport, SectionSelection, SectionWarning, SelectionResult,
};
