//! Core selection algorithms.
//!
//! This module contains:
//! - Fingerprint: Exact URL keys and similarity signatures
//! - Dedupe: Union-find duplicate clustering
//! - Score: Composite scoring and the canonical ranking order
//! - Select: Greedy diversity-constrained top-k selection
//! - Pipeline: Per-section orchestration

pub mod dedupe;
pub mod fingerprint;
pub mod pipeline;
pub mod score;
pub mod select;

// Re-export commonly used types
pub use dedupe::{dedupe, Cluster, DedupOutcome};
pub use fingerprint::{exact_key, normalize_url, Fingerprinter, Signature};
pub use pipeline::Pipeline;
pub use score::{ranking_cmp, Scorer};
pub use select::{select, Candidate, Selection, SelectionStats};
