//! Diversity-constrained top-k selection.
//!
//! Greedy admission over the ranked candidate list, bounded by the
//! per-source ratio. If the pool is too concentrated to fill the section,
//! the ratio is relaxed in fixed increments and the pass re-run; the
//! candidate set itself never changes after the initial filter, so the
//! whole procedure is deterministic.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{SectionConfig, SortBy};
use crate::domain::{ScoreBreakdown, SectionWarning};

use super::score::ranking_cmp;

/// Ratio increment per relaxation step
const RELAXATION_STEP: f64 = 0.1;

/// A scored cluster representative eligible for selection
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub item: &'a crate::domain::ContentItem,
    pub score: ScoreBreakdown,
    pub cluster_id: String,
    pub duplicates: Vec<String>,
}

/// Outcome of one section's selection pass
#[derive(Debug)]
pub struct Selection<'a> {
    /// Admitted candidates in final rank order
    pub picked: Vec<Candidate<'a>>,
    pub stats: SelectionStats,
}

/// Selector-stage diagnostics, merged into the section report
#[derive(Debug, Default)]
pub struct SelectionStats {
    pub below_quality: usize,
    pub outside_window: usize,
    pub effective_source_ratio: f64,
    pub relaxation_steps: u32,
    pub warnings: Vec<SectionWarning>,
}

/// Select up to `max_items` candidates under the section's constraints.
pub fn select<'a>(
    candidates: Vec<Candidate<'a>>,
    section: &SectionConfig,
    now: DateTime<Utc>,
) -> Selection<'a> {
    let mut stats = SelectionStats {
        effective_source_ratio: section.diversity.max_ratio_per_source,
        ..Default::default()
    };

    // 1. Quality and recency filters
    let mut pool: Vec<Candidate<'a>> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.score.quality < section.min_quality_score {
            stats.below_quality += 1;
            continue;
        }
        if let Some(window_hours) = section.time_window_hours {
            let in_window = candidate
                .item
                .published_at
                .map(|published| now.signed_duration_since(published).num_hours() < window_hours)
                .unwrap_or(false);
            if !in_window {
                stats.outside_window += 1;
                continue;
            }
        }
        pool.push(candidate);
    }

    // 2. Rank
    pool.sort_by(|a, b| match section.sort_by {
        SortBy::Relevance => ranking_cmp(&a.score, &a.item.id, &b.score, &b.item.id),
        SortBy::Time => b
            .item
            .published_at
            .cmp(&a.item.published_at)
            .then_with(|| ranking_cmp(&a.score, &a.item.id, &b.score, &b.item.id)),
        SortBy::Popularity => b
            .score
            .authority
            .total_cmp(&a.score.authority)
            .then_with(|| ranking_cmp(&a.score, &a.item.id, &b.score, &b.item.id)),
    });

    // 3 & 4. Greedy admission, relaxing the ratio until the section fills
    // or the pool is exhausted
    let mut ratio = section.diversity.max_ratio_per_source;
    let mut picked = greedy_pass(&pool, ratio, section.max_items);
    while picked.len() < section.max_items && picked.len() < pool.len() && ratio < 1.0 {
        ratio = (ratio + RELAXATION_STEP).min(1.0);
        stats.relaxation_steps += 1;
        picked = greedy_pass(&pool, ratio, section.max_items);
    }
    stats.effective_source_ratio = ratio;

    if stats.relaxation_steps > 0 {
        debug!(
            section = %section.id,
            steps = stats.relaxation_steps,
            effective_ratio = ratio,
            "diversity constraint relaxed"
        );
    }

    let picked: Vec<Candidate<'a>> = {
        let mut taken: Vec<Option<Candidate<'a>>> = pool.into_iter().map(Some).collect();
        picked
            .into_iter()
            .filter_map(|idx| taken[idx].take())
            .collect()
    };

    // 5. Soft post-conditions, reported but never fatal
    if !picked.is_empty() || stats.below_quality + stats.outside_window > 0 {
        let sources: BTreeSet<&str> = picked.iter().map(|c| c.item.source_id.as_str()).collect();
        if sources.len() < section.diversity.min_source_count {
            stats.warnings.push(SectionWarning::DiversityUnsatisfiable {
                required: section.diversity.min_source_count,
                achieved: sources.len(),
            });
        }

        if let Some(min_topics) = section.min_topic_count {
            let topics: BTreeSet<&str> = picked
                .iter()
                .flat_map(|c| c.item.topics.iter().map(String::as_str))
                .collect();
            if topics.len() < min_topics {
                stats.warnings.push(SectionWarning::TopicCoverageLow {
                    required: min_topics,
                    achieved: topics.len(),
                });
            }
        }
    }

    Selection { picked, stats }
}

/// One greedy walk over the ranked pool at a fixed ratio.
///
/// A candidate is admitted if, after admission, its source's count stays
/// within ceil(ratio × selected). The first item from any source always
/// passes (the bound is at least 1 for any positive ratio).
fn greedy_pass(pool: &[Candidate<'_>], ratio: f64, max_items: usize) -> Vec<usize> {
    let mut picked = Vec::new();
    let mut per_source: HashMap<&str, usize> = HashMap::new();

    for (idx, candidate) in pool.iter().enumerate() {
        if picked.len() == max_items {
            break;
        }
        let source = candidate.item.source_id.as_str();
        let next_count = per_source.get(source).copied().unwrap_or(0) + 1;
        let bound = (ratio * (picked.len() + 1) as f64).ceil() as usize;
        if next_count <= bound {
            per_source.insert(source, next_count);
            picked.push(idx);
        }
    }

    picked
}
