//! Per-section pipeline orchestration.
//!
//! For each section: validate config, drop malformed items, apply source
//! filters, deduplicate, score the representatives, select. Sections are
//! independent and run in parallel; results are reassembled in config
//! order. A problematic item or section never fails the run.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ScoringConfig, SectionConfig};
use crate::domain::{
    ContentItem, RankedItem, SectionReport, SectionSelection, SectionWarning, SelectionResult,
    UserProfile,
};

use super::dedupe::dedupe;
use super::score::Scorer;
use super::select::{select, Candidate};

/// The content selection pipeline: dedup, score, select per section.
///
/// Holds only validated scoring config; each `run` is a pure function of
/// its inputs and carries no state between invocations.
pub struct Pipeline {
    scoring: ScoringConfig,
}

impl Pipeline {
    /// Create a pipeline, validating the scoring config up front
    pub fn new(scoring: ScoringConfig) -> Result<Self, crate::config::ConfigError> {
        scoring.validate()?;
        Ok(Self { scoring })
    }

    /// Run every section over the item pool and assemble the result.
    ///
    /// `now` is passed explicitly so runs are reproducible; callers
    /// normally pass `Utc::now()`.
    pub fn run(
        &self,
        items: &[ContentItem],
        sections: &[SectionConfig],
        profile: Option<&UserProfile>,
        now: DateTime<Utc>,
    ) -> SelectionResult {
        info!(
            items = items.len(),
            sections = sections.len(),
            "starting selection run"
        );

        let sections: Vec<SectionSelection> = sections
            .par_iter()
            .map(|section| self.run_section(items, section, profile, now))
            .collect();

        let result = SelectionResult {
            run_id: Uuid::new_v4(),
            generated_at: now,
            sections,
        };
        info!(
            run_id = %result.run_id,
            selected = result.total_items(),
            "selection run complete"
        );
        result
    }

    fn run_section(
        &self,
        items: &[ContentItem],
        section: &SectionConfig,
        profile: Option<&UserProfile>,
        now: DateTime<Utc>,
    ) -> SectionSelection {
        let mut report = SectionReport {
            candidates_in: items.len(),
            effective_source_ratio: section.diversity.max_ratio_per_source,
            ..Default::default()
        };

        if let Err(error) = section.validate() {
            warn!(section = %section.id, %error, "section config invalid, skipping");
            report.warnings.push(SectionWarning::SectionSkipped {
                error: error.to_string(),
            });
            return SectionSelection {
                section_id: section.id.clone(),
                items: vec![],
                report,
            };
        }

        let scorer = match Scorer::new(&self.scoring, profile, now) {
            Ok(scorer) => scorer,
            Err(error) => {
                warn!(section = %section.id, %error, "scoring config invalid, skipping");
                report.warnings.push(SectionWarning::SectionSkipped {
                    error: error.to_string(),
                });
                return SectionSelection {
                    section_id: section.id.clone(),
                    items: vec![],
                    report,
                };
            }
        };

        // Sanitize the pool: malformed items are reported and dropped,
        // then the section allow-list and profile block-list apply.
        let mut pool: Vec<&ContentItem> = Vec::with_capacity(items.len());
        for item in items {
            if let Some(reason) = item.malformed_reason() {
                report.malformed_dropped += 1;
                report.warnings.push(SectionWarning::MalformedItem {
                    id_hint: item.id_hint(),
                    reason: reason.to_string(),
                });
                continue;
            }
            let blocked = profile.map(|p| p.is_blocked(&item.source_id)).unwrap_or(false);
            if blocked || !section.allows_source(&item.source_id) {
                report.source_filtered += 1;
                continue;
            }
            pool.push(item);
        }

        let outcome = dedupe(&pool, section.dedup_strategy, &self.scoring);
        report.duplicates_collapsed = outcome.duplicates_collapsed();

        // Only representatives are eligible for selection; duplicates are
        // kept on the candidate for auditing.
        let candidates: Vec<Candidate<'_>> = outcome
            .clusters
            .iter()
            .map(|cluster| {
                let representative = pool[cluster.representative];
                let duplicates = cluster
                    .members
                    .iter()
                    .filter(|&&m| m != cluster.representative)
                    .map(|&m| pool[m].id.clone())
                    .collect();
                Candidate {
                    item: representative,
                    score: scorer.score(representative),
                    cluster_id: cluster.id.clone(),
                    duplicates,
                }
            })
            .collect();

        let selection = select(candidates, section, now);
        report.below_quality = selection.stats.below_quality;
        report.outside_window = selection.stats.outside_window;
        report.effective_source_ratio = selection.stats.effective_source_ratio;
        report.relaxation_steps = selection.stats.relaxation_steps;
        report.warnings.extend(selection.stats.warnings);

        let ranked = selection
            .picked
            .into_iter()
            .enumerate()
            .map(|(idx, candidate)| RankedItem {
                item: candidate.item.clone(),
                rank: idx + 1,
                score: candidate.score,
                cluster_id: candidate.cluster_id,
                duplicates: candidate.duplicates,
            })
            .collect::<Vec<_>>();

        debug!(
            section = %section.id,
            selected = ranked.len(),
            collapsed = report.duplicates_collapsed,
            malformed = report.malformed_dropped,
            "section complete"
        );

        SectionSelection {
            section_id: section.id.clone(),
            items: ranked,
            report,
        }
    }
}
