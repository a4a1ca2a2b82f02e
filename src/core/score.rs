//! Composite scoring.
//!
//! Four independent dimensions (authority, freshness, relevance, quality)
//! combined by normalized weights. Missing optional inputs degrade to
//! neutral defaults; scoring never fails for a well-formed item.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::config::{ConfigError, ScoreWeights, ScoringConfig};
use crate::domain::{ContentItem, ScoreBreakdown, UserProfile};

/// Relevance boost for items from a preferred source
const PREFERRED_SOURCE_BOOST: f64 = 0.1;

/// Relevance penalty scale for excluded-term hits
const EXCLUDED_TERM_PENALTY: f64 = 0.2;

/// Scores items against a profile at a fixed `now`
pub struct Scorer<'a> {
    config: &'a ScoringConfig,
    weights: ScoreWeights,
    profile: Option<&'a UserProfile>,
    now: DateTime<Utc>,
}

impl<'a> Scorer<'a> {
    pub fn new(
        config: &'a ScoringConfig,
        profile: Option<&'a UserProfile>,
        now: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let weights = config.weights.normalized()?;
        Ok(Self {
            config,
            weights,
            profile,
            now,
        })
    }

    /// Compute all dimensions and the weighted composite for one item
    pub fn score(&self, item: &ContentItem) -> ScoreBreakdown {
        let authority = self.config.authority_for(&item.source_id);
        let freshness = self.freshness(item);
        let relevance = self.relevance(item);
        let quality = quality(item);

        let composite = (self.weights.authority * authority
            + self.weights.freshness * freshness
            + self.weights.relevance * relevance
            + self.weights.quality * quality)
            .clamp(0.0, 1.0);

        ScoreBreakdown {
            authority,
            freshness,
            relevance,
            quality,
            composite,
        }
    }

    /// Linear decay from 1.0 at publication to 0.0 at the max age
    fn freshness(&self, item: &ContentItem) -> f64 {
        let Some(published_at) = item.published_at else {
            return 0.0;
        };
        let age_minutes = self.now.signed_duration_since(published_at).num_minutes();
        if age_minutes <= 0 {
            return 1.0;
        }
        let max_minutes = self.config.freshness_max_age_hours as f64 * 60.0;
        (1.0 - age_minutes as f64 / max_minutes).clamp(0.0, 1.0)
    }

    /// Weighted interest-term overlap, with source preferences applied.
    /// Zero without a profile.
    fn relevance(&self, item: &ContentItem) -> f64 {
        let Some(profile) = self.profile else {
            return 0.0;
        };

        let haystack = search_text(item);
        let mut score = 0.0;

        let total_weight: f64 = profile.interests.values().sum();
        if total_weight > 0.0 {
            let matched: f64 = profile
                .interests
                .iter()
                .filter(|(term, _)| haystack.contains(&term.to_lowercase()))
                .map(|(_, weight)| weight)
                .sum();
            score = matched / total_weight;
        }

        if profile.preferred_sources.contains(&item.source_id) {
            score += PREFERRED_SOURCE_BOOST;
        }

        if !profile.excluded_terms.is_empty() {
            let hits = profile
                .excluded_terms
                .iter()
                .filter(|term| haystack.contains(&term.to_lowercase()))
                .count();
            score -= EXCLUDED_TERM_PENALTY * hits as f64 / profile.excluded_terms.len() as f64;
        }

        score.clamp(0.0, 1.0)
    }
}

/// Quality-signal aggregate, neutral 0.5 when signals are absent
pub fn quality(item: &ContentItem) -> f64 {
    match &item.quality_signals {
        Some(signals) => signals.aggregate(),
        None => 0.5,
    }
}

fn search_text(item: &ContentItem) -> String {
    let mut text = String::with_capacity(item.title.len() + item.body.len() + 32);
    text.push_str(&item.title.to_lowercase());
    text.push(' ');
    text.push_str(&item.body.to_lowercase());
    for topic in &item.topics {
        text.push(' ');
        text.push_str(&topic.to_lowercase());
    }
    text
}

/// Canonical ranking order: composite desc, then freshness desc, then
/// authority desc, then id asc. Total and deterministic, so equal scores
/// never fall back to insertion order.
pub fn ranking_cmp(
    a: &ScoreBreakdown,
    a_id: &str,
    b: &ScoreBreakdown,
    b_id: &str,
) -> Ordering {
    b.composite
        .total_cmp(&a.composite)
        .then_with(|| b.freshness.total_cmp(&a.freshness))
        .then_with(|| b.authority.total_cmp(&a.authority))
        .then_with(|| a_id.cmp(b_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QualitySignals;
    use chrono::{Duration, TimeZone};
    use std::collections::{BTreeMap, BTreeSet};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 2, 12, 0, 0).unwrap()
    }

    fn item_published(hours_ago: i64) -> ContentItem {
        ContentItem {
            id: "a".to_string(),
            source_id: "feed".to_string(),
            url: "https://x.com/a".to_string(),
            title: "rust async runtimes compared".to_string(),
            body: "a detailed look at scheduler design".to_string(),
            published_at: Some(now() - Duration::hours(hours_ago)),
            topics: BTreeSet::from(["programming".to_string()]),
            quality_signals: None,
        }
    }

    fn scorer<'a>(
        config: &'a ScoringConfig,
        profile: Option<&'a UserProfile>,
    ) -> Scorer<'a> {
        Scorer::new(config, profile, now()).unwrap()
    }

    #[test]
    fn test_freshness_monotonic_decay() {
        let config = ScoringConfig::default();
        let s = scorer(&config, None);

        let newer = s.score(&item_published(2));
        let older = s.score(&item_published(20));
        let ancient = s.score(&item_published(100));

        assert!(newer.freshness > older.freshness);
        assert!(older.freshness > ancient.freshness);
        assert_eq!(ancient.freshness, 0.0); // past the 48h max age
    }

    #[test]
    fn test_future_timestamps_cap_at_one() {
        let config = ScoringConfig::default();
        let s = scorer(&config, None);
        let breakdown = s.score(&item_published(-3));
        assert_eq!(breakdown.freshness, 1.0);
    }

    #[test]
    fn test_unknown_source_neutral_authority() {
        let config = ScoringConfig::default();
        let s = scorer(&config, None);
        assert_eq!(s.score(&item_published(1)).authority, 0.5);
    }

    #[test]
    fn test_relevance_zero_without_profile() {
        let config = ScoringConfig::default();
        let s = scorer(&config, None);
        assert_eq!(s.score(&item_published(1)).relevance, 0.0);
    }

    #[test]
    fn test_relevance_weighted_overlap() {
        let config = ScoringConfig::default();
        let profile = UserProfile {
            interests: BTreeMap::from([
                ("rust".to_string(), 3.0),
                ("gardening".to_string(), 1.0),
            ]),
            ..Default::default()
        };
        let s = scorer(&config, Some(&profile));

        // "rust" matches (weight 3), "gardening" does not (weight 1)
        let breakdown = s.score(&item_published(1));
        assert!((breakdown.relevance - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_source_preferences() {
        let config = ScoringConfig::default();
        let profile = UserProfile {
            preferred_sources: BTreeSet::from(["feed".to_string()]),
            ..Default::default()
        };
        let s = scorer(&config, Some(&profile));
        assert!((s.score(&item_published(1)).relevance - PREFERRED_SOURCE_BOOST).abs() < 1e-9);
    }

    #[test]
    fn test_excluded_terms_penalize() {
        let config = ScoringConfig::default();
        let profile = UserProfile {
            interests: BTreeMap::from([("rust".to_string(), 1.0)]),
            excluded_terms: vec!["async".to_string()],
            ..Default::default()
        };
        let s = scorer(&config, Some(&profile));

        // Full interest match minus the full excluded-term penalty
        let breakdown = s.score(&item_published(1));
        assert!((breakdown.relevance - (1.0 - EXCLUDED_TERM_PENALTY)).abs() < 1e-9);
    }

    #[test]
    fn test_quality_fallback_neutral() {
        let config = ScoringConfig::default();
        let s = scorer(&config, None);
        assert_eq!(s.score(&item_published(1)).quality, 0.5);

        let mut rich = item_published(1);
        rich.quality_signals = Some(QualitySignals {
            originality: 1.0,
            depth: 1.0,
            credibility: 1.0,
            relevance: 0.0,
            freshness: 0.0,
            readability: 1.0,
        });
        assert_eq!(s.score(&rich).quality, 1.0);
    }

    #[test]
    fn test_composite_in_unit_range() {
        let mut config = ScoringConfig::default();
        config.source_authority.insert("feed".to_string(), 1.0);
        let s = scorer(&config, None);
        let breakdown = s.score(&item_published(0));
        assert!(breakdown.composite >= 0.0 && breakdown.composite <= 1.0);
    }

    #[test]
    fn test_ranking_tie_break_chain() {
        let mut a = ScoreBreakdown {
            authority: 0.5,
            freshness: 0.9,
            relevance: 0.0,
            quality: 0.5,
            composite: 0.7,
        };
        let b = a;

        // Identical scores: smaller id first
        assert_eq!(ranking_cmp(&a, "aa", &b, "bb"), Ordering::Less);
        assert_eq!(ranking_cmp(&a, "bb", &b, "aa"), Ordering::Greater);

        // Higher freshness first when composites tie
        a.freshness = 1.0;
        assert_eq!(ranking_cmp(&a, "zz", &b, "aa"), Ordering::Less);

        // Higher composite always first
        a.composite = 0.1;
        assert_eq!(ranking_cmp(&a, "aa", &b, "bb"), Ordering::Greater);
    }
}
