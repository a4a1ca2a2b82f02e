//! Near-duplicate clustering.
//!
//! Items are grouped with a union-find: first by exact URL key, then
//! (for the semantic strategy) by signature similarity between items
//! published within a bounded time window. Pairwise comparisons run in
//! parallel but merges are applied in canonical index order, so the
//! resulting clusters do not depend on thread scheduling.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::config::{DedupStrategy, ScoringConfig};
use crate::domain::ContentItem;

use super::fingerprint::{exact_key, Fingerprinter, Signature};

/// A group of items deemed to report the same story
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Stable id derived from the sorted member item ids
    pub id: String,

    /// Indices into the input slice, ascending
    pub members: Vec<usize>,

    /// Index (into the input slice) of the elected representative
    pub representative: usize,
}

/// All clusters for one dedup pass, every input item accounted for
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub clusters: Vec<Cluster>,
}

impl DedupOutcome {
    /// Number of non-representative duplicates
    pub fn duplicates_collapsed(&self) -> usize {
        self.clusters
            .iter()
            .map(|c| c.members.len() - 1)
            .sum()
    }
}

/// Group items into duplicate clusters under the given strategy.
///
/// Every item lands in exactly one cluster; a single item forms a
/// singleton cluster representing itself. Empty input yields no clusters.
pub fn dedupe(items: &[&ContentItem], strategy: DedupStrategy, config: &ScoringConfig) -> DedupOutcome {
    if items.is_empty() {
        return DedupOutcome { clusters: vec![] };
    }

    let mut dsu = UnionFind::new(items.len());

    match strategy {
        DedupStrategy::None => {}
        DedupStrategy::Exact => {
            merge_by_exact_key(items, &mut dsu);
        }
        DedupStrategy::Semantic => {
            merge_by_exact_key(items, &mut dsu);
            merge_by_similarity(items, config, &mut dsu);
        }
    }

    let outcome = build_clusters(items, config, &mut dsu);
    debug!(
        items = items.len(),
        clusters = outcome.clusters.len(),
        collapsed = outcome.duplicates_collapsed(),
        ?strategy,
        "dedup complete"
    );
    outcome
}

fn merge_by_exact_key(items: &[&ContentItem], dsu: &mut UnionFind) {
    let mut first_seen: HashMap<u64, usize> = HashMap::new();
    for (idx, item) in items.iter().enumerate() {
        let key = exact_key(&item.url);
        match first_seen.get(&key) {
            Some(&prev) => dsu.union(prev, idx),
            None => {
                first_seen.insert(key, idx);
            }
        }
    }
}

fn merge_by_similarity(items: &[&ContentItem], config: &ScoringConfig, dsu: &mut UnionFind) {
    let fingerprinter = Fingerprinter::new(config.shingle_size, config.signature_size);
    let signatures: Vec<Signature> = items
        .par_iter()
        .map(|item| fingerprinter.signature(&item.title, &item.body))
        .collect();

    // Candidate pairs: items published within the comparison window of
    // each other. Walking a time-sorted order keeps this near O(n·k).
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        items[a]
            .published_at
            .cmp(&items[b].published_at)
            .then_with(|| items[a].id.cmp(&items[b].id))
    });

    let window = chrono::Duration::hours(config.semantic_window_hours);
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (pos, &i) in order.iter().enumerate() {
        let Some(published_i) = items[i].published_at else {
            continue;
        };
        for &j in &order[pos + 1..] {
            let Some(published_j) = items[j].published_at else {
                continue;
            };
            if published_j - published_i > window {
                break;
            }
            pairs.push((i.min(j), i.max(j)));
        }
    }

    let threshold = config.semantic_threshold;
    let mut merges: Vec<(usize, usize)> = pairs
        .par_iter()
        .filter(|&&(i, j)| signatures[i].jaccard(&signatures[j]) >= threshold)
        .copied()
        .collect();

    // Canonical order before applying, so parallel collection order
    // cannot influence the cluster structure.
    merges.sort_unstable();
    for (i, j) in merges {
        dsu.union(i, j);
    }
}

fn build_clusters(items: &[&ContentItem], config: &ScoringConfig, dsu: &mut UnionFind) -> DedupOutcome {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for idx in 0..items.len() {
        groups.entry(dsu.find(idx)).or_default().push(idx);
    }

    let clusters = groups
        .into_values()
        .map(|members| {
            let representative = elect_representative(items, &members, config);
            let joined = members
                .iter()
                .map(|&i| items[i].id.as_str())
                .sorted_unstable()
                .join("|");
            Cluster {
                id: format!("{:016x}", xxh3_64(joined.as_bytes())),
                members,
                representative,
            }
        })
        .collect();

    DedupOutcome { clusters }
}

/// Pick the cluster member that stands in for the story: most complete
/// body, then highest-authority source, then earliest publication, then
/// smallest id.
fn elect_representative(items: &[&ContentItem], members: &[usize], config: &ScoringConfig) -> usize {
    members
        .iter()
        .copied()
        .max_by(|&a, &b| {
            let (ia, ib) = (items[a], items[b]);
            ia.body
                .len()
                .cmp(&ib.body.len())
                .then_with(|| {
                    config
                        .authority_for(&ia.source_id)
                        .total_cmp(&config.authority_for(&ib.source_id))
                })
                .then_with(|| ib.published_at.cmp(&ia.published_at))
                .then_with(|| ib.id.cmp(&ia.id))
        })
        .unwrap_or(members[0])
}

/// Union-find with union-by-smaller-root, so a cluster's root is always
/// its smallest member index.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (lo, hi) = (ra.min(rb), ra.max(rb));
        self.parent[hi] = lo;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn item(id: &str, source: &str, url: &str, body: &str, hour: u32) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            source_id: source.to_string(),
            url: url.to_string(),
            title: format!("title {id}"),
            body: body.to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2026, 8, 1, hour, 0, 0).unwrap()),
            topics: BTreeSet::new(),
            quality_signals: None,
        }
    }

    const STORY: &str = "the city council voted on tuesday night to approve the long \
                         debated transit expansion plan which will add two new light \
                         rail lines and extend service hours across the network over \
                         the next five years according to officials";

    #[test]
    fn test_none_strategy_keeps_singletons() {
        let a = item("a", "s1", "https://x.com/1", STORY, 9);
        let b = item("b", "s2", "https://x.com/1", STORY, 10);
        let pool = vec![&a, &b];

        let outcome = dedupe(&pool, DedupStrategy::None, &ScoringConfig::default());
        assert_eq!(outcome.clusters.len(), 2);
        assert_eq!(outcome.duplicates_collapsed(), 0);
    }

    #[test]
    fn test_exact_merges_tracking_param_variants() {
        let a = item("a", "s1", "https://x.com/story?utm_source=rss", "short", 9);
        let b = item("b", "s2", "http://www.x.com/story/", "longer body text", 10);
        let c = item("c", "s3", "https://x.com/other", "unrelated", 11);
        let pool = vec![&a, &b, &c];

        let outcome = dedupe(&pool, DedupStrategy::Exact, &ScoringConfig::default());
        assert_eq!(outcome.clusters.len(), 2);
        assert_eq!(outcome.duplicates_collapsed(), 1);

        let merged = outcome
            .clusters
            .iter()
            .find(|c| c.members.len() == 2)
            .unwrap();
        // Longer body wins representation
        assert_eq!(merged.representative, 1);
    }

    #[test]
    fn test_semantic_merges_different_urls() {
        let a = item("a", "s1", "https://x.com/1", STORY, 9);
        let b = item("b", "s2", "https://y.org/completely-different-path", STORY, 12);
        let pool = vec![&a, &b];

        let exact = dedupe(&pool, DedupStrategy::Exact, &ScoringConfig::default());
        assert_eq!(exact.clusters.len(), 2, "exact must keep them distinct");

        let semantic = dedupe(&pool, DedupStrategy::Semantic, &ScoringConfig::default());
        assert_eq!(semantic.clusters.len(), 1, "semantic must merge them");
    }

    #[test]
    fn test_window_bounds_comparisons() {
        let a = item("a", "s1", "https://x.com/1", STORY, 0);
        let mut b = item("b", "s2", "https://y.org/2", STORY, 0);
        // Same text but published 100 hours later: outside the 72h window
        b.published_at = Some(Utc.with_ymd_and_hms(2026, 8, 5, 4, 0, 0).unwrap());
        let pool = vec![&a, &b];

        let outcome = dedupe(&pool, DedupStrategy::Semantic, &ScoringConfig::default());
        assert_eq!(outcome.clusters.len(), 2);
    }

    #[test]
    fn test_transitive_merge() {
        // a~b and b~c by exact key chains a, b, c into one cluster
        let a = item("a", "s1", "https://x.com/1", "body a", 9);
        let b = item("b", "s2", "https://x.com/1?utm_source=feed", "body bb", 10);
        let c = item("c", "s3", "https://x.com/1#frag", "body ccc", 11);
        let pool = vec![&a, &b, &c];

        let outcome = dedupe(&pool, DedupStrategy::Exact, &ScoringConfig::default());
        assert_eq!(outcome.clusters.len(), 1);
        assert_eq!(outcome.clusters[0].members, vec![0, 1, 2]);
    }

    #[test]
    fn test_representative_tie_breaks() {
        let mut config = ScoringConfig::default();
        config.source_authority.insert("wire".to_string(), 0.9);
        config.source_authority.insert("blog".to_string(), 0.3);

        // Equal body lengths: authority decides
        let a = item("a", "blog", "https://x.com/1", "same size", 9);
        let b = item("b", "wire", "https://x.com/1", "also same", 10);
        let pool = vec![&a, &b];
        let outcome = dedupe(&pool, DedupStrategy::Exact, &config);
        assert_eq!(outcome.clusters[0].representative, 1);

        // Equal authority too: earliest published wins
        let c = item("c", "wire", "https://x.com/2", "same size", 12);
        let d = item("d", "wire", "https://x.com/2", "also same", 9);
        let pool = vec![&c, &d];
        let outcome = dedupe(&pool, DedupStrategy::Exact, &config);
        assert_eq!(outcome.clusters[0].representative, 1);
    }

    #[test]
    fn test_cluster_id_stable_under_input_order() {
        let a = item("a", "s1", "https://x.com/1", STORY, 9);
        let b = item("b", "s2", "https://y.org/2", STORY, 10);

        let forward = dedupe(&[&a, &b], DedupStrategy::Semantic, &ScoringConfig::default());
        let reversed = dedupe(&[&b, &a], DedupStrategy::Semantic, &ScoringConfig::default());

        assert_eq!(forward.clusters.len(), 1);
        assert_eq!(reversed.clusters.len(), 1);
        assert_eq!(forward.clusters[0].id, reversed.clusters[0].id);
    }

    #[test]
    fn test_empty_input() {
        let outcome = dedupe(&[], DedupStrategy::Semantic, &ScoringConfig::default());
        assert!(outcome.clusters.is_empty());
    }
}
