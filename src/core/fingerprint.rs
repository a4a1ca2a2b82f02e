//! Exact-match and similarity fingerprints.
//!
//! Two keys per item: a hash of the normalized canonical URL for exact
//! deduplication, and a bottom-k sketch of word-shingle hashes for cheap
//! Jaccard estimation. Both are pure functions of the text.

use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;
use xxhash_rust::xxh3::xxh3_64;

/// Hash of the normalized canonical URL
pub fn exact_key(url: &str) -> u64 {
    xxh3_64(normalize_url(url).as_bytes())
}

/// Canonicalize a URL for comparison: lowercase, no scheme, no `www.`,
/// no fragment, no tracking query parameters, no trailing slash.
/// Non-tracking query parameters keep their original order.
pub fn normalize_url(url: &str) -> String {
    let mut url = url.trim().to_lowercase();

    for scheme in ["https://", "http://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            url = rest.to_string();
            break;
        }
    }
    if let Some(rest) = url.strip_prefix("www.") {
        url = rest.to_string();
    }

    if let Some(pos) = url.find('#') {
        url.truncate(pos);
    }

    if let Some(pos) = url.find('?') {
        let path = url[..pos].to_string();
        let kept = url[pos + 1..]
            .split('&')
            .filter(|pair| !is_tracking_param(pair))
            .collect::<Vec<_>>()
            .join("&");
        url = if kept.is_empty() {
            path
        } else {
            format!("{path}?{kept}")
        };
    }

    url.trim_end_matches('/').to_string()
}

fn is_tracking_param(pair: &str) -> bool {
    let key = pair.split('=').next().unwrap_or(pair);
    key.starts_with("utm_") || matches!(key, "ref" | "source" | "fbclid" | "gclid")
}

/// Bottom-k sketch of shingle hashes, sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    hashes: Vec<u64>,
}

impl Signature {
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Estimate Jaccard similarity from the two sketches.
    ///
    /// Uses the bottom-k of the union as the sample: the fraction of those
    /// hashes present in both sketches estimates |A ∩ B| / |A ∪ B|. Two
    /// empty signatures compare as identical.
    pub fn jaccard(&self, other: &Signature) -> f64 {
        if self.hashes.is_empty() && other.hashes.is_empty() {
            return 1.0;
        }
        if self.hashes.is_empty() || other.hashes.is_empty() {
            return 0.0;
        }

        let k = self.hashes.len().max(other.hashes.len());
        let union: BTreeSet<u64> = self.hashes.iter().chain(&other.hashes).copied().collect();
        let sample: Vec<u64> = union.into_iter().take(k).collect();

        let shared = sample
            .iter()
            .filter(|h| self.hashes.binary_search(h).is_ok() && other.hashes.binary_search(h).is_ok())
            .count();

        shared as f64 / sample.len() as f64
    }
}

/// Derives similarity signatures from normalized text
#[derive(Debug, Clone, Copy)]
pub struct Fingerprinter {
    shingle_size: usize,
    signature_size: usize,
}

impl Fingerprinter {
    pub fn new(shingle_size: usize, signature_size: usize) -> Self {
        Self {
            shingle_size: shingle_size.max(1),
            signature_size: signature_size.max(1),
        }
    }

    /// Signature over the concatenated title and body
    pub fn signature(&self, title: &str, body: &str) -> Signature {
        let tokens = tokenize(&format!("{title} {body}"));

        let mut shingles = BTreeSet::new();
        if tokens.len() < self.shingle_size {
            // Short texts still get a signature from whatever is there
            if !tokens.is_empty() {
                shingles.insert(hash_shingle(&tokens));
            }
        } else {
            for window in tokens.windows(self.shingle_size) {
                shingles.insert(hash_shingle(window));
            }
        }

        Signature {
            hashes: shingles.into_iter().take(self.signature_size).collect(),
        }
    }
}

fn hash_shingle(words: &[String]) -> u64 {
    xxh3_64(words.join("\u{1f}").as_bytes())
}

fn tokenize(text: &str) -> Vec<String> {
    text.nfc()
        .collect::<String>()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}
