use crate::normalize::{normalize_text, shingles};
use corpus_dedup::dto::Document;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::hash::Hash;
use std::sync::OnceLock;

/// Confirmed near-duplicate pairs, stored as `(low, high)` document indices.
pub type EdgeSet = FxHashSet<(usize, usize)>;

/// `|a ∩ b| / |a ∪ b|`, defined as 0 when both sets are empty.
pub fn jaccard<T: Eq + Hash>(a: &FxHashSet<T>, b: &FxHashSet<T>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|item| large.contains(*item)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

///
/// Checks candidate pairs against the exact shingle-set Jaccard similarity.
///
/// Shingle sets are built on first use and kept for the lifetime of the
/// confirmer, one slot per document; concurrent first uses of the same
/// document wait on that slot.
///
pub struct SimilarityConfirmer<'a> {
    documents: &'a [Document],
    ngram_length: usize,
    threshold: f64,
    cache: Vec<OnceLock<FxHashSet<String>>>,
}

impl<'a> SimilarityConfirmer<'a> {
    pub fn new(documents: &'a [Document], ngram_length: usize, threshold: f64) -> Self {
        SimilarityConfirmer {
            documents,
            ngram_length,
            threshold,
            cache: (0..documents.len()).map(|_| OnceLock::new()).collect(),
        }
    }

    fn shingle_set(&self, doc: usize) -> &FxHashSet<String> {
        self.cache[doc].get_or_init(|| {
            let normalized = normalize_text(&self.documents[doc].text);
            shingles(&normalized, self.ngram_length)
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
    }

    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        jaccard(self.shingle_set(a), self.shingle_set(b))
    }

    /// A pair is a near-duplicate when it shares at least one shingle and
    /// reaches the threshold.
    pub fn confirm(&self, a: usize, b: usize) -> bool {
        let similarity = self.similarity(a, b);
        similarity > 0.0 && similarity >= self.threshold
    }

    /// Confirms every candidate in parallel and merges the surviving edges.
    pub fn confirm_all(&self, candidates: &FxHashSet<(usize, usize)>) -> EdgeSet {
        candidates
            .par_iter()
            .filter(|&&(a, b)| self.confirm(a, b))
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect()
    }
}
