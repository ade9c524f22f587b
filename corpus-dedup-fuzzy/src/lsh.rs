use crate::normalize::{normalize_text, shingles};
use corpus_dedup::dto::Document;
use rand::prelude::*;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};

/// Signature slot of a document without shingles. Real values fit in 32 bits.
pub const EMPTY_SLOT: u64 = u64::MAX;

///
/// Seeded hash family shared by every document of a run.
///
/// Each member hashes a shingle once with FxHash and then applies its own
/// multiply-add permutation.
///
#[derive(Clone, Debug)]
pub struct HashFamily {
    permutations: Vec<(u64, u64)>,
}

impl HashFamily {
    pub fn new(num_hashes: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let permutations = (0..num_hashes)
            .map(|_| (rng.gen::<u64>() | 1, rng.gen::<u64>()))
            .collect();
        HashFamily { permutations }
    }

    pub fn len(&self) -> usize {
        self.permutations.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinHash {
    pub hash_values: Vec<u64>,
}

impl MinHash {
    pub fn new(items: &FxHashSet<&str>, family: &HashFamily) -> Self {
        let mut hash_values = vec![EMPTY_SLOT; family.len()];
        for item in items {
            let item_hash = calculate_hash(item);
            for (i, &(a, b)) in family.permutations.iter().enumerate() {
                let hash = permute_hash(item_hash, a, b);
                hash_values[i] = hash_values[i].min(hash);
            }
        }
        MinHash { hash_values }
    }

    /// Signs a raw document: normalize, shingle, then take the minima.
    pub fn from_text(text: &str, ngram_length: usize, family: &HashFamily) -> Self {
        let normalized = normalize_text(text);
        let items: FxHashSet<&str> = shingles(&normalized, ngram_length).into_iter().collect();
        MinHash::new(&items, family)
    }

    pub fn is_empty(&self) -> bool {
        self.hash_values.iter().all(|&v| v == EMPTY_SLOT)
    }

    /// Fraction of agreeing slots, an estimate of the shingle-set Jaccard.
    pub fn estimated_similarity(&self, other: &MinHash) -> f64 {
        if self.hash_values.is_empty() {
            return 0.0;
        }
        let equal_count = self
            .hash_values
            .iter()
            .zip(&other.hash_values)
            .filter(|&(&a, &b)| a == b && a != EMPTY_SLOT)
            .count();
        equal_count as f64 / self.hash_values.len() as f64
    }

    /// The `num_bands` contiguous, equally sized slices of the signature.
    pub fn bands(&self, num_bands: usize) -> impl Iterator<Item = &[u64]> {
        let band_size = self.hash_values.len() / num_bands;
        self.hash_values.chunks_exact(band_size)
    }
}

/// Signs every document in parallel. Output order follows the input.
pub fn sign_documents(documents: &[Document], ngram_length: usize, family: &HashFamily) -> Vec<MinHash> {
    documents
        .par_iter()
        .map(|doc| MinHash::from_text(&doc.text, ngram_length, family))
        .collect()
}

///
/// Banded bucket tables over a set of signatures.
///
/// Documents are referred to by their index in the signature slice. Buckets
/// are keyed by the exact band values and never shared across band indices.
/// Signatures without shingles are left out of every bucket: they can never
/// confirm, and would otherwise all collide with each other.
///
pub struct MinHashLSH<'a> {
    /// One table per band: band values -> document indices
    hash_tables: Vec<FxHashMap<&'a [u64], Vec<usize>>>,
}

impl<'a> MinHashLSH<'a> {
    ///
    /// Buckets every signature.
    ///
    /// ## Arguments
    ///
    /// * `signatures` - One signature per document, all of the same length.
    /// * `num_bands` - Number of bands; must divide the signature length.
    ///
    pub fn new(signatures: &'a [MinHash], num_bands: usize) -> Self {
        let mut hash_tables: Vec<FxHashMap<&[u64], Vec<usize>>> = vec![FxHashMap::default(); num_bands];
        for (doc, minhash) in signatures.iter().enumerate() {
            if minhash.is_empty() {
                continue;
            }
            for (table, band) in hash_tables.iter_mut().zip(minhash.bands(num_bands)) {
                table.entry(band).or_default().push(doc);
            }
        }
        MinHashLSH { hash_tables }
    }

    /// Buckets holding at least two documents, across all bands.
    pub fn buckets(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.hash_tables
            .iter()
            .flat_map(|table| table.values())
            .filter(|docs| docs.len() > 1)
            .map(|docs| docs.as_slice())
    }

    /// Unordered document pairs sharing at least one bucket, as `(low, high)`.
    pub fn candidate_pairs(&self) -> FxHashSet<(usize, usize)> {
        let mut pairs = FxHashSet::default();
        for docs in self.buckets() {
            for (i, &a) in docs.iter().enumerate() {
                for &b in &docs[i + 1..] {
                    pairs.insert((a.min(b), a.max(b)));
                }
            }
        }
        pairs
    }
}

#[inline]
fn calculate_hash<T: Hash>(t: &T) -> u64 {
    let mut s = FxHasher::default();
    t.hash(&mut s);
    s.finish()
}

#[inline]
fn permute_hash(hash: u64, a: u64, b: u64) -> u64 {
    a.wrapping_mul(hash).wrapping_add(b) >> 32
}
