use corpus_dedup::dto::Document;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

/// Occurrences of each line across a document set, keyed by a 128-bit
/// content hash rather than the line itself.
pub struct LineCounts {
    counts: FxHashMap<u128, usize>,
}

impl LineCounts {
    pub fn new(documents: &[Document]) -> Self {
        let counts = documents
            .par_iter()
            .fold(FxHashMap::default, |mut counts, doc| {
                for line in split_lines(&doc.text) {
                    *counts.entry(line_key(line)).or_insert(0) += 1;
                }
                counts
            })
            .reduce(FxHashMap::default, |mut merged, part| {
                for (key, count) in part {
                    *merged.entry(key).or_insert(0) += count;
                }
                merged
            });
        LineCounts { counts }
    }

    pub fn count(&self, line: &str) -> usize {
        self.counts.get(&line_key(line)).copied().unwrap_or(0)
    }

    pub fn is_unique(&self, line: &str) -> bool {
        self.count(line) == 1
    }

    /// Number of distinct lines seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Lines of `text` with their terminators attached; the last one may have none.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive('\n')
}

/// Line content without its `\n` or `\r\n` terminator.
fn content(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[inline]
fn line_key(line: &str) -> u128 {
    xxh3_128(content(line).as_bytes())
}

/// The lines of `text` that occur exactly once in the counted set, copied
/// byte for byte including their original terminators.
pub fn retain_unique(text: &str, counts: &LineCounts) -> String {
    let mut output = String::with_capacity(text.len());
    for line in split_lines(text).filter(|line| counts.is_unique(line)) {
        output.push_str(line);
    }
    output
}

/// Filters every document against line counts taken over the whole set.
pub fn deduplicate_lines(documents: &[Document]) -> (Vec<String>, LineCounts) {
    let counts = LineCounts::new(documents);
    let filtered = documents
        .par_iter()
        .map(|doc| retain_unique(&doc.text, &counts))
        .collect();
    (filtered, counts)
}
