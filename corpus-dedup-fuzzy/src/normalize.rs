use lazy_static::lazy_static;
use regex::Regex;
use std::iter;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

///
/// Canonical form of a document used for fingerprinting.
///
/// Decomposes to NFD and keeps only ASCII (so accented letters lose their
/// marks), lower-cases, removes everything that is neither a word character
/// nor whitespace, then collapses whitespace runs to a single space.
/// Applying it twice gives the same result as applying it once.
///
pub fn normalize_text(text: &str) -> String {
    let ascii: String = text.nfd().filter(char::is_ascii).collect();
    let lowered = ascii.to_ascii_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    WHITESPACE.replace_all(&stripped, " ").into_owned()
}

/// Every character `k`-gram of `text`, one per start offset, in order.
pub fn shingles(text: &str, k: usize) -> Vec<&str> {
    if k == 0 {
        return Vec::new();
    }
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(iter::once(text.len()))
        .collect();
    if offsets.len() <= k {
        return Vec::new();
    }
    (0..offsets.len() - k)
        .map(|i| &text[offsets[i]..offsets[i + k]])
        .collect()
}
