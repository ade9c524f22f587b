//! Document-level quality filtering.
//!
//! Classifier backends (language identification, NSFW, toxicity and quality
//! models) are plugged in through [`Scorer`]. The filter only owns the order in which
//! stages run and the comparison of each score against its expectation.

use crate::dto::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const LABEL_PREFIX: &str = "__label__";

/// Raw quality-model label for low-quality (common crawl) text.
const NEGATIVE_QUALITY: &str = "negative";

/// A black-box text classifier.
pub trait Scorer: Send + Sync {
    /// Returns the predicted label and its confidence in `[0, 1]`.
    fn score(&self, text: &str) -> (String, f64);
}

impl<F> Scorer for F
where
    F: Fn(&str) -> (String, f64) + Send + Sync,
{
    fn score(&self, text: &str) -> (String, f64) {
        self(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Language,
    Nsfw,
    Toxicity,
    Quality,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Language => f.write_str("language"),
            Stage::Nsfw => f.write_str("nsfw"),
            Stage::Toxicity => f.write_str("toxicity"),
            Stage::Quality => f.write_str("quality"),
        }
    }
}

/// Label a scorer must predict, and the confidence it must reach.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Expectation {
    pub label: String,
    pub min_confidence: f64,
}

impl Expectation {
    fn new(label: &str, min_confidence: f64) -> Self {
        Self {
            label: label.to_string(),
            min_confidence,
        }
    }

    fn accepts(&self, label: &str, confidence: f64) -> bool {
        strip_label(label) == strip_label(&self.label) && confidence >= self.min_confidence
    }
}

fn strip_label(label: &str) -> &str {
    label.strip_prefix(LABEL_PREFIX).unwrap_or(label)
}

/// Maps a raw quality-model label onto `cc` (negative) or `wiki` (anything else).
pub fn quality_label(raw: &str) -> &'static str {
    if strip_label(raw) == NEGATIVE_QUALITY {
        "cc"
    } else {
        "wiki"
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub language: Expectation,
    pub nsfw: Expectation,
    pub toxicity: Expectation,
    pub quality: Expectation,
    pub gopher: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            language: Expectation::new("en", 0.65),
            nsfw: Expectation::new("non-nsfw", 0.9),
            toxicity: Expectation::new("non-toxic", 0.9),
            quality: Expectation::new("wiki", 0.5),
            gopher: true,
        }
    }
}

/// Gopher heuristic that a document failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GopherRule {
    WordCount,
    MeanWordLength,
    EllipsisLines,
    AlphabeticWords,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    Classifier {
        stage: Stage,
        label: String,
        confidence: f64,
    },
    Gopher(GopherRule),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Keep,
    Reject(Rejection),
}

impl Verdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep)
    }
}

/// Runs language, NSFW, toxicity, quality and Gopher checks in that order,
/// stopping at the first failure. Stages without a scorer are skipped.
pub struct QualityFilter {
    config: FilterConfig,
    language: Option<Box<dyn Scorer>>,
    nsfw: Option<Box<dyn Scorer>>,
    toxicity: Option<Box<dyn Scorer>>,
    quality: Option<Box<dyn Scorer>>,
}

impl QualityFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            language: None,
            nsfw: None,
            toxicity: None,
            quality: None,
        }
    }

    pub fn with_scorer(mut self, stage: Stage, scorer: Box<dyn Scorer>) -> Self {
        match stage {
            Stage::Language => self.language = Some(scorer),
            Stage::Nsfw => self.nsfw = Some(scorer),
            Stage::Toxicity => self.toxicity = Some(scorer),
            Stage::Quality => self.quality = Some(scorer),
        }
        self
    }

    pub fn evaluate(&self, text: &str) -> Verdict {
        let stages = [
            (Stage::Language, &self.language, &self.config.language),
            (Stage::Nsfw, &self.nsfw, &self.config.nsfw),
            (Stage::Toxicity, &self.toxicity, &self.config.toxicity),
            (Stage::Quality, &self.quality, &self.config.quality),
        ];
        for (stage, scorer, expectation) in stages {
            let Some(scorer) = scorer else { continue };
            let (mut label, confidence) = scorer.score(text);
            if stage == Stage::Quality {
                label = quality_label(&label).to_string();
            }
            if !expectation.accepts(&label, confidence) {
                return Verdict::Reject(Rejection::Classifier {
                    stage,
                    label,
                    confidence,
                });
            }
        }
        if self.config.gopher {
            if let Err(rule) = gopher_check(text) {
                return Verdict::Reject(Rejection::Gopher(rule));
            }
        }
        Verdict::Keep
    }

    ///
    /// Splits `documents` into those the filter keeps, in input order, and
    /// the number it rejected.
    ///
    pub fn retain(&self, documents: Vec<Document>) -> (Vec<Document>, usize) {
        let total = documents.len();
        let kept: Vec<Document> = documents
            .into_iter()
            .filter(|doc| match self.evaluate(&doc.text) {
                Verdict::Keep => true,
                Verdict::Reject(rejection) => {
                    debug!(id = %doc.id, ?rejection, "Filtered document");
                    false
                }
            })
            .collect();
        let rejected = total - kept.len();
        (kept, rejected)
    }
}

pub fn gopher_check(text: &str) -> Result<(), GopherRule> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 50 || words.len() > 100_000 {
        return Err(GopherRule::WordCount);
    }

    let total_chars: usize = words.iter().map(|w| w.chars().count()).sum();
    let mean_length = total_chars as f64 / words.len() as f64;
    if !(3.0..=10.0).contains(&mean_length) {
        return Err(GopherRule::MeanWordLength);
    }

    let lines: Vec<&str> = text.lines().collect();
    let ellipsis_lines = lines.iter().filter(|l| l.trim_end().ends_with("...")).count();
    if !lines.is_empty() && ellipsis_lines as f64 / lines.len() as f64 > 0.3 {
        return Err(GopherRule::EllipsisLines);
    }

    let alphabetic = words
        .iter()
        .filter(|w| w.chars().any(char::is_alphabetic))
        .count();
    if (alphabetic as f64 / words.len() as f64) < 0.8 {
        return Err(GopherRule::AlphabeticWords);
    }
    Ok(())
}

pub fn gopher_filters(text: &str) -> bool {
    gopher_check(text).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn prose(words: usize) -> String {
        let vocabulary = ["river", "stone", "quiet", "morning", "lantern", "harbor", "meadow"];
        (0..words)
            .map(|i| vocabulary[i % vocabulary.len()])
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn fixed(label: &'static str, confidence: f64) -> Box<dyn Scorer> {
        Box::new(move |_: &str| (label.to_string(), confidence))
    }

    #[test]
    fn test_gopher_word_count() {
        assert_eq!(gopher_check(&prose(49)), Err(GopherRule::WordCount));
        assert!(gopher_filters(&prose(50)));
    }

    #[test]
    fn test_gopher_mean_word_length() {
        let short = vec!["a"; 60].join(" ");
        assert_eq!(gopher_check(&short), Err(GopherRule::MeanWordLength));
        let long = vec!["extraordinarily"; 60].join(" ");
        assert_eq!(gopher_check(&long), Err(GopherRule::MeanWordLength));
    }

    #[test]
    fn test_gopher_ellipsis_lines() {
        let text = (0..10)
            .map(|i| if i < 4 { format!("{}...", prose(6)) } else { prose(6) })
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(gopher_check(&text), Err(GopherRule::EllipsisLines));
    }

    #[test]
    fn test_gopher_alphabetic_words() {
        let text = format!("{} {}", prose(40), vec!["12345"; 20].join(" "));
        assert_eq!(gopher_check(&text), Err(GopherRule::AlphabeticWords));
    }

    #[test]
    fn test_labels_compared_without_prefix() {
        let filter = QualityFilter::new(FilterConfig {
            gopher: false,
            ..Default::default()
        })
        .with_scorer(Stage::Language, fixed("__label__en", 0.9));
        assert_eq!(filter.evaluate("anything"), Verdict::Keep);
    }

    #[test]
    fn test_confidence_below_threshold_rejects() {
        let filter = QualityFilter::new(FilterConfig::default())
            .with_scorer(Stage::Language, fixed("en", 0.5));
        assert_eq!(
            filter.evaluate(&prose(80)),
            Verdict::Reject(Rejection::Classifier {
                stage: Stage::Language,
                label: "en".to_string(),
                confidence: 0.5,
            })
        );
    }

    #[test]
    fn test_stops_at_first_rejection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let toxicity = move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            ("non-toxic".to_string(), 1.0)
        };
        let filter = QualityFilter::new(FilterConfig::default())
            .with_scorer(Stage::Language, fixed("en", 0.99))
            .with_scorer(Stage::Nsfw, fixed("nsfw", 0.95))
            .with_scorer(Stage::Toxicity, Box::new(toxicity));

        let verdict = filter.evaluate(&prose(80));
        assert!(matches!(
            verdict,
            Verdict::Reject(Rejection::Classifier { stage: Stage::Nsfw, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_quality_label_mapping() {
        assert_eq!(quality_label("negative"), "cc");
        assert_eq!(quality_label("__label__negative"), "cc");
        assert_eq!(quality_label("positive"), "wiki");
        assert_eq!(quality_label("__label__wiki"), "wiki");
    }

    #[test]
    fn test_quality_runs_after_toxicity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let quality = move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            ("negative".to_string(), 0.99)
        };
        let filter = QualityFilter::new(FilterConfig::default())
            .with_scorer(Stage::Quality, Box::new(quality))
            .with_scorer(Stage::Toxicity, fixed("toxic", 0.95));
        assert!(matches!(
            filter.evaluate(&prose(80)),
            Verdict::Reject(Rejection::Classifier { stage: Stage::Toxicity, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let filter = QualityFilter::new(FilterConfig::default())
            .with_scorer(Stage::Toxicity, fixed("non-toxic", 0.95))
            .with_scorer(Stage::Quality, fixed("__label__negative", 0.99));
        assert_eq!(
            filter.evaluate(&prose(10)),
            Verdict::Reject(Rejection::Classifier {
                stage: Stage::Quality,
                label: "cc".to_string(),
                confidence: 0.99,
            })
        );
    }

    #[test]
    fn test_quality_rejection_precedes_gopher() {
        let filter = QualityFilter::new(FilterConfig::default()).with_scorer(Stage::Quality, fixed("positive", 0.4));
        assert!(matches!(
            filter.evaluate(&prose(10)),
            Verdict::Reject(Rejection::Classifier { stage: Stage::Quality, .. })
        ));
        let filter = QualityFilter::new(FilterConfig::default()).with_scorer(Stage::Quality, fixed("positive", 0.8));
        assert_eq!(
            filter.evaluate(&prose(10)),
            Verdict::Reject(Rejection::Gopher(GopherRule::WordCount))
        );
        assert!(filter.evaluate(&prose(80)).is_keep());
    }

    #[test]
    fn test_retain_keeps_order() {
        let documents: Vec<Document> = [prose(80), prose(5), prose(60)]
            .into_iter()
            .enumerate()
            .map(|(i, text)| Document {
                id: format!("doc-{i}"),
                path: format!("doc-{i}.txt").into(),
                text,
            })
            .collect();
        let (kept, rejected) = QualityFilter::new(FilterConfig::default()).retain(documents);
        assert_eq!(rejected, 1);
        let ids: Vec<&str> = kept.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-0", "doc-2"]);
    }

    #[test]
    fn test_all_stages_pass() {
        let filter = QualityFilter::new(FilterConfig::default())
            .with_scorer(Stage::Language, fixed("__label__en", 0.99))
            .with_scorer(Stage::Nsfw, fixed("__label__non-nsfw", 0.95))
            .with_scorer(Stage::Toxicity, fixed("__label__non-toxic", 0.97))
            .with_scorer(Stage::Quality, fixed("__label__positive", 0.7));
        assert!(filter.evaluate(&prose(80)).is_keep());
        assert_eq!(
            filter.evaluate(&prose(10)),
            Verdict::Reject(Rejection::Gopher(GopherRule::WordCount))
        );
    }
}
