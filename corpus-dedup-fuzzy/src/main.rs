mod confirm;
mod dedup;
mod lsh;
mod normalize;
mod util;

use clap::Parser;
use corpus_dedup::dto::{FuzzyDedupConfig, KeepPolicy};
use corpus_dedup::error::ServiceError;
use corpus_dedup::filter::{FilterConfig, QualityFilter};
use corpus_dedup::pii::{redact_documents, RedactionCounts};
use corpus_dedup::report::make_report;
use corpus_dedup::util::init_logging;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

/// Removes near-duplicate documents using MinHash signatures and LSH banding.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Documents to deduplicate
    inputs: Vec<PathBuf>,

    /// Directory receiving the surviving documents
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    num_hashes: Option<usize>,

    #[arg(long)]
    num_bands: Option<usize>,

    /// Shingle length in characters
    #[arg(long)]
    ngram_length: Option<usize>,

    /// Jaccard similarity (inclusive) at which two documents are duplicates
    #[arg(long)]
    threshold: Option<f64>,

    /// Seed for the hash family and representative selection
    #[arg(long)]
    seed: Option<u64>,

    /// Which cluster member survives: first or random
    #[arg(long)]
    keep_policy: Option<KeepPolicy>,

    /// Drop documents failing the Gopher quality rules first
    #[arg(long)]
    gopher_filter: bool,

    /// Mask emails, phone numbers and IPv4 addresses in the documents
    #[arg(long)]
    redact_pii: bool,

    /// Write cluster membership as CSV to this path
    #[arg(long)]
    clusters: Option<PathBuf>,

    /// JSON file with a full configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (0 lets rayon decide)
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

impl Args {
    fn into_config(self) -> Result<FuzzyDedupConfig, ServiceError> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|err| ServiceError::bad_config(format!("{}: {}", path.display(), err)))?;
                serde_json::from_str(&raw)
                    .map_err(|err| ServiceError::bad_config(format!("{}: {}", path.display(), err)))?
            }
            None => FuzzyDedupConfig {
                inputs: Vec::new(),
                output_dir: self.output_dir.clone().ok_or_else(|| missing("--output-dir"))?,
                num_hashes: self.num_hashes.ok_or_else(|| missing("--num-hashes"))?,
                num_bands: self.num_bands.ok_or_else(|| missing("--num-bands"))?,
                ngram_length: self.ngram_length.ok_or_else(|| missing("--ngram-length"))?,
                threshold: self.threshold.ok_or_else(|| missing("--threshold"))?,
                seed: 42,
                keep_policy: KeepPolicy::default(),
                gopher_filter: false,
                redact_pii: false,
            },
        };
        if !self.inputs.is_empty() {
            config.inputs = self.inputs;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(num_hashes) = self.num_hashes {
            config.num_hashes = num_hashes;
        }
        if let Some(num_bands) = self.num_bands {
            config.num_bands = num_bands;
        }
        if let Some(ngram_length) = self.ngram_length {
            config.ngram_length = ngram_length;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(keep_policy) = self.keep_policy {
            config.keep_policy = keep_policy;
        }
        config.gopher_filter |= self.gopher_filter;
        config.redact_pii |= self.redact_pii;
        Ok(config)
    }
}

fn missing(flag: &str) -> ServiceError {
    ServiceError::bad_config(format!("{flag} is required when no --config file is given"))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    let result = run(args).await;
    if let Err(err) = &result {
        error!("{}", err);
    }
    let report = make_report(result);
    println!("{}", report.to_json());
    report.exit_code()
}

async fn run(args: Args) -> Result<Value, ServiceError> {
    let threads = args.threads;
    let clusters_path = args.clusters.clone();
    let config = args.into_config()?;
    config.validate()?;
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(ServiceError::internal)?;
    }
    dedup(config, clusters_path).await
}

async fn dedup(config: FuzzyDedupConfig, clusters_path: Option<PathBuf>) -> Result<Value, ServiceError> {
    let start = Instant::now();
    let (documents, skipped) = util::pull_documents(&config).await?;
    let loaded = documents.len();
    info!(
        "Loaded {} documents ({} skipped) in {:.4} secs",
        loaded,
        skipped,
        start.elapsed().as_secs_f64()
    );

    let (mut documents, filtered) = if config.gopher_filter {
        QualityFilter::new(FilterConfig::default()).retain(documents)
    } else {
        (documents, 0)
    };
    if filtered > 0 {
        info!("Filtered out {} low-quality documents", filtered);
    }
    let redacted = if config.redact_pii {
        let counts = redact_documents(&mut documents);
        info!(
            "Redacted {} emails, {} phone numbers, {} IP addresses",
            counts.emails, counts.phone_numbers, counts.ip_addresses
        );
        counts
    } else {
        RedactionCounts::default()
    };

    let outcome = dedup::deduplicate(&documents, &config);

    let start = Instant::now();
    let written = util::push_kept_documents(&documents, &outcome, &config.output_dir).await?;
    if let Some(path) = &clusters_path {
        util::write_cluster_report(path, &documents, &outcome)?;
    }
    info!(
        "Wrote {} documents in {:.4} secs",
        written,
        start.elapsed().as_secs_f64()
    );

    Ok(json!({
        "documents": loaded,
        "skipped": skipped,
        "filtered": filtered,
        "redacted": redacted.total(),
        "candidatePairs": outcome.candidates,
        "edges": outcome.edges,
        "clusters": outcome.clusters.len(),
        "removed": outcome.removed(),
        "kept": written,
        "outputDir": config.output_dir.display().to_string(),
    }))
}
