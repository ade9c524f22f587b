mod lines;

use clap::Parser;
use corpus_dedup::dto::LineDedupConfig;
use corpus_dedup::error::ServiceError;
use corpus_dedup::report::make_report;
use corpus_dedup::util::{init_logging, output_names, read_documents, write_output};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

/// Drops every line that occurs more than once across the input documents.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Documents to filter
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving the filtered documents
    #[arg(short, long)]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    let config = LineDedupConfig {
        inputs: args.inputs,
        output_dir: args.output_dir,
    };
    let result = dedup(config).await;
    if let Err(err) = &result {
        error!("{}", err);
    }
    let report = make_report(result);
    println!("{}", report.to_json());
    report.exit_code()
}

async fn dedup(config: LineDedupConfig) -> Result<Value, ServiceError> {
    config.validate()?;
    let start = Instant::now();
    let (documents, skipped) = read_documents(&config.inputs).await;
    if documents.is_empty() {
        return Err(ServiceError::bad_config(format!(
            "none of the {} input documents could be loaded",
            config.inputs.len()
        )));
    }
    info!(
        "Loaded {} documents ({} skipped) in {:.4} secs",
        documents.len(),
        skipped,
        start.elapsed().as_secs_f64()
    );

    let names = output_names(&documents)?;

    let start = Instant::now();
    let (filtered, counts) = lines::deduplicate_lines(&documents);
    let lines_kept: usize = filtered.iter().map(|text| text.lines().count()).sum();
    info!(
        "Counted {} distinct lines in {:.4} secs",
        counts.len(),
        start.elapsed().as_secs_f64()
    );

    for (name, text) in names.iter().zip(&filtered) {
        write_output(&config.output_dir, name, text.as_bytes()).await?;
    }

    Ok(json!({
        "documents": documents.len(),
        "skipped": skipped,
        "distinctLines": counts.len(),
        "linesKept": lines_kept,
        "outputDir": config.output_dir.display().to_string(),
    }))
}
