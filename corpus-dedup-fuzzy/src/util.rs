use crate::dedup::DedupOutcome;
use corpus_dedup::dto::{Document, FuzzyDedupConfig};
use corpus_dedup::error::ServiceError;
use corpus_dedup::util::{output_names, read_documents, write_output};
use csv::Writer;
use std::path::Path;

pub async fn pull_documents(config: &FuzzyDedupConfig) -> Result<(Vec<Document>, usize), ServiceError> {
    let (documents, skipped) = read_documents(&config.inputs).await;
    if documents.is_empty() {
        return Err(ServiceError::bad_config(format!(
            "none of the {} input documents could be loaded",
            config.inputs.len()
        )));
    }
    Ok((documents, skipped))
}

/// Writes every surviving document under its original file name. Nothing is
/// written when two survivors share a file name.
pub async fn push_kept_documents(
    documents: &[Document],
    outcome: &DedupOutcome,
    output_dir: &Path,
) -> Result<usize, ServiceError> {
    let kept: Vec<&Document> = documents
        .iter()
        .zip(&outcome.keep)
        .filter_map(|(doc, &keep)| keep.then_some(doc))
        .collect();
    let names = output_names(kept.iter().copied())?;
    for (doc, name) in kept.iter().zip(&names) {
        write_output(output_dir, name, doc.text.as_bytes()).await?;
    }
    Ok(kept.len())
}

pub fn write_cluster_report(
    path: &Path,
    documents: &[Document],
    outcome: &DedupOutcome,
) -> Result<(), ServiceError> {
    let mut writer = Writer::from_path(path)?;
    for assignment in outcome.assignments(documents) {
        writer.serialize(assignment)?;
    }
    writer.flush()?;
    Ok(())
}
