use crate::dto::Document;
use crate::error::ServiceError;
use futures::stream::{self, StreamExt};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Number of documents read concurrently.
const READ_CONCURRENCY: usize = 32;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn read_document(path: &Path) -> Result<Document, ServiceError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ServiceError::document(format!("{}: {}", path.display(), err)))?;
    let text = String::from_utf8(bytes)
        .map_err(|err| ServiceError::document(format!("{}: {}", path.display(), err)))?;
    Ok(Document {
        id: path.display().to_string(),
        path: path.to_path_buf(),
        text,
    })
}

///
/// Loads every readable document, preserving input order.
///
/// Returns the loaded documents and the number that were skipped because
/// they could not be read or decoded.
///
pub async fn read_documents(paths: &[PathBuf]) -> (Vec<Document>, usize) {
    let results: Vec<Result<Document, ServiceError>> = stream::iter(paths)
        .map(|path| read_document(path))
        .buffered(READ_CONCURRENCY)
        .collect()
        .await;
    let mut skipped = 0;
    let documents = results
        .into_iter()
        .filter_map(|result| match result {
            Ok(doc) => Some(doc),
            Err(err) => {
                warn!(reason = %err.msg, "Skipping document");
                skipped += 1;
                None
            }
        })
        .collect();
    (documents, skipped)
}

pub fn base_name(path: &Path) -> Result<String, ServiceError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ServiceError::document(format!("{} has no file name", path.display())))
}

///
/// Output file names for a set of documents, in the order given.
///
/// Outputs are named by base name only, so two inputs from different
/// directories can map to the same file. That is an error rather than a
/// silent overwrite.
///
pub fn output_names<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Result<Vec<String>, ServiceError> {
    let mut seen: FxHashMap<String, &Path> = FxHashMap::default();
    let mut names = Vec::new();
    for doc in documents {
        let name = base_name(&doc.path)?;
        if let Some(earlier) = seen.insert(name.clone(), &doc.path) {
            return Err(ServiceError::document(format!(
                "{} and {} would both be written as {}",
                earlier.display(),
                doc.path.display(),
                name
            )));
        }
        names.push(name);
    }
    Ok(names)
}

pub async fn write_output(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf, ServiceError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| ServiceError::internal(format!("{}: {}", dir.display(), err)))?;
    let target = dir.join(name);
    tokio::fs::write(&target, contents)
        .await
        .map_err(|err| ServiceError::internal(format!("{}: {}", target.display(), err)))?;
    Ok(target)
}
