use corpus_dedup::dto::Document;
use corpus_dedup::report::Status;
use corpus_dedup::util::{base_name, output_names, read_document, read_documents, write_output};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_read_document() {
    let dir = TempDir::new().unwrap();
    let path = fixture(dir.path(), "page.txt", "Grüße aus Köln".as_bytes());

    let doc = read_document(&path).await.unwrap();
    assert_eq!(doc.text, "Grüße aus Köln");
    assert_eq!(doc.path, path);
    assert_eq!(doc.id, path.display().to_string());
}

#[tokio::test]
async fn test_undecodable_document_is_a_document_error() {
    let dir = TempDir::new().unwrap();
    let path = fixture(dir.path(), "binary.bin", &[0xc3, 0x28, 0xff]);

    let err = read_document(&path).await.unwrap_err();
    assert_eq!(err.status, Status::Document);
    assert!(err.msg.contains("binary.bin"), "{}", err.msg);
}

#[tokio::test]
async fn test_read_documents_skips_failures_in_order() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        fixture(dir.path(), "one.txt", b"first"),
        dir.path().join("absent.txt"),
        fixture(dir.path(), "two.txt", b"second"),
        fixture(dir.path(), "bad.txt", &[0xff]),
        fixture(dir.path(), "three.txt", b""),
    ];

    let (documents, skipped) = read_documents(&paths).await;
    assert_eq!(skipped, 2);
    let texts: Vec<&str> = documents.iter().map(|doc| doc.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", ""]);
}

#[tokio::test]
async fn test_write_output_creates_directory() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("nested").join("out");

    let target = write_output(&output_dir, "doc.txt", b"kept").await.unwrap();
    assert_eq!(target, output_dir.join("doc.txt"));
    assert_eq!(fs::read_to_string(target).unwrap(), "kept");
}

#[test]
fn test_base_name() {
    assert_eq!(base_name(Path::new("/data/shard-3/doc-17.txt")).unwrap(), "doc-17.txt");
    assert!(base_name(Path::new("/")).is_err());
}

#[test]
fn test_output_names_detect_collisions() {
    let doc = |path: &str| Document {
        id: path.to_string(),
        path: PathBuf::from(path),
        text: String::new(),
    };
    let distinct = vec![doc("/a/one.txt"), doc("/a/two.txt"), doc("/b/three.txt")];
    assert_eq!(
        output_names(&distinct).unwrap(),
        vec!["one.txt", "two.txt", "three.txt"]
    );

    let colliding = vec![doc("/x/doc.txt"), doc("/a/other.txt"), doc("/y/doc.txt")];
    let err = output_names(&colliding).unwrap_err();
    assert_eq!(err.status, Status::Document);
    assert!(err.msg.contains("/x/doc.txt") && err.msg.contains("/y/doc.txt"), "{}", err.msg);
}
