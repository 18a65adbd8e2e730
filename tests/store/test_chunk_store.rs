// Tests for chunk store persistence and loading

use docqa::embeddings::HashEmbedder;
use docqa::store::{ChunkStore, StoreError, CHUNKS_FILE, MANIFEST_FILE};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

async fn seeded_store(dir: &Path) -> ChunkStore {
    let embedder = Arc::new(HashEmbedder::default());
    let mut store = ChunkStore::create(dir, embedder, "documents").await.unwrap();
    store
        .add_texts(
            &["The sky is blue.".to_string(), "Grass is green.".to_string()],
            &[json!({"source": "doc1"}), json!({"source": "doc2"})],
        )
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_persist_then_open_round_trips() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    store.persist().await.unwrap();

    let reopened = ChunkStore::open(dir.path(), Arc::new(HashEmbedder::default()))
        .await
        .unwrap();

    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.dimension(), 384);
    assert_eq!(reopened.collection(), "documents");
}

#[tokio::test]
async fn test_persist_writes_manifest_and_chunks_files() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    store.persist().await.unwrap();

    assert!(dir.path().join(MANIFEST_FILE).exists());
    assert!(dir.path().join(CHUNKS_FILE).exists());
}

#[tokio::test]
async fn test_open_missing_directory_reports_manifest_not_found() {
    let dir = tempdir().unwrap();
    let err = ChunkStore::open(dir.path().join("no-store"), Arc::new(HashEmbedder::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::ManifestNotFound(_)));
}

#[tokio::test]
async fn test_open_rejects_mismatched_embedder_dimension() {
    let dir = tempdir().unwrap();
    seeded_store(dir.path()).await.persist().await.unwrap();

    let err = ChunkStore::open(dir.path(), Arc::new(HashEmbedder::new(128)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::DimensionMismatch {
            store: 384,
            embedder: 128
        }
    ));
}

#[tokio::test]
async fn test_open_rejects_corrupt_record_line() {
    let dir = tempdir().unwrap();
    seeded_store(dir.path()).await.persist().await.unwrap();

    // Corrupt the second record
    let chunks_path = dir.path().join(CHUNKS_FILE);
    let raw = std::fs::read_to_string(&chunks_path).unwrap();
    let mut lines: Vec<&str> = raw.lines().collect();
    lines[1] = "{ not json";
    std::fs::write(&chunks_path, lines.join("\n")).unwrap();

    let err = ChunkStore::open(dir.path(), Arc::new(HashEmbedder::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::RecordParseFailed { line: 2, .. }));
}

#[tokio::test]
async fn test_open_rejects_record_count_mismatch() {
    let dir = tempdir().unwrap();
    seeded_store(dir.path()).await.persist().await.unwrap();

    // Drop one record while the manifest still claims two
    let chunks_path = dir.path().join(CHUNKS_FILE);
    let raw = std::fs::read_to_string(&chunks_path).unwrap();
    let first_line = raw.lines().next().unwrap();
    std::fs::write(&chunks_path, format!("{first_line}\n")).unwrap();

    let err = ChunkStore::open(dir.path(), Arc::new(HashEmbedder::default()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::ChunkCountMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

#[tokio::test]
async fn test_add_texts_rejects_unbalanced_metadata() {
    let dir = tempdir().unwrap();
    let embedder = Arc::new(HashEmbedder::default());
    let mut store = ChunkStore::create(dir.path(), embedder, "documents")
        .await
        .unwrap();

    let err = store
        .add_texts(&["one".to_string(), "two".to_string()], &[json!({})])
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidInput(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_empty_store_persists_and_reopens() {
    let dir = tempdir().unwrap();
    let embedder = Arc::new(HashEmbedder::default());
    let store = ChunkStore::create(dir.path(), embedder, "empty").await.unwrap();
    store.persist().await.unwrap();

    let reopened = ChunkStore::open(dir.path(), Arc::new(HashEmbedder::default()))
        .await
        .unwrap();

    assert!(reopened.is_empty());
}
