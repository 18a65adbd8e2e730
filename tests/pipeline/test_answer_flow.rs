// End-to-end answer flow: seeded store, canned generator, answer file layout

use anyhow::Result;
use docqa::config::Settings;
use docqa::embeddings::{HashEmbedder, TextEmbedder};
use docqa::rag::{RetrievalQa, TextGenerator};
use docqa::run::AnswerPipeline;
use docqa::store::{ChunkStore, StoreRetriever};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct CannedGenerator {
    answer: String,
}

impl TextGenerator for CannedGenerator {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.answer.clone())
    }
}

/// Build, persist, and reopen a two-chunk store, the way a real run sees it.
async fn seeded_retriever(dir: &TempDir, top_k: usize) -> StoreRetriever {
    let embedder: Arc<dyn TextEmbedder> = Arc::new(HashEmbedder::default());
    let db = dir.path().join("db");

    let mut store = ChunkStore::create(&db, embedder.clone(), "docs").await.unwrap();
    store
        .add_texts(
            &["The sky is blue.".to_string(), "Grass is green.".to_string()],
            &[json!({"source": "sky.txt"}), json!({"source": "grass.txt"})],
        )
        .await
        .unwrap();
    store.persist().await.unwrap();

    let store = ChunkStore::open(&db, embedder).await.unwrap();
    store.into_retriever(top_k)
}

fn settings_in(dir: &TempDir) -> Settings {
    Settings {
        embeddings_model_name: String::new(),
        persist_directory: dir.path().join("db"),
        model_type: "LlamaCpp".to_string(),
        model_path: dir.path().join("model.gguf"),
        model_n_ctx: 2048,
        target_source_chunks: 1,
        question_file: dir.path().join("q.txt"),
        answer_file: dir.path().join("a.txt"),
    }
}

fn chain_with(answer: &str, retriever: StoreRetriever) -> RetrievalQa {
    RetrievalQa::new(
        Box::new(CannedGenerator {
            answer: answer.to_string(),
        }),
        Box::new(retriever),
    )
}

#[tokio::test]
async fn test_answer_file_holds_answer_and_cited_source() {
    let dir = TempDir::new().unwrap();
    let retriever = seeded_retriever(&dir, 1).await;
    let chain = chain_with("The sky is blue.", retriever);
    let settings = settings_in(&dir);
    let answer_file = settings.answer_file.clone();

    AnswerPipeline::new(settings)
        .answer_with(&chain, "What color is the sky?")
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(answer_file).unwrap(),
        "The sky is blue.\nSOURCES:\n\t-SOURCE 1\nThe sky is blue."
    );
}

#[tokio::test]
async fn test_sources_are_numbered_in_retrieval_order() {
    let dir = TempDir::new().unwrap();
    let retriever = seeded_retriever(&dir, 2).await;
    let chain = chain_with("Blue.", retriever);
    let settings = settings_in(&dir);
    let answer_file = settings.answer_file.clone();

    AnswerPipeline::new(settings)
        .answer_with(&chain, "What color is the sky?")
        .await
        .unwrap();

    // The sky chunk matches the question better, so it is SOURCE 1.
    let contents = fs::read_to_string(answer_file).unwrap();
    assert_eq!(
        contents,
        "Blue.\nSOURCES:\n\t-SOURCE 1\nThe sky is blue.\n\t-SOURCE 2\nGrass is green."
    );
}

#[tokio::test]
async fn test_blank_lines_are_stripped_from_answer_file() {
    let dir = TempDir::new().unwrap();
    let retriever = seeded_retriever(&dir, 1).await;
    let chain = chain_with("The sky is blue.\n\nIt scatters light.", retriever);
    let settings = settings_in(&dir);
    let answer_file = settings.answer_file.clone();

    AnswerPipeline::new(settings)
        .answer_with(&chain, "What color is the sky?")
        .await
        .unwrap();

    let contents = fs::read_to_string(answer_file).unwrap();
    assert_eq!(
        contents,
        "The sky is blue.\nIt scatters light.\nSOURCES:\n\t-SOURCE 1\nThe sky is blue."
    );
    assert!(contents.lines().all(|line| !line.trim().is_empty()));
}
