// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persisted chunk store with similarity search.
//!
//! The store pairs an embedder with the records in a persist directory and
//! an in-memory HNSW index over their embeddings. Everything is loaded and
//! validated up front; queries embed the question text and return the
//! closest chunks as documents with their metadata.

use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::embeddings::TextEmbedder;
use crate::rag::DocumentRetriever;

use super::error::StoreError;
use super::index::SimilarityIndex;
use super::manifest::{ChunkRecord, StoreManifest, CHUNKS_FILE, MANIFEST_FILE};

/// A retrieved chunk, ready for prompting and citation
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Chunk text
    pub content: String,

    /// Chunk metadata as stored
    pub metadata: Value,
}

impl SourceDocument {
    /// The `source` metadata entry, used when citing this chunk.
    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }
}

/// Chunk store bound to an embedder.
///
/// The embedder's dimension must match the store's; [`open`](Self::open)
/// rejects the pairing otherwise, before any query runs.
pub struct ChunkStore {
    directory: PathBuf,
    manifest: StoreManifest,
    records: Vec<ChunkRecord>,
    index: SimilarityIndex,
    embedder: Arc<dyn TextEmbedder>,
}

impl ChunkStore {
    /// Create a new, empty store rooted at `directory`.
    ///
    /// Nothing is written until [`persist`](Self::persist) is called.
    pub async fn create(
        directory: impl Into<PathBuf>,
        embedder: Arc<dyn TextEmbedder>,
        collection: &str,
    ) -> Result<Self, StoreError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;

        let manifest = StoreManifest::new(collection, embedder.dimension());
        let index = SimilarityIndex::build(&[], manifest.dimension)?;

        Ok(Self {
            directory,
            manifest,
            records: Vec::new(),
            index,
            embedder,
        })
    }

    /// Open a persisted store and build its search index.
    ///
    /// Every record is validated against the manifest before indexing, so
    /// a store that opens successfully is fully searchable.
    pub async fn open(
        directory: impl Into<PathBuf>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self, StoreError> {
        let directory = directory.into();

        let manifest_path = directory.join(MANIFEST_FILE);
        let manifest_raw = match tokio::fs::read_to_string(&manifest_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::ManifestNotFound(
                    manifest_path.display().to_string(),
                ))
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        let manifest: StoreManifest =
            serde_json::from_str(&manifest_raw).map_err(|source| StoreError::ManifestParseFailed {
                path: manifest_path.display().to_string(),
                source,
            })?;

        if embedder.dimension() != manifest.dimension {
            return Err(StoreError::DimensionMismatch {
                store: manifest.dimension,
                embedder: embedder.dimension(),
            });
        }

        let chunks_path = directory.join(CHUNKS_FILE);
        let mut records = Vec::with_capacity(manifest.chunk_count);
        match tokio::fs::read_to_string(&chunks_path).await {
            Ok(raw) => {
                for (line_idx, line) in raw.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let record: ChunkRecord = serde_json::from_str(line).map_err(|source| {
                        StoreError::RecordParseFailed {
                            line: line_idx + 1,
                            source,
                        }
                    })?;
                    record.validate(manifest.dimension)?;
                    records.push(record);
                }
            }
            // A store persisted before any chunks were added has no chunks file
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }

        if records.len() != manifest.chunk_count {
            return Err(StoreError::ChunkCountMismatch {
                expected: manifest.chunk_count,
                actual: records.len(),
            });
        }

        let index = build_index(&records, manifest.dimension)?;

        info!(
            "Opened chunk store '{}' with {} chunks ({}D) from {}",
            manifest.collection,
            records.len(),
            manifest.dimension,
            directory.display()
        );

        Ok(Self {
            directory,
            manifest,
            records,
            index,
            embedder,
        })
    }

    /// Embed and add texts with their metadata, rebuilding the index.
    ///
    /// `texts` and `metadatas` must have equal length. Nothing is added if
    /// any embedding fails validation.
    pub async fn add_texts(
        &mut self,
        texts: &[String],
        metadatas: &[Value],
    ) -> Result<(), StoreError> {
        if texts.len() != metadatas.len() {
            return Err(StoreError::InvalidInput(format!(
                "got {} texts but {} metadata entries",
                texts.len(),
                metadatas.len()
            )));
        }
        if texts.is_empty() {
            return Ok(());
        }

        let embeddings = self
            .embedder
            .embed_many(texts)
            .await
            .map_err(|e| StoreError::EmbeddingFailed { source: e.into() })?;

        let mut new_records = Vec::with_capacity(texts.len());
        for ((text, metadata), embedding) in texts.iter().zip(metadatas.iter()).zip(embeddings) {
            let record = ChunkRecord::new(text.clone(), metadata.clone(), embedding);
            record.validate(self.manifest.dimension)?;
            new_records.push(record);
        }

        self.records.append(&mut new_records);
        self.manifest.chunk_count = self.records.len();
        self.manifest.updated_at = chrono::Utc::now();
        self.index = build_index(&self.records, self.manifest.dimension)?;

        Ok(())
    }

    /// Write manifest and chunk records to the persist directory.
    pub async fn persist(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let manifest_json =
            serde_json::to_string_pretty(&self.manifest).map_err(StoreError::EncodeFailed)?;
        tokio::fs::write(self.directory.join(MANIFEST_FILE), manifest_json).await?;

        let mut lines = String::new();
        for record in &self.records {
            lines.push_str(&serde_json::to_string(record).map_err(StoreError::EncodeFailed)?);
            lines.push('\n');
        }
        tokio::fs::write(self.directory.join(CHUNKS_FILE), lines).await?;

        debug!(
            "Persisted {} chunks to {}",
            self.records.len(),
            self.directory.display()
        );
        Ok(())
    }

    /// Embed `query` and return the `k` most similar chunks with their
    /// cosine scores, best first. `k` is clamped to the store size.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(SourceDocument, f32)>, StoreError> {
        if self.records.is_empty() {
            return Ok(vec![]);
        }

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| StoreError::EmbeddingFailed { source: e.into() })?;

        let hits = self.index.search(&query_embedding, k)?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                self.records.get(hit.position).map(|record| {
                    (
                        SourceDocument {
                            content: record.content.clone(),
                            metadata: record.metadata.clone(),
                        },
                        hit.score,
                    )
                })
            })
            .collect())
    }

    /// Turn the store into a retriever returning `top_k` chunks per query.
    pub fn into_retriever(self, top_k: usize) -> StoreRetriever {
        StoreRetriever {
            store: self,
            top_k,
        }
    }

    /// Number of chunks in the store
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding dimension of the store
    pub fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    /// Collection name from the manifest
    pub fn collection(&self) -> &str {
        &self.manifest.collection
    }
}

fn build_index(records: &[ChunkRecord], dimension: usize) -> Result<SimilarityIndex, StoreError> {
    let vectors: Vec<Vec<f32>> = records.iter().map(|r| r.embedding.clone()).collect();
    SimilarityIndex::build(&vectors, dimension)
}

/// Retriever over a chunk store with a fixed result count
pub struct StoreRetriever {
    store: ChunkStore,
    top_k: usize,
}

impl StoreRetriever {
    /// Chunks returned per query
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }
}

#[async_trait::async_trait]
impl DocumentRetriever for StoreRetriever {
    async fn retrieve(&self, query: &str) -> anyhow::Result<Vec<SourceDocument>> {
        let results = self.store.similarity_search(query, self.top_k).await?;
        Ok(results.into_iter().map(|(doc, _score)| doc).collect())
    }
}
