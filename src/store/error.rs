// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for chunk store loading and search
//!
//! Covers everything that can go wrong between a persist directory on disk
//! and a searchable index in memory: missing or corrupt files, records that
//! disagree with the manifest, and embeddings unfit for cosine search.

use thiserror::Error;

/// Errors from opening, mutating, or searching a chunk store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Manifest file not found in the persist directory
    #[error("Store manifest not found at: {0}")]
    ManifestNotFound(String),

    /// Manifest exists but is not valid JSON for this format
    #[error("Failed to parse manifest {path}: {source}")]
    ManifestParseFailed {
        path: String,
        source: serde_json::Error,
    },

    /// A chunk record line could not be parsed
    #[error("Malformed chunk record at line {line}: {source}")]
    RecordParseFailed {
        line: usize,
        source: serde_json::Error,
    },

    /// Embedder and store disagree on vector dimension
    #[error("Store holds {store}D embeddings but embedder produces {embedder}D")]
    DimensionMismatch { store: usize, embedder: usize },

    /// A stored or freshly produced embedding has the wrong dimension
    #[error("Chunk {id} has {actual}D embedding, expected {expected}D")]
    RecordDimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// An embedding contains NaN or infinite components
    #[error("Chunk {id} embedding contains NaN or Infinity values")]
    NonFiniteEmbedding { id: String },

    /// Number of chunk records on disk disagrees with the manifest
    #[error("Chunk count mismatch: manifest says {expected}, found {actual}")]
    ChunkCountMismatch { expected: usize, actual: usize },

    /// Caller passed inconsistent arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The embedding backend failed
    #[error("Embedding failed: {source}")]
    EmbeddingFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Similarity index could not be built from the stored vectors
    #[error("Failed to build index: {0}")]
    IndexBuildFailed(String),

    /// Store state could not be serialized for persisting
    #[error("Failed to encode store files: {0}")]
    EncodeFailed(serde_json::Error),

    /// Underlying filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
