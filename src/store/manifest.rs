// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! On-disk format of a persisted chunk store.
//!
//! A persist directory holds two files: `manifest.json` describing the
//! collection, and `chunks.jsonl` with one [`ChunkRecord`] per line. The
//! manifest is the source of truth for dimension and record count; loading
//! rejects any file that disagrees with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StoreError;

/// Manifest file name inside the persist directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Chunk record file name inside the persist directory
pub const CHUNKS_FILE: &str = "chunks.jsonl";

/// Current store format version
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Collection-level metadata for a persisted chunk store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreManifest {
    /// Format version, bumped on incompatible layout changes
    pub version: u32,

    /// Collection name
    pub collection: String,

    /// Embedding dimension of every chunk in the store
    pub dimension: usize,

    /// Number of records expected in the chunks file
    pub chunk_count: usize,

    /// When the store was first created
    pub created_at: DateTime<Utc>,

    /// When the store was last persisted
    pub updated_at: DateTime<Utc>,
}

impl StoreManifest {
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        let now = Utc::now();
        Self {
            version: STORE_FORMAT_VERSION,
            collection: collection.into(),
            dimension,
            chunk_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One embedded document chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable unique id
    pub id: String,

    /// Chunk text
    pub content: String,

    /// Arbitrary metadata; retrieval surfaces the `source` key in citations
    pub metadata: serde_json::Value,

    /// Embedding of `content`
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    pub fn new(content: impl Into<String>, metadata: serde_json::Value, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            metadata,
            embedding,
        }
    }

    /// Check the embedding against the store dimension and reject
    /// non-finite components, which would poison cosine distances.
    pub fn validate(&self, dimension: usize) -> Result<(), StoreError> {
        if self.embedding.len() != dimension {
            return Err(StoreError::RecordDimensionMismatch {
                id: self.id.clone(),
                expected: dimension,
                actual: self.embedding.len(),
            });
        }
        if self.embedding.iter().any(|v| !v.is_finite()) {
            return Err(StoreError::NonFiniteEmbedding {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}
