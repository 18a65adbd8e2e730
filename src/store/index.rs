// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Approximate nearest neighbor search over stored chunk embeddings.
//!
//! Hierarchical Navigable Small World (HNSW) index using cosine distance.
//! Vectors are normalized on insert and query so the reported score is the
//! cosine similarity. Hits refer back to chunk records by their position in
//! the order the index was built from.

use hnsw_rs::hnsw::{Hnsw, Neighbour};
use hnsw_rs::prelude::*;

use super::error::StoreError;

/// One search hit, referring to a chunk by build position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
    /// Position of the chunk in the build order
    pub position: usize,

    /// Cosine similarity of chunk and query (higher is closer)
    pub score: f32,
}

/// In-memory HNSW index over chunk embeddings
pub struct SimilarityIndex {
    hnsw: Hnsw<'static, f32, DistCosine>,
    dimension: usize,
    len: usize,
}

impl SimilarityIndex {
    /// Build an index over `vectors`, all of dimension `dimension`.
    ///
    /// Hit positions returned by [`search`](Self::search) are indices into
    /// `vectors`.
    pub fn build(vectors: &[Vec<f32>], dimension: usize) -> Result<Self, StoreError> {
        if vectors.is_empty() {
            // Parameters are irrelevant; an empty index is never searched
            let hnsw: Hnsw<f32, DistCosine> = Hnsw::new(16, 4, 16, 200, DistCosine);
            return Ok(Self {
                hnsw,
                dimension,
                len: 0,
            });
        }

        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(StoreError::IndexBuildFailed(format!(
                    "vector {} has wrong dimensions: expected {}, got {}",
                    i,
                    dimension,
                    vector.len()
                )));
            }
            if vector.iter().any(|&v| !v.is_finite()) {
                return Err(StoreError::IndexBuildFailed(format!(
                    "vector {} contains NaN or Infinity values",
                    i
                )));
            }
        }

        // M and ef_construction tuned for fast builds on embedding-sized
        // vectors; layer count scales with log2 of the dataset
        let max_nb_connection = 12;
        let ef_construction = 48;
        let nb_layer = if vectors.len() > 1 {
            ((vectors.len() as f32).log2().ceil() as usize).clamp(4, 16)
        } else {
            4
        };

        let mut hnsw: Hnsw<f32, DistCosine> = Hnsw::new(
            max_nb_connection,
            nb_layer,
            ef_construction,
            vectors.len(),
            DistCosine,
        );

        for (position, vector) in vectors.iter().enumerate() {
            // Normalize for cosine similarity
            let normalized = normalize_vector(vector);
            hnsw.insert((&normalized, position));
        }

        hnsw.set_searching_mode(true);

        Ok(Self {
            hnsw,
            dimension,
            len: vectors.len(),
        })
    }

    /// Return up to `k` nearest chunks, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>, StoreError> {
        if query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                store: self.dimension,
                embedder: query.len(),
            });
        }
        if query.iter().any(|&v| !v.is_finite()) {
            return Err(StoreError::InvalidInput(
                "query embedding contains NaN or Infinity values".to_string(),
            ));
        }

        let k = k.min(self.len);
        if k == 0 {
            return Ok(vec![]);
        }

        let normalized_query = normalize_vector(query);

        // ef_search should be comfortably above k for good recall
        let ef_search = (k * 2).max(50);
        let neighbours: Vec<Neighbour> = self.hnsw.search(&normalized_query, k, ef_search);

        let mut hits: Vec<IndexHit> = neighbours
            .into_iter()
            .map(|neighbour| IndexHit {
                position: neighbour.d_id,
                // HNSW returns cosine distance; similarity = 1 - distance
                score: 1.0 - neighbour.distance,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);

        Ok(hits)
    }

    /// Number of vectors in the index
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Dimension the index was built for
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Normalize a vector to unit length so cosine distance behaves.
/// Zero and non-finite magnitudes leave the vector as-is.
fn normalize_vector(vector: &[f32]) -> Vec<f32> {
    let magnitude: f32 = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();

    if magnitude == 0.0 || !magnitude.is_finite() {
        return vector.to_vec();
    }

    vector.iter().map(|&x| x / magnitude).collect()
}
