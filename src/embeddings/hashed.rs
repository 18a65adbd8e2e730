// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic feature-hashing embedder.
//!
//! Stands in for a real sentence transformer when no model weights are
//! available. Each lowercased whitespace token is hashed into one of
//! `dimension` signed buckets, so texts sharing tokens get correlated
//! vectors and cosine ranking behaves sensibly on small corpora. No
//! semantic power beyond token overlap.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::TextEmbedder;

const DEFAULT_DIMENSION: usize = 384;

/// Hash-based bag-of-tokens embedder.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text.to_lowercase().split_whitespace() {
            let token: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
            if token.is_empty() {
                continue;
            }

            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;

            // Signed buckets keep unrelated collisions from always adding up
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl TextEmbedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for val in vector.iter_mut() {
            *val /= norm;
        }
    }
}
