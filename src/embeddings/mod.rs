// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text embedding backends.
//!
//! [`SentenceEmbedder`] runs a sentence-transformer ONNX model and is what
//! production runs use. [`HashEmbedder`] is a cheap deterministic stand-in
//! for tests and smoke runs where no model weights are available.

use anyhow::Result;
use async_trait::async_trait;

pub mod hashed;
pub mod onnx;

pub use hashed::HashEmbedder;
pub use onnx::SentenceEmbedder;

/// Maps text to fixed-dimension vectors for similarity search.
///
/// All vectors produced by one embedder must have the same dimension, and
/// that dimension must match the store the vectors are compared against.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Backends with a native batch path override this.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Output dimension of every vector this embedder produces.
    fn dimension(&self) -> usize;
}
