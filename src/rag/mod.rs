// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval-augmented question answering.
//!
//! The chain in [`chain`] is generic over two seams: [`DocumentRetriever`]
//! supplies context chunks and [`TextGenerator`] completes the rendered
//! prompt. Production wires these to the chunk store and a GGUF model;
//! tests substitute fakes.

use anyhow::Result;
use async_trait::async_trait;

use crate::store::SourceDocument;

pub mod chain;

pub use chain::{QaOutput, RetrievalQa};

/// Supplies context chunks relevant to a query.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<SourceDocument>>;
}

/// Produces a completion for a fully rendered prompt.
///
/// Generation is blocking CPU work; callers run it to completion within
/// their own task.
pub trait TextGenerator: Send {
    fn generate(&self, prompt: &str) -> Result<String>;
}
