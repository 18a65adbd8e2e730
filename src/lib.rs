// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local document question answering.
//!
//! Answers a single question over a persisted vector store of document
//! chunks: the question is embedded, the closest chunks are retrieved,
//! and a locally hosted GGUF model generates the answer, which is written
//! out together with its sources.

pub mod config;
pub mod embeddings;
pub mod inference;
pub mod rag;
pub mod run;
pub mod store;
pub mod utils;
pub mod version;

pub use config::Settings;
pub use embeddings::{HashEmbedder, SentenceEmbedder, TextEmbedder};
pub use inference::{GenerationParams, GgufEngine, LlmBackend, ModelType};
pub use rag::{DocumentRetriever, QaOutput, RetrievalQa, TextGenerator};
pub use run::AnswerPipeline;
pub use store::{ChunkStore, SourceDocument, StoreError, StoreRetriever};
