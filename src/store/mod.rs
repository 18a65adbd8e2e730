// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod chunk_store;
pub mod error;
pub mod index;
pub mod manifest;

pub use chunk_store::{ChunkStore, SourceDocument, StoreRetriever};
pub use error::StoreError;
pub use index::{IndexHit, SimilarityIndex};
pub use manifest::{ChunkRecord, StoreManifest, CHUNKS_FILE, MANIFEST_FILE};
