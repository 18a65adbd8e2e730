// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime settings for the Q&A driver.
//!
//! All knobs come from the process environment (optionally seeded from a
//! `.env` file), mirroring how the ingest side of the pipeline is configured.

use std::env;
use std::path::{Path, PathBuf};

/// Fixed relative path the question is read from.
pub const QUESTION_FILE: &str = "../q.txt";

/// Fixed relative path the answer is written to.
pub const ANSWER_FILE: &str = "../a.txt";

/// Directory searched when `EMBEDDINGS_MODEL_NAME` is a bare model name.
const MODELS_DIR: &str = "./models";

const DEFAULT_MODEL_N_CTX: usize = 2048;
const DEFAULT_TARGET_SOURCE_CHUNKS: usize = 4;

/// Settings for a single question/answer run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Sentence-embedding model name or directory (`EMBEDDINGS_MODEL_NAME`).
    pub embeddings_model_name: String,

    /// Directory holding the persisted chunk store (`PERSIST_DIRECTORY`).
    pub persist_directory: PathBuf,

    /// Raw model family selector (`MODEL_TYPE`), matched verbatim later.
    pub model_type: String,

    /// Path to the GGUF model weights (`MODEL_PATH`).
    pub model_path: PathBuf,

    /// Model context window in tokens (`MODEL_N_CTX`).
    pub model_n_ctx: usize,

    /// Number of chunks retrieved per question (`TARGET_SOURCE_CHUNKS`).
    pub target_source_chunks: usize,

    /// Where the question is read from. Defaults to [`QUESTION_FILE`].
    pub question_file: PathBuf,

    /// Where the answer is written. Defaults to [`ANSWER_FILE`].
    pub answer_file: PathBuf,
}

impl Settings {
    /// Load settings from the environment, seeding it from `.env` if present.
    ///
    /// Unset string variables come back empty and fail later with a clear
    /// error from whichever component needed them. Malformed numeric values
    /// silently fall back to their defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            embeddings_model_name: env::var("EMBEDDINGS_MODEL_NAME").unwrap_or_default(),
            persist_directory: PathBuf::from(env::var("PERSIST_DIRECTORY").unwrap_or_default()),
            model_type: env::var("MODEL_TYPE").unwrap_or_default(),
            model_path: PathBuf::from(env::var("MODEL_PATH").unwrap_or_default()),
            model_n_ctx: env_usize("MODEL_N_CTX", DEFAULT_MODEL_N_CTX),
            target_source_chunks: env_usize("TARGET_SOURCE_CHUNKS", DEFAULT_TARGET_SOURCE_CHUNKS),
            question_file: PathBuf::from(QUESTION_FILE),
            answer_file: PathBuf::from(ANSWER_FILE),
        }
    }

    /// Resolve the embedding model directory.
    ///
    /// `EMBEDDINGS_MODEL_NAME` may be a directory path, which is used as-is,
    /// or a bare model name, which is looked up under [`MODELS_DIR`]. The
    /// directory must contain `model.onnx` and `tokenizer.json`.
    pub fn embeddings_model_dir(&self) -> PathBuf {
        let as_path = Path::new(&self.embeddings_model_name);
        if as_path.is_dir() {
            as_path.to_path_buf()
        } else {
            Path::new(MODELS_DIR).join(&self.embeddings_model_name)
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
