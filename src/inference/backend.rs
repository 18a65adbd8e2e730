// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model family selection and prompt formats.
//!
//! The model family is chosen by the `MODEL_TYPE` setting, matched
//! verbatim: `LlamaCpp` or `GPT4All`. Anything else is unsupported and
//! must be reported before any model loading starts. Both families run on
//! the same GGUF engine; they differ only in how the prompt is wrapped.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::rag::TextGenerator;

use super::engine::{GenerationParams, GgufEngine, TokenCallback};

/// Fixed inference sub-backend for the GPT4All family
pub const GPT4ALL_BACKEND_ID: &str = "gptj";

/// Supported model families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    LlamaCpp,
    Gpt4All,
}

impl ModelType {
    /// Match the raw `MODEL_TYPE` value. Exact match only: any deviation
    /// in spelling or case is unsupported, not coerced.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "LlamaCpp" => Some(Self::LlamaCpp),
            "GPT4All" => Some(Self::Gpt4All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LlamaCpp => "LlamaCpp",
            Self::Gpt4All => "GPT4All",
        }
    }
}

/// Diagnostic reported on stdout when `MODEL_TYPE` names no supported
/// family. The raw value is echoed verbatim, empty string included.
pub fn unsupported_model_message(raw: &str) -> String {
    format!("Model {raw} not supported!")
}

/// How a prompt is wrapped before reaching the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptFormat {
    /// Prompt passed through unchanged
    Plain,

    /// GPT4All-J instruction format
    Gpt4AllJ,
}

impl PromptFormat {
    /// Format used by a given sub-backend identifier.
    pub fn for_backend_id(id: &str) -> Self {
        match id {
            "gptj" => Self::Gpt4AllJ,
            _ => Self::Plain,
        }
    }

    /// Wrap a prompt in this format.
    pub fn render(&self, prompt: &str) -> String {
        match self {
            Self::Plain => prompt.to_string(),
            Self::Gpt4AllJ => format!("### Prompt:\n{prompt}\n### Response:\n"),
        }
    }
}

/// A GGUF engine dressed as one of the supported model families
pub struct LlmBackend {
    engine: GgufEngine,
    format: PromptFormat,
}

impl LlmBackend {
    /// Build the backend for an already validated model type.
    pub fn build(
        model_type: ModelType,
        model_path: impl AsRef<Path>,
        context_size: usize,
    ) -> Result<Self> {
        match model_type {
            ModelType::LlamaCpp => Self::llama_cpp(model_path, context_size),
            ModelType::Gpt4All => Self::gpt4all(model_path, context_size),
        }
    }

    /// LlamaCpp family: prompts reach the model unwrapped.
    pub fn llama_cpp(model_path: impl AsRef<Path>, context_size: usize) -> Result<Self> {
        let engine = GgufEngine::load(model_path, context_size)?;
        info!("Using LlamaCpp backend");
        Ok(Self {
            engine,
            format: PromptFormat::Plain,
        })
    }

    /// GPT4All family, pinned to the `gptj` sub-backend and its
    /// instruction format.
    pub fn gpt4all(model_path: impl AsRef<Path>, context_size: usize) -> Result<Self> {
        let engine = GgufEngine::load(model_path, context_size)?;
        info!("Using GPT4All backend (sub-backend {})", GPT4ALL_BACKEND_ID);
        Ok(Self {
            engine,
            format: PromptFormat::for_backend_id(GPT4ALL_BACKEND_ID),
        })
    }

    /// Replace the engine's generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.engine = self.engine.with_params(params);
        self
    }

    /// Install a per-token callback on the engine, e.g. for streaming
    /// tokens to the terminal as they decode.
    pub fn with_token_callback(mut self, callback: TokenCallback) -> Self {
        self.engine = self.engine.with_token_callback(callback);
        self
    }
}

impl TextGenerator for LlmBackend {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.engine.complete(&self.format.render(prompt))
    }
}
