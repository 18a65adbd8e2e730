// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GGUF model inference via llama.cpp.
//!
//! One engine wraps one loaded model. Completion is a plain blocking call:
//! the prompt is tokenized and decoded in a single batch, then tokens are
//! sampled one at a time until EOS or the token budget runs out.

use anyhow::{anyhow, Result};
use llama_cpp_2::{
    context::params::LlamaContextParams,
    llama_backend::LlamaBackend,
    llama_batch::LlamaBatch,
    model::{params::LlamaModelParams, AddBos, LlamaModel, Special},
    sampling::LlamaSampler,
};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sanitize prompt text for tokenization
///
/// Removes characters that break C string handling in llama.cpp: null
/// bytes and C0 control characters other than tab, newline and carriage
/// return. Retrieved chunks may carry such bytes when they were extracted
/// from PDFs or other binary sources.
fn sanitize_prompt(prompt: &str) -> String {
    prompt
        .chars()
        .filter(|c| *c != '\0' && (*c >= ' ' || *c == '\t' || *c == '\n' || *c == '\r'))
        .collect()
}

/// Callback invoked with each decoded token piece during generation
pub type TokenCallback = Box<dyn Fn(&str) + Send>;

/// Sampling and length settings for one completion
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    /// Maximum new tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling threshold
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.8,
            top_p: 0.95,
        }
    }
}

/// A loaded GGUF model with its llama.cpp backend
pub struct GgufEngine {
    backend: LlamaBackend,
    model: LlamaModel,
    model_path: PathBuf,
    context_size: usize,
    params: GenerationParams,
    token_callback: Option<TokenCallback>,
}

impl std::fmt::Debug for GgufEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GgufEngine")
            .field("model_path", &self.model_path)
            .field("context_size", &self.context_size)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl GgufEngine {
    /// Load GGUF weights from `model_path` with the given context window.
    pub fn load(model_path: impl AsRef<Path>, context_size: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Model file not found: {}", model_path.display());
        }
        if context_size == 0 {
            anyhow::bail!("Context size must be positive");
        }

        let backend = LlamaBackend::init()
            .map_err(|e| anyhow!("Failed to initialize llama backend: {:?}", e))?;

        let model_params = LlamaModelParams::default();
        let model = LlamaModel::load_from_file(&backend, model_path, &model_params)
            .map_err(|e| anyhow!("Failed to load model {}: {:?}", model_path.display(), e))?;

        info!(
            "Loaded GGUF model {} (context size {})",
            model_path.display(),
            context_size
        );

        Ok(Self {
            backend,
            model,
            model_path: model_path.to_path_buf(),
            context_size,
            params: GenerationParams::default(),
            token_callback: None,
        })
    }

    /// Replace the default generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Install a callback observing each decoded token piece, e.g. for
    /// streaming output. No callback is installed by default.
    pub fn with_token_callback(mut self, callback: TokenCallback) -> Self {
        self.token_callback = Some(callback);
        self
    }

    /// Context window the engine was loaded with
    pub fn context_size(&self) -> usize {
        self.context_size
    }

    /// Run one completion to its end and return the generated text.
    pub fn complete(&self, prompt: &str) -> Result<String> {
        let sanitized = sanitize_prompt(prompt);
        if sanitized.len() != prompt.len() {
            warn!(
                "Removed {} problematic bytes from prompt before tokenization",
                prompt.len() - sanitized.len()
            );
        }

        let tokens = self
            .model
            .str_to_token(&sanitized, AddBos::Always)
            .map_err(|e| anyhow!("Failed to tokenize prompt: {:?}", e))?;

        if tokens.len() >= self.context_size {
            anyhow::bail!(
                "Prompt is {} tokens but the context window is {}",
                tokens.len(),
                self.context_size
            );
        }

        let eos_token = self.model.token_eos();

        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(self.context_size as u32))
            .with_n_batch(self.context_size as u32);

        let mut context = self
            .model
            .new_context(&self.backend, ctx_params)
            .map_err(|e| anyhow!("Failed to create context: {:?}", e))?;

        // Batch sized to the context window so the whole prompt decodes at once
        let mut batch = LlamaBatch::new(self.context_size, 1);
        for (i, &token) in tokens.iter().enumerate() {
            let is_last = i == tokens.len() - 1;
            batch
                .add(token, i as i32, &[0], is_last)
                .map_err(|e| anyhow!("Failed to add token to batch: {:?}", e))?;
        }
        context
            .decode(&mut batch)
            .map_err(|e| anyhow!("Decode failed: {:?}", e))?;

        debug!(
            "Starting generation: prompt_tokens={}, max_tokens={}, context_size={}",
            tokens.len(),
            self.params.max_tokens,
            self.context_size
        );

        let mut output = String::new();
        let mut n_cur = tokens.len();
        let limit = (tokens.len() + self.params.max_tokens).min(self.context_size);
        let mut stop_reason = "token_limit";

        while n_cur < limit {
            let mut sampler = LlamaSampler::chain_simple([
                LlamaSampler::temp(self.params.temperature),
                LlamaSampler::top_p(self.params.top_p, 1),
                LlamaSampler::greedy(),
            ]);

            let new_token = sampler.sample(&context, -1);

            if new_token == eos_token {
                stop_reason = "eos";
                break;
            }

            match self.model.token_to_str(new_token, Special::Plaintext) {
                Ok(piece) => {
                    if let Some(callback) = &self.token_callback {
                        callback(&piece);
                    }
                    output.push_str(&piece);
                }
                // Invalid UTF-8: skip the text but still advance the model state
                Err(_) => warn!("Skipping token {} with invalid UTF-8", new_token),
            }

            batch.clear();
            batch
                .add(new_token, n_cur as i32, &[0], true)
                .map_err(|e| anyhow!("Failed to add token: {:?}", e))?;
            context
                .decode(&mut batch)
                .map_err(|e| anyhow!("Decode failed: {:?}", e))?;

            n_cur += 1;
        }

        debug!(
            "Generation finished: {} new tokens, stop_reason={}",
            n_cur - tokens.len(),
            stop_reason
        );

        Ok(output)
    }
}
