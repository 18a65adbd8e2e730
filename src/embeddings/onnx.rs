// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX sentence-transformer embeddings.
//!
//! Wraps ONNX Runtime to run a sentence transformer (e.g. all-MiniLM-L6-v2)
//! exported as `model.onnx` with its `tokenizer.json` beside it. The model
//! outputs token-level embeddings; sentence vectors are produced by
//! attention-mask-weighted mean pooling followed by L2 normalization, so
//! they can be compared with cosine similarity directly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayViewD, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Encoding, Tokenizer};
use tracing::info;

use super::TextEmbedder;

/// File the ONNX graph is loaded from, relative to the model directory.
const MODEL_FILE: &str = "model.onnx";

/// File the tokenizer is loaded from, relative to the model directory.
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Sentence embedding model backed by ONNX Runtime.
///
/// The output dimension is discovered from the model itself during loading,
/// so any sentence transformer with a `[batch, seq_len, hidden]` output
/// works without configuration.
#[derive(Clone)]
pub struct SentenceEmbedder {
    /// ONNX Runtime session, locked per inference call
    session: Arc<Mutex<Session>>,

    /// Tokenizer matching the model
    tokenizer: Arc<Tokenizer>,

    /// Model directory name, for logging
    model_name: String,

    /// Hidden dimension reported by the model
    dimension: usize,
}

impl std::fmt::Debug for SentenceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEmbedder")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl SentenceEmbedder {
    /// Load a sentence transformer from a directory containing
    /// `model.onnx` and `tokenizer.json`.
    ///
    /// Runs one probe inference to discover the hidden dimension and to
    /// fail fast on a graph with an unexpected output layout.
    pub async fn load(model_dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        let mut session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(&model_path)
            .context(format!(
                "Failed to load ONNX model from {}",
                model_path.display()
            ))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // Probe inference: discover the hidden dimension and reject models
        // whose output is not [batch, seq_len, hidden].
        // Wrap in a block so outputs are dropped before moving the session.
        let dimension = {
            let encoding = tokenizer
                .encode("dimension probe", true)
                .map_err(|e| anyhow::anyhow!("Tokenizer probe failed: {}", e))?;
            let (input_ids, attention_mask, token_type_ids, _) =
                encoding_tensors(std::slice::from_ref(&encoding))?;

            let outputs = session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?,
                "token_type_ids" => Value::from_array(token_type_ids)?
            ])?;

            // Index [0] rather than a name; output names vary across exports
            let output_tensor = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract probe output tensor")?;
            let shape = output_tensor.shape();

            if shape.len() != 3 {
                anyhow::bail!(
                    "Model outputs unexpected shape {:?} (expected [batch, seq_len, hidden])",
                    shape
                );
            }
            shape[2]
        };

        let model_name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_dir.display().to_string());

        info!(
            "Loaded embedding model {} ({}D) from {}",
            model_name,
            dimension,
            model_dir.display()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension,
        })
    }
}

#[async_trait]
impl TextEmbedder for SentenceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let embeddings = self.embed_many(&texts).await?;
        embeddings
            .into_iter()
            .next()
            .context("Embedding produced no output")
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings: Vec<Encoding> = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let (input_ids, attention_mask, token_type_ids, mask_rows) =
            encoding_tensors(&encodings)?;

        // Lock the session for the duration of the inference call
        let mut session_guard = self.session.lock().unwrap();
        let outputs = session_guard.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids)?,
            "attention_mask" => Value::from_array(attention_mask)?,
            "token_type_ids" => Value::from_array(token_type_ids)?
        ])?;

        // Index [0] rather than a name; output names vary across exports
        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for (batch_idx, mask) in mask_rows.iter().enumerate() {
            let token_embeddings = output_array.index_axis(Axis(0), batch_idx);
            let mut pooled = mean_pool(token_embeddings, mask);
            l2_normalize(&mut pooled);

            if pooled.len() != self.dimension {
                anyhow::bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    batch_idx,
                    pooled.len(),
                    self.dimension
                );
            }
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Build the three model input tensors from a batch of encodings,
/// padding every sequence to the longest in the batch.
///
/// Also returns each row's attention mask for pooling after inference.
#[allow(clippy::type_complexity)]
fn encoding_tensors(
    encodings: &[Encoding],
) -> Result<(Array2<i64>, Array2<i64>, Array2<i64>, Vec<Vec<i64>>)> {
    let batch = encodings.len();
    let max_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = Vec::with_capacity(batch * max_len);
    let mut attention_mask = Vec::with_capacity(batch * max_len);
    let mut mask_rows = Vec::with_capacity(batch);

    for encoding in encodings {
        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();
        let padding = max_len - ids.len();

        input_ids.extend(ids.iter().map(|&id| id as i64));
        input_ids.extend(std::iter::repeat(0i64).take(padding));

        let mut row: Vec<i64> = mask.iter().map(|&m| m as i64).collect();
        row.extend(std::iter::repeat(0i64).take(padding));
        attention_mask.extend_from_slice(&row);
        mask_rows.push(row);
    }

    // All zeros: single-segment input
    let token_type_ids = vec![0i64; batch * max_len];

    let input_ids = Array2::from_shape_vec((batch, max_len), input_ids)
        .context("Failed to create input_ids array")?;
    let attention_mask = Array2::from_shape_vec((batch, max_len), attention_mask)
        .context("Failed to create attention_mask array")?;
    let token_type_ids = Array2::from_shape_vec((batch, max_len), token_type_ids)
        .context("Failed to create token_type_ids array")?;

    Ok((input_ids, attention_mask, token_type_ids, mask_rows))
}

/// Mean pooling over the sequence dimension, weighted by the attention mask
/// so padding tokens contribute nothing.
fn mean_pool(token_embeddings: ArrayViewD<'_, f32>, attention_mask: &[i64]) -> Vec<f32> {
    let seq_len = token_embeddings.shape()[0];
    let hidden_dim = token_embeddings.shape()[1];

    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for i in 0..seq_len {
        let mask_value = attention_mask[i] as f32;
        sum_mask += mask_value;
        for j in 0..hidden_dim {
            pooled[j] += token_embeddings[[i, j]] * mask_value;
        }
    }

    for val in &mut pooled {
        *val /= sum_mask.max(1e-9);
    }

    pooled
}

/// Scale a vector to unit length. Zero vectors are left unchanged.
fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for val in vector.iter_mut() {
            *val /= norm;
        }
    }
}
