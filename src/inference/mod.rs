// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod backend;
pub mod engine;

pub use backend::{unsupported_model_message, LlmBackend, ModelType, PromptFormat, GPT4ALL_BACKEND_ID};
pub use engine::{GenerationParams, GgufEngine, TokenCallback};
