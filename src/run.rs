// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-shot question answering pipeline.
//!
//! One run reads the question file, assembles the retrieval chain and
//! model backend, asks the question once, and reports the answer with its
//! sources to the terminal and the answer file.
//!
//! The cheap gates come first: a missing question file, the literal
//! `exit` sentinel, or an unsupported `MODEL_TYPE` all end the run before
//! any model or store is touched.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::embeddings::{SentenceEmbedder, TextEmbedder};
use crate::inference::{unsupported_model_message, LlmBackend, ModelType};
use crate::rag::RetrievalQa;
use crate::store::ChunkStore;
use crate::utils::{append_text_file, read_text_file, remove_empty_lines, write_text_file};

/// Drives one question through retrieval, generation, and reporting.
pub struct AnswerPipeline {
    settings: Settings,
}

impl AnswerPipeline {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Run the whole pipeline once.
    ///
    /// Early gates return `Ok(())` without touching the answer file;
    /// failures past the gates are real errors and propagate.
    pub async fn execute(&self) -> Result<()> {
        let Some(question) = self.read_question().await else {
            return Ok(());
        };
        let Some(model_type) = self.select_model_type() else {
            return Ok(());
        };

        let embedder: Arc<dyn TextEmbedder> =
            Arc::new(SentenceEmbedder::load(self.settings.embeddings_model_dir()).await?);
        let store = ChunkStore::open(&self.settings.persist_directory, embedder).await?;
        let retriever = store.into_retriever(self.settings.target_source_chunks);

        let backend = LlmBackend::build(
            model_type,
            &self.settings.model_path,
            self.settings.model_n_ctx,
        )?;
        let chain = RetrievalQa::new(Box::new(backend), Box::new(retriever));

        self.answer_with(&chain, &question).await
    }

    /// Read the question, or `None` when there is nothing to answer:
    /// an unreadable question file or the literal `exit` sentinel.
    pub async fn read_question(&self) -> Option<String> {
        let question = read_text_file(&self.settings.question_file).await.ok()?;
        if question == "exit" {
            info!("Question file holds the exit sentinel; nothing to answer");
            return None;
        }
        Some(question)
    }

    /// Resolve `MODEL_TYPE`, reporting unsupported values on stdout.
    pub fn select_model_type(&self) -> Option<ModelType> {
        match ModelType::parse(&self.settings.model_type) {
            Some(model_type) => Some(model_type),
            None => {
                println!("{}", unsupported_model_message(&self.settings.model_type));
                None
            }
        }
    }

    /// Ask `question` through `chain` and report the result: echo to the
    /// terminal, write the answer file with its `SOURCES:` section, then
    /// strip blank lines from it.
    pub async fn answer_with(&self, chain: &RetrievalQa, question: &str) -> Result<()> {
        let output = chain.run(question).await?;

        println!("\n\n> Question:");
        println!("{question}");
        println!("\n> Answer:");
        println!("{}", output.answer);

        let answer_file = &self.settings.answer_file;
        write_text_file(answer_file, &output.answer).await;
        append_text_file(answer_file, "\nSOURCES:").await;

        for (i, document) in output.source_documents.iter().enumerate() {
            println!("\n> {}:", document.source());
            println!("{}", document.content);

            append_text_file(answer_file, &format!("\n\t-SOURCE {}\n", i + 1)).await;
            append_text_file(answer_file, &document.content).await;
        }

        remove_empty_lines(answer_file).await;
        Ok(())
    }
}
