// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-question retrieval QA chain.
//!
//! Retrieves context for the question, stuffs every chunk into one prompt,
//! and returns the completion together with the chunks it was grounded on
//! so callers can cite them.

use anyhow::{Context, Result};
use tracing::debug;

use crate::store::SourceDocument;

use super::{DocumentRetriever, TextGenerator};

/// Answer plus the chunks that were stuffed into the prompt
#[derive(Debug, Clone)]
pub struct QaOutput {
    /// Raw model completion
    pub answer: String,

    /// Retrieved chunks, in retrieval order
    pub source_documents: Vec<SourceDocument>,
}

/// Retrieval QA chain over pluggable retriever and generator
pub struct RetrievalQa {
    llm: Box<dyn TextGenerator>,
    retriever: Box<dyn DocumentRetriever>,
}

impl RetrievalQa {
    pub fn new(llm: Box<dyn TextGenerator>, retriever: Box<dyn DocumentRetriever>) -> Self {
        Self { llm, retriever }
    }

    /// Answer one question.
    ///
    /// Retrieval and generation errors both abort the run; there is no
    /// fallback answer.
    pub async fn run(&self, question: &str) -> Result<QaOutput> {
        let source_documents = self
            .retriever
            .retrieve(question)
            .await
            .context("Context retrieval failed")?;
        debug!("Retrieved {} context chunks", source_documents.len());

        let prompt = stuff_prompt(question, &source_documents);
        let answer = self
            .llm
            .generate(&prompt)
            .context("Answer generation failed")?;

        Ok(QaOutput {
            answer,
            source_documents,
        })
    }
}

/// Render the stuff prompt: all chunks joined by blank lines, then the
/// question, then the answer cue the model completes after.
pub fn stuff_prompt(question: &str, documents: &[SourceDocument]) -> String {
    let context = documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try \
         to make up an answer.\n\n{context}\n\nQuestion: {question}\nHelpful Answer:"
    )
}
