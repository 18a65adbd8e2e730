// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text file helpers for the question/answer exchange files.
//!
//! Reading distinguishes "no question to answer" (missing file) from real
//! I/O failures so the caller can decide whether to stop quietly or loudly.
//! Writing and appending never fail the run: a half-written answer file is
//! preferable to losing an answer that was already generated, so failures
//! are logged and swallowed.

use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Errors that can occur while reading a text file
#[derive(Error, Debug)]
pub enum TextFileError {
    /// File does not exist at the given path
    #[error("File not found: {0}")]
    NotFound(String),

    /// File exists but could not be read
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
}

/// Read an entire text file into a string.
pub async fn read_text_file(path: impl AsRef<Path>) -> Result<String, TextFileError> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("File not found: {}", path.display());
            Err(TextFileError::NotFound(path.display().to_string()))
        }
        Err(e) => {
            warn!("An error occurred while reading {}: {}", path.display(), e);
            Err(TextFileError::ReadFailed {
                path: path.display().to_string(),
                source: e,
            })
        }
    }
}

/// Overwrite a text file with the given contents. Failures are logged, not returned.
pub async fn write_text_file(path: impl AsRef<Path>, contents: &str) {
    let path = path.as_ref();
    match tokio::fs::write(path, contents).await {
        Ok(()) => debug!("Wrote {} bytes to {}", contents.len(), path.display()),
        Err(e) => warn!("An error occurred while writing {}: {}", path.display(), e),
    }
}

/// Append to a text file, creating it if missing. Failures are logged, not returned.
pub async fn append_text_file(path: impl AsRef<Path>, contents: &str) {
    let path = path.as_ref();
    match try_append(path, contents).await {
        Ok(()) => debug!("Appended {} bytes to {}", contents.len(), path.display()),
        Err(e) => warn!(
            "An error occurred while appending to {}: {}",
            path.display(),
            e
        ),
    }
}

async fn try_append(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await?;
    file.write_all(contents.as_bytes()).await?;
    Ok(())
}

/// Rewrite a text file with all blank lines removed.
///
/// A line is blank when it contains only whitespace. Line terminators of the
/// surviving lines are preserved, including a final line without one.
/// Failures are logged, not returned.
pub async fn remove_empty_lines(path: impl AsRef<Path>) {
    let path = path.as_ref();
    match try_remove_empty_lines(path).await {
        Ok(()) => debug!("Removed blank lines from {}", path.display()),
        Err(e) => warn!(
            "An error occurred while cleaning {}: {}",
            path.display(),
            e
        ),
    }
}

async fn try_remove_empty_lines(path: &Path) -> std::io::Result<()> {
    let contents = tokio::fs::read_to_string(path).await?;

    let mut cleaned = String::with_capacity(contents.len());
    for line in contents.split_inclusive('\n') {
        if !line.trim().is_empty() {
            cleaned.push_str(line);
        }
    }

    tokio::fs::write(path, cleaned).await
}
