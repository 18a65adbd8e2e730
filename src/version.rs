// Version information for the document Q&A driver

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-single-shot-qa-2025-08-24";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-08-24";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "llama-cpp-models",
    "gpt4all-models",
    "onnx-embeddings",
    "hnsw-retrieval",
    "source-citations",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("docqa {} ({})", VERSION_NUMBER, BUILD_DATE)
}
