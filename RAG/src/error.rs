use thiserror::Error;

/// Failures that can end a chat request inside the pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// The document yielded no text, or no chunks after splitting.
    #[error("Could not extract text from the PDF. The document might be empty or unscannable.")]
    EmptyDocument,

    #[error("Failed to read PDF: {0}")]
    Extraction(String),

    #[error("Embedding request failed ({model}): {message}")]
    Embedding { model: String, message: String },

    #[error("Model invocation failed ({model}): {message}")]
    Generation { model: String, message: String },

    #[error("Malformed model response: {0}")]
    InvalidResponse(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RagError>;
