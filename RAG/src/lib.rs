pub mod models;
pub mod error;
pub mod config;
pub mod document_processor;
pub mod chunker;
pub mod embedding_service;
pub mod vector_index;
pub mod prompt;
pub mod bedrock_service;
pub mod query_service;

pub use models::*;
pub use error::{RagError, Result};
pub use config::{BedrockConfig, RagConfig, SimilarityMetric};
pub use document_processor::{PdfTextExtractor, TextExtractor};
pub use chunker::TextChunker;
pub use embedding_service::EmbeddingProvider;
pub use vector_index::VectorIndex;
pub use prompt::PromptComposer;
pub use bedrock_service::{BedrockClient, TextGenerator};
pub use query_service::QueryService;
