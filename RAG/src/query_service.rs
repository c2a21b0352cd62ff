use crate::bedrock_service::{BedrockClient, TextGenerator};
use crate::chunker::TextChunker;
use crate::config::{BedrockConfig, RagConfig};
use crate::document_processor::{PdfTextExtractor, TextExtractor};
use crate::embedding_service::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::models::*;
use crate::prompt::PromptComposer;
use crate::vector_index::VectorIndex;
use std::sync::Arc;

/// Answers questions either directly or from one uploaded document.
///
/// Holds only shared, read-only handles; every index it builds lives for a
/// single call.
pub struct QueryService {
    extractor: Arc<dyn TextExtractor>,
    embeddings: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn TextGenerator>,
    chunker: TextChunker,
    composer: PromptComposer,
    config: RagConfig,
}

impl QueryService {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embeddings: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn TextGenerator>,
        config: RagConfig,
    ) -> Self {
        Self {
            extractor,
            embeddings,
            generator,
            chunker: TextChunker::from_config(&config),
            composer: PromptComposer::new(),
            config,
        }
    }

    /// Wires the PDF extractor and one shared Bedrock client for both
    /// embeddings and generation.
    pub fn bedrock(bedrock: BedrockConfig, config: RagConfig) -> Result<Self> {
        let client = Arc::new(BedrockClient::new(bedrock)?);
        Ok(Self::new(Arc::new(PdfTextExtractor::new()), client.clone(), client, config))
    }

    /// Sends the bare question to the model.
    pub async fn answer_direct(&self, question: &str) -> Result<String> {
        let prompt = self.composer.direct(question);
        self.generator.generate(&prompt).await
    }

    /// Runs extract → chunk → embed → index → retrieve → augment → generate.
    ///
    /// Returns [`RagError::EmptyDocument`] before any remote call when the
    /// document has nothing to index.
    pub async fn answer_from_document(&self, question: &str, document: Document) -> Result<String> {
        let text = self.extractor.extract(document).await?;
        if text.trim().is_empty() {
            log::warn!("Document contained no extractable text");
            return Err(RagError::EmptyDocument);
        }

        let chunks = self.chunker.split_text(&text);
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument);
        }

        let retrieved = self.retrieve(question, chunks).await?;
        let prompt = self.composer.augmented(question, &retrieved);

        log::info!("Invoking model with augmented prompt ({} context chunks)", retrieved.len());
        self.generator.generate(&prompt).await
    }

    async fn retrieve(&self, question: &str, chunks: Vec<TextChunk>) -> Result<Vec<ScoredChunk>> {
        let vectors = {
            let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            self.embeddings.embed_batch(&texts).await?
        };

        let index = VectorIndex::build(chunks, vectors, self.config.metric)?;
        let query = self.embeddings.embed(question).await?;
        index.search(&query, self.config.top_k)
    }
}
