use crate::bedrock_service::{BedrockClient, CallKind};
use crate::error::{RagError, Result};
use crate::models::{EmbeddingRequest, EmbeddingResponse};
use async_trait::async_trait;

/// Maps text to fixed-length vectors.
///
/// Chunks and questions must go through the same provider, otherwise their
/// vectors are not comparable.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds every input in order, one call each. The first failure aborts
    /// the batch; partial results are discarded.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for BedrockClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model_id = &self.config().embedding_model_id;
        let response: EmbeddingResponse = self
            .invoke_model(CallKind::Embedding, model_id, &EmbeddingRequest { input_text: text })
            .await?;

        if response.embedding.is_empty() {
            return Err(RagError::Embedding {
                model: model_id.clone(),
                message: "service returned an empty embedding".to_string(),
            });
        }
        log::debug!(
            "Embedded {} tokens into {} dimensions",
            response.input_text_token_count.unwrap_or_default(),
            response.embedding.len()
        );
        Ok(response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedrock_service::tests::{client_for, fake_runtime};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn embed_posts_input_text_to_embedding_model() {
        let (endpoint, seen) = fake_runtime(
            StatusCode::OK,
            json!({"embedding": [0.25, -0.5, 1.0], "inputTextTokenCount": 3}),
        )
        .await;

        let vector = client_for(&endpoint).embed("refund policy").await.unwrap();
        assert_eq!(vector, vec![0.25, -0.5, 1.0]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "test-embed-model");
        assert_eq!(seen[0].2, json!({"inputText": "refund policy"}));
    }

    #[tokio::test]
    async fn embedding_failures_are_embedding_errors() {
        let (endpoint, _) = fake_runtime(StatusCode::TOO_MANY_REQUESTS, json!({"message": "Too many requests"})).await;
        let err = client_for(&endpoint).embed("text").await.unwrap_err();
        assert!(matches!(err, RagError::Embedding { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_vector_is_rejected() {
        let (endpoint, _) = fake_runtime(StatusCode::OK, json!({"embedding": []})).await;
        assert!(client_for(&endpoint).embed("text").await.is_err());
    }

    /// Fails on the third call.
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for Flaky {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 2 {
                return Err(RagError::Embedding {
                    model: "flaky".into(),
                    message: "connection reset".into(),
                });
            }
            Ok(vec![1.0, 0.0])
        }
    }

    #[tokio::test]
    async fn batch_aborts_on_first_failure() {
        let flaky = Flaky { calls: AtomicUsize::new(0) };
        let result = flaky.embed_batch(&["a", "b", "c", "d"]).await;
        assert!(result.is_err());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn batch_preserves_order_and_length() {
        let flaky = Flaky { calls: AtomicUsize::new(0) };
        let vectors = flaky.embed_batch(&["a", "b"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![1.0, 0.0]]);
    }
}
