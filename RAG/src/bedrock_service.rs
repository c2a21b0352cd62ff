use crate::config::BedrockConfig;
use crate::error::{RagError, Result};
use crate::models::*;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Produces a completion for a composed prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
}

/// Which side of the pipeline a remote call serves, so failures land in the
/// matching error variant.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CallKind {
    Generation,
    Embedding,
}

/// Long-lived handle to the Bedrock runtime.
///
/// Built once at startup and shared behind an `Arc`; it is never mutated
/// after construction, so concurrent requests can reuse it freely.
pub struct BedrockClient {
    client: Client,
    config: BedrockConfig,
}

impl BedrockClient {
    pub fn new(config: BedrockConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Config(format!("failed to build HTTP client: {e}")))?;

        log::info!(
            "Bedrock client ready (region: {}, model: {}, embeddings: {})",
            config.region,
            config.model_id,
            config.embedding_model_id
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BedrockConfig {
        &self.config
    }

    fn invoke_url(&self, model_id: &str) -> String {
        format!("{}/model/{}/invoke", self.config.endpoint, model_id)
    }

    /// POSTs `body` to the model's invoke endpoint and decodes the JSON reply.
    pub(crate) async fn invoke_model<B, R>(&self, kind: CallKind, model_id: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let fail = |message: String| match kind {
            CallKind::Generation => RagError::Generation {
                model: model_id.to_string(),
                message,
            },
            CallKind::Embedding => RagError::Embedding {
                model: model_id.to_string(),
                message,
            },
        };

        let response = self
            .client
            .post(self.invoke_url(model_id))
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ServiceError>(&error_text)
                .map(|e| e.message)
                .unwrap_or(error_text);
            return Err(fail(format!("{status}: {detail}")));
        }

        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RagError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl TextGenerator for BedrockClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let request = InvokeModelRequest {
            anthropic_version: &self.config.anthropic_version,
            max_tokens: self.config.max_tokens,
            system: prompt.system.as_deref(),
            messages: &prompt.messages,
        };

        log::info!("Invoking model {}", self.config.model_id);
        let response: InvokeModelResponse = self
            .invoke_model(CallKind::Generation, &self.config.model_id, &request)
            .await?;

        first_text(response)
    }
}

/// Text of the first content item; anything else counts as malformed.
fn first_text(response: InvokeModelResponse) -> Result<String> {
    let first = response
        .content
        .into_iter()
        .next()
        .ok_or_else(|| RagError::InvalidResponse("response has no content".to_string()))?;

    match (first.kind.as_deref(), first.text) {
        (None | Some("text"), Some(text)) => Ok(text),
        (kind, _) => Err(RagError::InvalidResponse(format!(
            "first content item is not text (type: {})",
            kind.unwrap_or("missing")
        ))),
    }
}
