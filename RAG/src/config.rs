use crate::error::{RagError, Result};
use std::env;
use std::time::Duration;

pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";
pub const DEFAULT_EMBEDDING_MODEL_ID: &str = "amazon.titan-embed-text-v1";

/// How the vector index ranks chunks against a query vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    /// Negated L2 distance, so that higher still means closer.
    Euclidean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separator: String,
    pub top_k: usize,
    pub metric: SimilarityMetric,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separator: "\n".to_string(),
            top_k: 3,
            metric: SimilarityMetric::Cosine,
        }
    }
}

impl RagConfig {
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn metric(mut self, metric: SimilarityMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Validates the settings: overlap must be smaller than the chunk size,
    /// `top_k` must be positive and the separator non-empty.
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if config.separator.is_empty() {
            return Err(RagError::Config("separator must not be empty".to_string()));
        }
        Ok(config)
    }
}

/// Connection settings for the hosted inference service.
#[derive(Clone)]
pub struct BedrockConfig {
    pub region: String,
    pub endpoint: String,
    pub model_id: String,
    pub embedding_model_id: String,
    pub api_key: String,
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

// Keeps the bearer token out of logs.
impl std::fmt::Debug for BedrockConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("model_id", &self.model_id)
            .field("embedding_model_id", &self.embedding_model_id)
            .field("anthropic_version", &self.anthropic_version)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl BedrockConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset keys fall
    /// back to defaults, except `AWS_BEARER_TOKEN_BEDROCK` which is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("AWS_BEARER_TOKEN_BEDROCK").ok_or_else(|| {
            RagError::Config("AWS_BEARER_TOKEN_BEDROCK environment variable not set".to_string())
        })?;
        let region = get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = get("BEDROCK_ENDPOINT")
            .unwrap_or_else(|| format!("https://bedrock-runtime.{region}.amazonaws.com"))
            .trim_end_matches('/')
            .to_string();

        let max_tokens = match get("BEDROCK_MAX_TOKENS") {
            Some(raw) => raw.parse::<u32>().ok().filter(|&n| n > 0).ok_or_else(|| {
                RagError::Config(format!("BEDROCK_MAX_TOKENS must be a positive integer, got '{raw}'"))
            })?,
            None => 1000,
        };
        let timeout_secs = match get("BEDROCK_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                RagError::Config(format!("BEDROCK_TIMEOUT_SECS must be a whole number, got '{raw}'"))
            })?,
            None => 120,
        };

        Ok(Self {
            region,
            endpoint,
            model_id: get("BEDROCK_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            embedding_model_id: get("BEDROCK_EMBEDDING_MODEL_ID")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL_ID.to_string()),
            api_key,
            anthropic_version: ANTHROPIC_VERSION.to_string(),
            max_tokens,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
