use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_rag::RagError;
use serde::Serialize;
use thiserror::Error;

use crate::chat_request::ValidationError;

/// Body of every `/chat` reply: exactly one of `response` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatResponse {
    Response(String),
    Error(String),
}

/// Why a chat request did not produce an answer.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Rag(#[from] RagError),
}

impl From<ChatError> for ChatResponse {
    fn from(err: ChatError) -> Self {
        match err {
            // Informational rather than a malfunction: nothing to answer from.
            ChatError::Rag(RagError::EmptyDocument) => ChatResponse::Response(RagError::EmptyDocument.to_string()),
            other => ChatResponse::Error(other.to_string()),
        }
    }
}

impl From<ValidationError> for ChatResponse {
    fn from(err: ValidationError) -> Self {
        ChatError::from(err).into()
    }
}

// Logical failures travel in the body; the status stays 200.
impl IntoResponse for ChatResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
