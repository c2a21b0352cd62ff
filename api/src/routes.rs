use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header::ORIGIN, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chat_rag::QueryService;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use uuid::Uuid;

use crate::chat_request::{ChatForm, ChatRequest};
use crate::chat_response::{ChatError, ChatResponse};
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub query_service: Arc<QueryService>,
}

impl AppState {
    pub fn new(query_service: QueryService) -> Self {
        Self {
            query_service: Arc::new(query_service),
        }
    }
}

pub fn app(state: AppState, config: &ServerConfig) -> Result<Router> {
    let origin = HeaderValue::from_str(&config.cors_origin)
        .with_context(|| format!("invalid CORS origin '{}'", config.cors_origin))?;

    let layers = ServiceBuilder::new()
        .layer(cors_layer(origin.clone()))
        .layer(middleware::from_fn_with_state(origin, reject_foreign_origin))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    Ok(Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .layer(layers)
        .with_state(state))
}

/// Only `origin` gets CORS headers.
fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Turns away cross-origin requests before any handler runs. Simple
/// requests (form posts) skip the preflight, so CORS headers alone would
/// still let them through. Requests without an `Origin` header pass.
async fn reject_foreign_origin(State(allowed): State<HeaderValue>, request: Request, next: Next) -> Response {
    match request.headers().get(ORIGIN) {
        Some(origin) if *origin != allowed => {
            log::warn!("Rejected request from origin {:?}", origin);
            StatusCode::FORBIDDEN.into_response()
        }
        _ => next.run(request).await,
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello! The Chatbot API is running." }))
}

pub async fn chat(State(state): State<AppState>, form: ChatForm) -> ChatResponse {
    let request_id = Uuid::new_v4();

    let request = match form.validate() {
        Ok(request) => request,
        Err(err) => {
            log::warn!("[{}] Invalid chat request: {}", request_id, err);
            return err.into();
        }
    };

    let outcome = match request {
        ChatRequest::Direct { question } => {
            log::info!("[{}] Public question", request_id);
            state.query_service.answer_direct(&question).await
        }
        ChatRequest::Rag { question, document } => {
            log::info!(
                "[{}] Private question over {} ({} bytes)",
                request_id,
                document.display_name(),
                document.bytes.len()
            );
            state.query_service.answer_from_document(&question, document).await
        }
    };

    match outcome {
        Ok(answer) => {
            log::info!("[{}] Answered ({} characters)", request_id, answer.chars().count());
            ChatResponse::Response(answer)
        }
        Err(err) => {
            log::error!("[{}] Chat request failed: {}", request_id, err);
            ChatError::from(err).into()
        }
    }
}
