mod chat_request;
mod chat_response;
mod config;
mod routes;

use anyhow::Result;
use chat_rag::{BedrockConfig, QueryService, RagConfig};
use config::ServerConfig;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let query_service = QueryService::bedrock(BedrockConfig::from_env()?, RagConfig::default())?;
    log::info!("Chat pipeline initialized");

    let app = routes::app(AppState::new(query_service), &config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    log::info!(
        "Listening on {} (allowed origin: {})",
        listener.local_addr()?,
        config.cors_origin
    );
    axum::serve(listener, app).await?;
    Ok(())
}
