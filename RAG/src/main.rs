// Command-line entry point: asks one question, optionally grounded in a local PDF.
// The HTTP server lives in ../api.

use anyhow::{bail, Context, Result};
use chat_rag::{BedrockConfig, Document, QueryService, RagConfig, RagError};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (question, pdf_path) = match (args.next(), args.next()) {
        (Some(question), pdf_path) => (question, pdf_path),
        (None, _) => bail!("usage: chat-rag <question> [document.pdf]"),
    };

    let service = QueryService::bedrock(BedrockConfig::from_env()?, RagConfig::default())?;

    let answer = match pdf_path {
        Some(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {path}"))?;
            let filename = Path::new(&path)
                .file_name()
                .map(|name| name.to_string_lossy().to_string());

            match service.answer_from_document(&question, Document::new(filename, bytes)).await {
                Err(RagError::EmptyDocument) => RagError::EmptyDocument.to_string(),
                other => other?,
            }
        }
        None => service.answer_direct(&question).await?,
    };

    println!("{answer}");
    Ok(())
}
