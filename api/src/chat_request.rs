use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use chat_rag::Document;
use std::collections::HashMap;
use thiserror::Error;

use crate::chat_response::ChatResponse;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A PDF file is required for private mode.")]
    MissingFile,
    #[error("Only PDF files are allowed in private mode.")]
    NotPdf,
    #[error("Field '{0}' is required.")]
    MissingField(&'static str),
    #[error("Field 'private' must be a boolean, got '{0}'.")]
    InvalidBoolean(String),
    #[error("Could not parse form data: {0}")]
    MalformedForm(String),
}

#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Raw `/chat` form fields, before validation.
///
/// Accepts `multipart/form-data` (needed for uploads) and plain
/// `application/x-www-form-urlencoded` bodies.
#[derive(Debug, Clone, Default)]
pub struct ChatForm {
    pub question: Option<String>,
    pub private: Option<String>,
    pub file: Option<UploadedFile>,
}

/// A validated request, ready for the pipeline.
#[derive(Debug, Clone)]
pub enum ChatRequest {
    Direct { question: String },
    Rag { question: String, document: Document },
}

impl ChatForm {
    pub fn validate(self) -> Result<ChatRequest, ValidationError> {
        let question = self
            .question
            .filter(|q| !q.trim().is_empty())
            .ok_or(ValidationError::MissingField("question"))?;
        let private = self.private.ok_or(ValidationError::MissingField("private"))?;
        let private = parse_bool(&private).ok_or(ValidationError::InvalidBoolean(private))?;

        if !private {
            return Ok(ChatRequest::Direct { question });
        }

        let file = self.file.ok_or(ValidationError::MissingFile)?;
        if file.content_type.as_deref() != Some(PDF_CONTENT_TYPE) {
            return Err(ValidationError::NotPdf);
        }

        Ok(ChatRequest::Rag {
            question,
            document: Document::new(file.filename, file.bytes),
        })
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ValidationError> {
        let malformed = |e: axum::extract::multipart::MultipartError| ValidationError::MalformedForm(e.body_text());
        let mut form = ChatForm::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "question" => form.question = Some(field.text().await.map_err(malformed)?),
                "private" => form.private = Some(field.text().await.map_err(malformed)?),
                "file" => {
                    let filename = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(malformed)?;

                    // Browsers send an empty, nameless part when no file was picked.
                    let nameless = filename.as_deref().map_or(true, str::is_empty);
                    if !(nameless && bytes.is_empty()) {
                        form.file = Some(UploadedFile {
                            filename,
                            content_type,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => log::debug!("Ignoring unexpected form field '{}'", name),
            }
        }

        Ok(form)
    }
}

#[async_trait]
impl<S> FromRequest<S> for ChatForm
where
    S: Send + Sync,
{
    type Rejection = ChatResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"))
            .unwrap_or(false);

        let parsed = if is_multipart {
            match Multipart::from_request(req, state).await {
                Ok(multipart) => Self::from_multipart(multipart).await,
                Err(rejection) => Err(ValidationError::MalformedForm(rejection.body_text())),
            }
        } else {
            Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map(|Form(mut fields)| ChatForm {
                    question: fields.remove("question"),
                    private: fields.remove("private"),
                    file: None,
                })
                .map_err(|rejection| ValidationError::MalformedForm(rejection.body_text()))
        };

        parsed.map_err(|err| {
            log::warn!("Rejected chat form: {}", err);
            ChatResponse::from(err)
        })
    }
}

/// Lenient form boolean: `true/false`, `1/0`, `yes/no`, `on/off`, `t/f`, `y/n`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" | "t" => Some(true),
        "false" | "0" | "no" | "n" | "off" | "f" => Some(false),
        _ => None,
    }
}
