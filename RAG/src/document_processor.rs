use crate::error::{RagError, Result};
use crate::models::Document;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

/// Turns an uploaded document into plain text.
///
/// Returns an empty string when the document holds no extractable text
/// (scanned pages, blank files); the caller decides what that means.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: Document) -> Result<String>;
}

/// PDF text extraction backed by `pdf-extract`, page text concatenated in page order.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, document: Document) -> Result<String> {
        let name = document.display_name().to_string();
        log::info!("Processing PDF: {} ({} bytes)", name, document.bytes.len());

        // pdf-extract is CPU bound and panics on some malformed inputs.
        let raw = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&document.bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| RagError::Extraction(format!("extractor aborted: {e}")))?
        .map_err(RagError::Extraction)?;

        let text = clean_text(&raw);
        log::info!("Extracted {} characters from {}", text.chars().count(), name);
        Ok(text)
    }
}

/// Collapses runs of spaces and tabs, trims line ends, and squeezes long runs
/// of blank lines. Newlines survive since the chunker splits on them.
/// Whitespace-only input comes back empty.
pub fn clean_text(text: &str) -> String {
    static INLINE_WS: OnceLock<Regex> = OnceLock::new();
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

    let inline_ws = INLINE_WS.get_or_init(|| Regex::new(r"[ \t\u{00A0}\x0C]+").expect("valid regex"));
    let blank_runs = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"));

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = inline_ws.replace_all(&normalized, " ");
    let lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    let joined = lines.join("\n");

    blank_runs.replace_all(&joined, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_inline_whitespace() {
        assert_eq!(clean_text("Refund   policy:\t30 days"), "Refund policy: 30 days");
    }

    #[test]
    fn clean_text_keeps_line_structure() {
        let cleaned = clean_text("  Title  \r\nfirst line\n\n\n\n\nsecond line  ");
        assert_eq!(cleaned, "Title\nfirst line\n\nsecond line");
    }

    #[test]
    fn clean_text_of_whitespace_is_empty() {
        assert_eq!(clean_text(" \n\t\n\x0C \n"), "");
        assert_eq!(clean_text(""), "");
    }

    /// Minimal PDF with one Helvetica text line per page; "" gives a blank page.
    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let font_id = 3 + 2 * pages.len();
        let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages.len()),
        ];
        for (i, text) in pages.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {} 0 R >>",
                4 + 2 * i
            ));
            let stream = if text.is_empty() {
                String::new()
            } else {
                format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET")
            };
            objects.push(format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()));
        }
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref_at = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n", objects.len() + 1).as_bytes(),
        );
        pdf
    }

    #[tokio::test]
    async fn pages_are_extracted_in_order() {
        let document = Document::new(
            Some("policy.pdf".into()),
            build_pdf(&["Refund policy first", "Shipping second"]),
        );
        let text = PdfTextExtractor::new().extract(document).await.unwrap();

        let refund = text.find("Refund policy first").expect("first page text");
        let shipping = text.find("Shipping second").expect("second page text");
        assert!(refund < shipping, "pages out of order: {text:?}");
    }

    #[tokio::test]
    async fn blank_page_extracts_to_empty_text() {
        let document = Document::new(Some("blank.pdf".into()), build_pdf(&[""]));
        let text = PdfTextExtractor::new().extract(document).await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn garbage_bytes_are_an_extraction_error() {
        let document = Document::new(Some("broken.pdf".into()), b"definitely not a pdf".to_vec());
        let err = PdfTextExtractor::new().extract(document).await.unwrap_err();
        assert!(matches!(err, RagError::Extraction(_)), "got {err:?}");
    }
}
