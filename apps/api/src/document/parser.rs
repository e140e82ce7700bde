use async_trait::async_trait;

use crate::document::{DocumentError, DocumentParser, UploadedFile};

#[derive(Debug, Clone, Copy, PartialEq)]
enum DocumentFormat {
    Pdf,
    PlainText,
}

/// Decides the format from the declared content type, falling back to the file extension
/// when the client sent a generic type.
fn detect_format(file: &UploadedFile) -> Result<DocumentFormat, DocumentError> {
    let content_type = file
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match content_type.as_str() {
        "application/pdf" => return Ok(DocumentFormat::Pdf),
        "text/plain" | "text/markdown" => return Ok(DocumentFormat::PlainText),
        _ => {}
    }

    match file.extension().as_deref() {
        Some("pdf") => Ok(DocumentFormat::Pdf),
        Some("txt") | Some("md") => Ok(DocumentFormat::PlainText),
        Some(ext) => Err(DocumentError::UnsupportedFormat(ext.to_string())),
        None if content_type.is_empty() => {
            Err(DocumentError::UnsupportedFormat("unknown".to_string()))
        }
        None => Err(DocumentError::UnsupportedFormat(content_type)),
    }
}

/// Text extraction backed by `pdf-extract` for PDFs and UTF-8 decoding for text files.
#[derive(Debug, Clone, Default)]
pub struct PdfDocumentParser;

#[async_trait]
impl DocumentParser for PdfDocumentParser {
    async fn parse(&self, file: &UploadedFile) -> Result<String, DocumentError> {
        let text = match detect_format(file)? {
            DocumentFormat::Pdf => {
                let bytes = file.bytes.clone();
                // pdf-extract is CPU-bound and synchronous.
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await
                    .map_err(|e| DocumentError::Unreadable(format!("PDF worker failed: {e}")))?
                    .map_err(|e| DocumentError::Unreadable(format!("PDF extraction failed: {e}")))?
            }
            DocumentFormat::PlainText => String::from_utf8(file.bytes.to_vec())
                .map_err(|e| DocumentError::Unreadable(format!("Text is not UTF-8: {e}")))?,
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(DocumentError::EmptyDocument);
        }
        Ok(text.to_string())
    }
}
