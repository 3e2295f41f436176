//! Document text extraction.
//!
//! Turns an uploaded body into one string of text. PDFs are parsed in memory
//! with `lopdf`, page by page in page order; nothing touches the disk.

use std::path::Path;

use lopdf::Document;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ServerError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Document formats the server can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    /// `{ "text": "..." }`
    Json,
    Pdf,
}

impl DocumentFormat {
    /// Resolve the format from a `Content-Type` header value.
    ///
    /// Without a header the body is sniffed for the PDF signature and
    /// otherwise read as plain text.
    pub fn detect(content_type: Option<&str>, body: &[u8]) -> Result<Self, ServerError> {
        let Some(content_type) = content_type else {
            return Ok(if body.starts_with(PDF_MAGIC) { Self::Pdf } else { Self::PlainText });
        };
        let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" => Ok(Self::Pdf),
            "application/json" => Ok(Self::Json),
            "text/plain" | "text/markdown" => Ok(Self::PlainText),
            "application/octet-stream" if body.starts_with(PDF_MAGIC) => Ok(Self::Pdf),
            _ => Err(ServerError::UnsupportedMediaType(mime)),
        }
    }

    /// Resolve the format from a file name extension.
    pub fn from_path(path: &Path) -> Result<Self, ServerError> {
        let extension =
            path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("json") => Ok(Self::Json),
            Some("txt" | "md" | "text") | None => Ok(Self::PlainText),
            Some(other) => Err(ServerError::UnsupportedMediaType(format!(".{other}"))),
        }
    }
}

#[derive(Deserialize)]
struct TextBody {
    text: String,
}

/// Extract the text of a document body in the given format.
///
/// # Errors
///
/// Returns [`ServerError::InvalidDocument`] if the body cannot be decoded.
pub fn extract_text(format: DocumentFormat, body: &[u8]) -> Result<String, ServerError> {
    match format {
        DocumentFormat::PlainText => String::from_utf8(body.to_vec())
            .map_err(|_| ServerError::InvalidDocument("text is not valid UTF-8".into())),
        DocumentFormat::Json => serde_json::from_slice::<TextBody>(body)
            .map(|b| b.text)
            .map_err(|e| ServerError::InvalidDocument(format!("expected {{\"text\": ...}}: {e}"))),
        DocumentFormat::Pdf => pdf_text(body),
    }
}

/// Read a document from disk and extract its text.
///
/// # Errors
///
/// Returns [`ServerError::InvalidDocument`] if the file cannot be read or
/// decoded, or [`ServerError::UnsupportedMediaType`] for unknown extensions.
pub fn read_document(path: &Path) -> Result<String, ServerError> {
    let format = DocumentFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| {
        ServerError::InvalidDocument(format!("failed to read {}: {e}", path.display()))
    })?;
    extract_text(format, &bytes)
}

/// Extract the text of every page of a PDF, in page order.
///
/// Pages are joined with a newline. Pages whose text cannot be decoded are
/// skipped with a warning.
///
/// # Errors
///
/// Returns [`ServerError::InvalidDocument`] if the bytes are not a PDF.
pub fn pdf_text(bytes: &[u8]) -> Result<String, ServerError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ServerError::InvalidDocument(format!("failed to load PDF: {e}")))?;

    // BTreeMap keys are already in page order.
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());
    for page in &page_numbers {
        match doc.extract_text(&[*page]) {
            Ok(text) => pages.push(text.trim().to_string()),
            Err(e) => warn!(page, error = %e, "skipping unreadable PDF page"),
        }
    }

    debug!(page_count = page_numbers.len(), "extracted PDF text");
    Ok(pages.join("\n"))
}
