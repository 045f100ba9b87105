//! Document text extraction for résumé payloads.
//!
//! JSON submissions carry the document base64-encoded; multipart uploads carry
//! raw bytes. Both land in `extract_document_text`, which understands PDF and
//! UTF-8 plain text.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("document is neither PDF nor UTF-8 text")]
    UnsupportedContent,

    #[error("unsupported file type '{0}', expected .txt or .pdf")]
    UnsupportedFileType(String),
}

/// Upload types the ingestion layer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Text,
}

impl UploadKind {
    /// Classifies by extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Text),
            _ => Err(ExtractError::UnsupportedFileType(filename.to_string())),
        }
    }
}

/// Decodes a base64 document and extracts its text. Any failure is logged and
/// yields an empty string so one bad attachment never rejects the candidate.
pub fn extract_text_from_base64(encoded: &str) -> String {
    match decode_base64(encoded).and_then(|bytes| extract_document_text(&bytes)) {
        Ok(text) => text,
        Err(e) => {
            warn!("Résumé text extraction failed, continuing with empty text: {e}");
            String::new()
        }
    }
}

/// Accepts bare base64 or a `data:<mime>;base64,` URL.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, ExtractError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(BASE64_STANDARD.decode(compact)?)
}

/// Sniffs the payload: `%PDF` goes through the PDF extractor, anything else
/// must be UTF-8 text.
pub fn extract_document_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.starts_with(PDF_MAGIC) {
        extract_pdf_text(bytes)
    } else {
        let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::UnsupportedContent)?;
        Ok(text.trim().to_string())
    }
}

/// Extracts text per page, collapses whitespace inside each page and joins
/// non-empty pages with a blank line.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| ExtractError::Pdf("extractor panicked on malformed document".to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(join_pages(pages.iter().map(String::as_str)))
}

fn join_pages<'a>(pages: impl Iterator<Item = &'a str>) -> String {
    pages
        .map(|page| WHITESPACE_RE.replace_all(page.trim(), " ").into_owned())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extracts text from an uploaded file according to its extension.
pub fn extract_upload(filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    match UploadKind::from_filename(filename)? {
        UploadKind::Pdf => extract_pdf_text(bytes),
        UploadKind::Text => Ok(String::from_utf8_lossy(bytes).trim().to_string()),
    }
}
