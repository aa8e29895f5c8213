//! ContentExtractor trait — the boundary to document content extraction.

use crate::error::ExtractError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The document types the extractor boundary understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    Docx,
    GoogleDoc,
    GoogleSlides,
    Text,
}

impl DocumentType {
    /// Parse a wire string into a document type.
    pub fn parse(s: &str) -> std::result::Result<Self, ExtractError> {
        match s {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "google_doc" => Ok(Self::GoogleDoc),
            "google_slides" => Ok(Self::GoogleSlides),
            "text" => Ok(Self::Text),
            other => Err(ExtractError::UnsupportedType(other.to_string())),
        }
    }
}

/// Extracts plain text from a submitted artifact. The implementation owns
/// fetching, format parsing, and any OCR; the loop only sees text or a typed
/// error.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(
        &self,
        file_ref: &str,
        content_type: DocumentType,
    ) -> std::result::Result<String, ExtractError>;
}
