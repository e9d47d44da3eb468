//! Plain-text extraction for downloaded documents.
//!
//! Extraction is pipeline-layer: the reconciler supplies bytes plus the
//! published file name, this module returns UTF-8 text. A failed extraction
//! produces no artifact and the pipeline skips the document.

use crate::error::ExtractError;

/// Byte-to-text conversion seam. The production implementation handles PDF;
/// tests substitute a pass-through.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// PDF extractor. Every document the source currently publishes is a PDF;
/// anything else is reported as unsupported rather than guessed at.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ExtractError::UnsupportedFormat(file_name.to_string()));
        }

        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_returns_error() {
        let err = PdfExtractor.extract("minutes.docx", b"foo").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = PdfExtractor.extract("minutes.pdf", b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
