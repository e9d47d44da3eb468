//! Typed errors at the component seams.
//!
//! Batch ingestion treats every one of these as a per-item condition: the
//! offending folder or file is logged and skipped, the run continues.

use thiserror::Error;

/// Failure talking to the remote content API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, timeout, non-2xx status).
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request succeeded but the response body was not the expected
    /// `{"content": ...}` envelope.
    #[error("unexpected payload from {url}: {detail}")]
    Payload { url: String, detail: String },
}

/// Text extraction failure on a downloaded document. No artifact is written
/// and the document is not retried within the same run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// A malformed user pattern, rejected before any index scan starts.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}
