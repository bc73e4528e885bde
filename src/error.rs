//! Error types for the llamaparse-md library.
//!
//! Every failure is fatal for the file being parsed, so a single error enum
//! covers the whole crate. Variants fall into three main groups, exposed through
//! [`ParseError::kind`]:
//!
//! * **Configuration**: credentials or options are missing or invalid. These
//!   are detected before any network traffic.
//! * **Service**: the remote parsing service could not be reached, refused
//!   the request, or returned something unusable.
//! * **Io**: the input PDF could not be read or an output artifact could not
//!   be written.
//!
//! Batch mode gives a file a second attempt only when
//! [`ParseError::is_rate_limited`] holds.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Service,
    Io,
    Internal,
}

/// All errors returned by the llamaparse-md library.
#[derive(Debug, Error)]
pub enum ParseError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// A required API key is absent or empty.
    #[error("Missing API key: {var} is not set.\nExport it or add it to a .env file.")]
    MissingApiKey { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The input file or directory could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Service errors ────────────────────────────────────────────────────
    /// Transport-level failure talking to the parsing service.
    #[error("Network error contacting the parsing service: {detail}")]
    Network { detail: String },

    /// The service rejected the API key (HTTP 401/403).
    #[error("Authentication failed ({status}): {detail}\nCheck LLAMA_CLOUD_API_KEY.")]
    AuthFailed { status: u16, detail: String },

    /// The service returned HTTP 429.
    ///
    /// `retry_after_secs` carries the server's `Retry-After` hint when given.
    #[error("Rate limit exceeded (429 Too Many Requests)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The service refused the document itself (HTTP 400/415/422).
    #[error("Document rejected by the parsing service ({status}): {detail}")]
    DocumentRejected { status: u16, detail: String },

    /// Any other non-success HTTP status.
    #[error("Parsing service returned HTTP {status}: {detail}")]
    ServiceStatus { status: u16, detail: String },

    /// The parse job finished in an error state.
    #[error("Parse job {job_id} ended with status {status}: {detail}")]
    JobFailed {
        job_id: String,
        status: String,
        detail: String,
    },

    /// The parse job did not finish within the configured ceiling.
    #[error("Parse job {job_id} did not finish within {secs}s")]
    JobTimeout { job_id: String, secs: u64 },

    /// A response body could not be decoded.
    #[error("Malformed response from the parsing service: {detail}")]
    MalformedResponse { detail: String },

    /// The job succeeded but returned no pages.
    #[error("Parse result for '{path}' is empty")]
    EmptyResult { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParseError {
    /// The error group this variant belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::MissingApiKey { .. } | ParseError::InvalidConfig(_) => {
                ErrorKind::Configuration
            }
            ParseError::Network { .. }
            | ParseError::AuthFailed { .. }
            | ParseError::RateLimited { .. }
            | ParseError::DocumentRejected { .. }
            | ParseError::ServiceStatus { .. }
            | ParseError::JobFailed { .. }
            | ParseError::JobTimeout { .. }
            | ParseError::MalformedResponse { .. }
            | ParseError::EmptyResult { .. } => ErrorKind::Service,
            ParseError::FileNotFound { .. }
            | ParseError::PermissionDenied { .. }
            | ParseError::NotAPdf { .. }
            | ParseError::ReadFailed { .. }
            | ParseError::OutputWriteFailed { .. } => ErrorKind::Io,
            ParseError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for HTTP 429 responses.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ParseError::RateLimited { .. })
    }

    /// The server's `Retry-After`, when this is a 429 that carried one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            ParseError::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ParseError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ParseError::MalformedResponse {
                detail: e.to_string(),
            }
        } else {
            ParseError::Network {
                detail: e.to_string(),
            }
        }
    }
}
