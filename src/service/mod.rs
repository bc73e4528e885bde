//! The request dispatcher: the seam between this crate and the remote
//! document-parsing service.
//!
//! [`ParseService`] is the only network-facing abstraction. The production
//! implementation is [`LlamaCloudClient`]; tests substitute a stub that
//! returns canned results, which is how the run-level guarantees (no files
//! on failure, deterministic overwrite) are verified without a network.

pub mod llama;

pub use llama::LlamaCloudClient;

use crate::config::ParseRequest;
use crate::error::ParseError;
use crate::output::ParseResult;
use async_trait::async_trait;

/// A remote service that turns a PDF into a [`ParseResult`].
///
/// Implementations make exactly one attempt per call: retry policy belongs
/// to the caller.
#[async_trait]
pub trait ParseService: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Parse the file named by `request.file_path`.
    async fn parse(&self, request: &ParseRequest) -> Result<ParseResult, ParseError>;
}
