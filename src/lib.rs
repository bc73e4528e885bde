//! # llamaparse-md
//!
//! Send PDF documents to the LlamaParse cloud service and save what comes
//! back as a JSON file and a markdown file.
//!
//! All document understanding (layout analysis, OCR, vision-model page
//! reading) happens in the service. This crate handles configuration,
//! the upload/poll/fetch exchange, and writing the two artifacts.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Config   LLAMA_CLOUD_API_KEY (+ optional vendor keys) and options
//!  ├─ 2. Input    validate the file (%PDF magic) or scan a directory
//!  ├─ 3. Service  upload → poll job → fetch JSON result
//!  └─ 4. Output   parsed_result.json + parsed_result.md
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llamaparse_md::{run_single, OutputArtifacts, ParseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ParseConfig::default();
//!     let outcome = run_single("data/CVM_articles.pdf", &OutputArtifacts::single_in("."), &config).await?;
//!     eprintln!("{} pages, {} words", outcome.stats.total_pages, outcome.stats.word_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `llamaparse-md` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod credentials;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ParseConfig, ParseConfigBuilder, ParseRequest, ResultType, DEFAULT_BASE_URL};
pub use credentials::Credentials;
pub use error::{ErrorKind, ParseError};
pub use output::{OutputArtifacts, ParseResult, ParseStats, ParsedDocument, ParsedPage};
pub use progress::{BatchCallback, BatchProgressCallback, NoopProgressCallback};
pub use run::{
    parse_directory, parse_file, parse_to_files, run_batch, run_single, run_single_sync,
    run_single_with, BatchReport, FileFailure, FileSuccess, ParseOutcome,
};
pub use service::{LlamaCloudClient, ParseService};
