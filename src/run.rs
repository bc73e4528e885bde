//! Run entry points: single file and whole directory.
//!
//! A single-file run is strictly loader → dispatcher → writer and aborts on
//! the first error. A batch run repeats that for every PDF in a directory,
//! pausing between requests, retrying a rate-limited file once, and carrying
//! on past per-file failures.

use crate::config::ParseConfig;
use crate::error::ParseError;
use crate::output::{OutputArtifacts, ParseResult, ParseStats, BATCH_PREVIEW_CHARS};
use crate::pipeline::{input, write};
use crate::service::{LlamaCloudClient, ParseService};
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// A successful parse: the service's result plus summary figures.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub result: ParseResult,
    pub stats: ParseStats,
}

/// Parse one PDF through `service` without writing anything.
///
/// # Errors
/// - Io errors when the file is missing, unreadable, or not a PDF
/// - Service errors from the dispatcher
/// - [`ParseError::EmptyResult`] when the service returned no pages
pub async fn parse_file(
    service: &dyn ParseService,
    path: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<ParseOutcome, ParseError> {
    let path = input::validate_pdf(path)?;
    let request = config.request_for(&path);

    let start = Instant::now();
    let result = service.parse(&request).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if result.is_empty() {
        return Err(ParseError::EmptyResult { path });
    }

    let mut stats = result.stats(config.result_type);
    stats.elapsed_ms = elapsed_ms;
    info!(
        "Parsed {} via {}: {} pages, {} chars, {} words, {}ms",
        path.display(),
        service.name(),
        stats.total_pages,
        stats.total_chars,
        stats.word_count,
        stats.elapsed_ms
    );

    Ok(ParseOutcome { result, stats })
}

/// Parse one PDF and write its JSON and markdown artifacts.
///
/// Nothing is written unless the service call succeeds.
pub async fn parse_to_files(
    service: &dyn ParseService,
    path: impl AsRef<Path>,
    artifacts: &OutputArtifacts,
    config: &ParseConfig,
    title: Option<&str>,
) -> Result<ParseOutcome, ParseError> {
    let outcome = parse_file(service, path, config).await?;
    write::write_result(&outcome.result, artifacts, config.result_type, title)?;
    Ok(outcome)
}

/// Single-file run against the LlamaParse service using environment credentials.
///
/// Missing credentials fail with a configuration error before any request.
pub async fn run_single(
    path: impl AsRef<Path>,
    artifacts: &OutputArtifacts,
    config: &ParseConfig,
) -> Result<ParseOutcome, ParseError> {
    run_single_with(|var| std::env::var(var).ok(), path, artifacts, config).await
}

/// [`run_single`] with credentials read through `lookup` instead of the
/// process environment.
pub async fn run_single_with<F>(
    lookup: F,
    path: impl AsRef<Path>,
    artifacts: &OutputArtifacts,
    config: &ParseConfig,
) -> Result<ParseOutcome, ParseError>
where
    F: Fn(&str) -> Option<String>,
{
    let client = LlamaCloudClient::from_lookup(lookup, config)?;
    parse_to_files(&client, path, artifacts, config, None).await
}

/// Blocking wrapper around [`run_single`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_single_sync(
    path: impl AsRef<Path>,
    artifacts: &OutputArtifacts,
    config: &ParseConfig,
) -> Result<ParseOutcome, ParseError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ParseError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_single(path, artifacts, config))
}

// ── Batch mode ───────────────────────────────────────────────────────────

/// A file that was parsed and written.
#[derive(Debug, Clone, Serialize)]
pub struct FileSuccess {
    pub path: PathBuf,
    pub artifacts: OutputArtifacts,
    pub stats: ParseStats,
}

/// A file that failed; `error` is the rendered [`ParseError`].
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a directory run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<FileSuccess>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }
}

/// Parse every PDF in `dir`, writing `<stem>_parsed.{json,md}` into `out_dir`.
///
/// Per-file errors are recorded in the report; only failing to list `dir`
/// or create `out_dir` aborts the run.
pub async fn parse_directory(
    service: &dyn ParseService,
    dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<BatchReport, ParseError> {
    let dir = dir.as_ref();
    let out_dir = out_dir.as_ref();

    let pdfs = input::discover_pdfs(dir)?;
    std::fs::create_dir_all(out_dir).map_err(|source| ParseError::OutputWriteFailed {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let total = pdfs.len();
    info!("Found {} PDF files in {}", total, dir.display());
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut report = BatchReport::default();
    let mut dispatched = 0usize;

    for (i, pdf) in pdfs.iter().enumerate() {
        let index = i + 1;
        let stem = input::file_stem(pdf);
        let artifacts = OutputArtifacts::batch_in(out_dir, &stem);

        if config.skip_existing && artifacts.json_path.exists() {
            info!("[{}/{}] {} already processed, skipping", index, total, stem);
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_skipped(index, total, pdf);
            }
            report.skipped.push(pdf.clone());
            continue;
        }

        if dispatched > 0 {
            let delay = pick_delay(config.min_delay_ms, config.max_delay_ms);
            info!("Waiting {:.1}s before the next request", delay.as_secs_f64());
            sleep(delay).await;
        }
        dispatched += 1;

        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, pdf);
        }
        info!("[{}/{}] Parsing {}", index, total, stem);

        let outcome = match parse_to_files(service, pdf, &artifacts, config, Some(&stem)).await {
            Err(e) if e.is_rate_limited() => {
                let wait = e.retry_after_secs().unwrap_or(config.rate_limit_wait_secs);
                warn!("Rate limit reached on {}; retrying once in {}s", stem, wait);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_rate_limited(pdf, wait);
                }
                sleep(Duration::from_secs(wait)).await;
                parse_to_files(service, pdf, &artifacts, config, Some(&stem)).await
            }
            other => other,
        };

        match outcome {
            Ok(outcome) => {
                let preview = outcome
                    .result
                    .preview(config.result_type, BATCH_PREVIEW_CHARS)
                    .unwrap_or_default();
                info!("[{}/{}] {} preview:\n{}", index, total, stem, preview);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(index, total, pdf, &outcome.stats, &preview);
                }
                report.succeeded.push(FileSuccess {
                    path: pdf.clone(),
                    artifacts,
                    stats: outcome.stats,
                });
            }
            Err(e) => {
                let error = e.to_string();
                warn!("[{}/{}] {} failed: {}", index, total, stem, error);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(index, total, pdf, &error);
                }
                report.failed.push(FileFailure {
                    path: pdf.clone(),
                    error,
                });
            }
        }
    }

    info!(
        "Batch complete: {} parsed, {} skipped, {} failed",
        report.succeeded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(&report);
    }
    Ok(report)
}

/// Batch run against the LlamaParse service using environment credentials.
pub async fn run_batch(
    dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<BatchReport, ParseError> {
    let client = LlamaCloudClient::from_env(config)?;
    parse_directory(&client, dir, out_dir, config).await
}

/// Uniform random pause in `[min_ms, max_ms]`.
fn pick_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}
