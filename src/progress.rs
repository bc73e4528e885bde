//! Progress-callback trait for batch runs.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ParseConfigBuilder::progress_callback`] to receive events
//! as [`crate::run::parse_directory`] works through a folder of PDFs. The CLI
//! uses it to drive a progress bar; library users can forward events to logs,
//! channels, or a UI without the library knowing how.
//!
//! # Example
//!
//! ```rust
//! use llamaparse_md::{BatchProgressCallback, ParseConfig, ParseStats};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, path: &Path, stats: &ParseStats, _preview: &str) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{index}/{total}] {} ({} pages)", path.display(), stats.total_pages);
//!     }
//! }
//!
//! let config = ParseConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ParseStats;
use crate::run::BatchReport;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch runner as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the directory has been scanned.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is uploaded.
    fn on_file_start(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when a file is skipped because its output already exists.
    fn on_file_skipped(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when the service answered 429 and the runner is about to wait
    /// `wait_secs` before its single retry.
    fn on_rate_limited(&self, path: &Path, wait_secs: u64) {
        let _ = (path, wait_secs);
    }

    /// Called when a file was parsed and both artifacts were written.
    ///
    /// `preview` is the start of the first page's content (see
    /// [`crate::output::BATCH_PREVIEW_CHARS`]), empty when that page has none.
    fn on_file_complete(
        &self,
        index: usize,
        total: usize,
        path: &Path,
        stats: &ParseStats,
        preview: &str,
    ) {
        let _ = (index, total, path, stats, preview);
    }

    /// Called when a file failed; the batch continues with the next one.
    fn on_file_error(&self, index: usize, total: usize, path: &Path, error: &str) {
        let _ = (index, total, path, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, report: &BatchReport) {
        let _ = report;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ParseConfig`].
pub type BatchCallback = Arc<dyn BatchProgressCallback>;
