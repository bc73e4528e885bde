//! CLI binary for llamaparse-md.
//!
//! A thin shim over the library crate that maps CLI flags to `ParseConfig`,
//! runs a single file or a whole directory, and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use llamaparse_md::output::{truncate_chars, SINGLE_PREVIEW_CHARS};
use llamaparse_md::{
    run_batch, run_single, BatchCallback, BatchProgressCallback, BatchReport, OutputArtifacts,
    ParseConfig, ParseOutcome, ParseStats, ResultType, DEFAULT_BASE_URL,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress for batch runs: one bar over the files plus a log line
/// per file printed above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Parsing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_files} PDF files"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, path: &Path) {
        self.bar.set_message(file_label(path));
    }

    fn on_file_skipped(&self, index: usize, total: usize, path: &Path) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            dim("⏭"),
            index,
            total,
            file_label(path),
            dim("already processed"),
        ));
        self.bar.inc(1);
    }

    fn on_rate_limited(&self, path: &Path, wait_secs: u64) {
        self.bar.println(format!(
            "  {} {}  rate limited, retrying in {}s",
            cyan("⏳"),
            file_label(path),
            wait_secs
        ));
    }

    fn on_file_complete(
        &self,
        index: usize,
        total: usize,
        path: &Path,
        stats: &ParseStats,
        preview: &str,
    ) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            file_label(path),
            dim(&format!("{:>3} pages {:>7} chars", stats.total_pages, stats.total_chars)),
            dim(&format!("{:.1}s", stats.elapsed_ms as f64 / 1000.0)),
        ));
        for line in preview.lines().filter(|l| !l.trim().is_empty()) {
            self.bar.println(format!("        {}", dim(line)));
        }
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, path: &Path, error: &str) {
        // Keep the log line on one row.
        let first_line = error.lines().next().unwrap_or("");
        let msg = truncate_chars(first_line, 80);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            file_label(path),
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse one file into ./parsed_result.json and ./parsed_result.md
  llamaparse-md data/CVM_articles.pdf

  # Choose output paths
  llamaparse-md paper.pdf --json-out out/paper.json --md-out out/paper.md

  # Plain text, English, no vision model
  llamaparse-md --result-type text --language en --no-vendor-model paper.pdf

  # Parse every PDF in data/ into data/parsed/<name>_parsed.{json,md}
  llamaparse-md data/

  # Re-parse files that already have output
  llamaparse-md --force data/

ENVIRONMENT VARIABLES:
  LLAMA_CLOUD_API_KEY     LlamaParse API key (required)
  OPENAI_API_KEY          Forwarded when the vendor model is openai-*
  ANTHROPIC_API_KEY       Forwarded when the vendor model is anthropic-*
  GEMINI_API_KEY          Forwarded when the vendor model is gemini-*
  LLAMA_CLOUD_BASE_URL    Override the service endpoint
  RUST_LOG                Log filter (overrides -v / -q)

  Variables are also read from a .env file in the working directory.
"#;

/// Parse PDF files with the LlamaParse cloud service.
#[derive(Parser, Debug)]
#[command(
    name = "llamaparse-md",
    version,
    about = "Parse PDF files with LlamaParse and save the result as JSON and Markdown",
    long_about = "Upload a PDF (or every PDF in a directory) to the LlamaParse document-parsing \
service and write the returned structure to a JSON file and the page content to a Markdown file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file, or a directory of PDFs for batch mode.
    input: PathBuf,

    /// JSON output path (single-file mode).
    #[arg(long, env = "LLAMAPARSE_JSON_OUT", default_value = "parsed_result.json")]
    json_out: PathBuf,

    /// Markdown output path (single-file mode).
    #[arg(long, env = "LLAMAPARSE_MD_OUT", default_value = "parsed_result.md")]
    md_out: PathBuf,

    /// Output directory (batch mode). Default: <INPUT>/parsed.
    #[arg(short, long, env = "LLAMAPARSE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Page content written to the markdown file.
    #[arg(long, env = "LLAMAPARSE_RESULT_TYPE", value_enum, default_value = "markdown")]
    result_type: ResultTypeArg,

    /// Document language code.
    #[arg(long, env = "LLAMAPARSE_LANGUAGE", default_value = "ko")]
    language: String,

    /// Service parse mode.
    #[arg(long, env = "LLAMAPARSE_PARSE_MODE", default_value = "parse_page_with_lvm")]
    parse_mode: String,

    /// Vision-model vendor used by the service.
    #[arg(long, env = "LLAMAPARSE_VENDOR_MODEL", default_value = "openai-gpt4o")]
    vendor_model: String,

    /// Let the service pick the vision model (overrides --vendor-model).
    #[arg(long)]
    no_vendor_model: bool,

    /// Ask the service to skip OCR.
    #[arg(long, env = "LLAMAPARSE_DISABLE_OCR")]
    disable_ocr: bool,

    /// Ask the service not to extract embedded images.
    #[arg(long, env = "LLAMAPARSE_DISABLE_IMAGE_EXTRACTION")]
    disable_image_extraction: bool,

    /// Service endpoint.
    #[arg(long, env = "LLAMA_CLOUD_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Job-status poll interval in milliseconds.
    #[arg(long, env = "LLAMAPARSE_POLL_INTERVAL", default_value_t = 1000)]
    poll_interval: u64,

    /// Give up on a job after this many seconds.
    #[arg(long, env = "LLAMAPARSE_MAX_TIMEOUT", default_value_t = 2000)]
    max_timeout: u64,

    /// Minimum pause between batch requests in milliseconds.
    #[arg(long, env = "LLAMAPARSE_MIN_DELAY", default_value_t = 1000)]
    min_delay: u64,

    /// Maximum pause between batch requests in milliseconds.
    #[arg(long, env = "LLAMAPARSE_MAX_DELAY", default_value_t = 3000)]
    max_delay: u64,

    /// Seconds to wait before retrying a rate-limited batch file.
    #[arg(long, env = "LLAMAPARSE_RATE_LIMIT_WAIT", default_value_t = 30)]
    rate_limit_wait: u64,

    /// Batch mode: re-parse files whose output already exists.
    #[arg(long)]
    force: bool,

    /// Print the stats (single) or report (batch) as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the batch progress bar.
    #[arg(long, env = "LLAMAPARSE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LLAMAPARSE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LLAMAPARSE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ResultTypeArg {
    Markdown,
    Text,
}

impl From<ResultTypeArg> for ResultType {
    fn from(v: ResultTypeArg) -> Self {
        match v {
            ResultTypeArg::Markdown => ResultType::Markdown,
            ResultTypeArg::Text => ResultType::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so env-backed flags see .env values.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let batch = cli.input.is_dir();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<BatchCallback> = if show_progress {
        Some(CliProgressCallback::new() as BatchCallback)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    if batch {
        run_batch_mode(&cli, &config).await
    } else {
        run_single_mode(&cli, &config).await
    }
}

async fn run_single_mode(cli: &Cli, config: &ParseConfig) -> Result<()> {
    let artifacts = OutputArtifacts::new(&cli.json_out, &cli.md_out);

    if !cli.quiet {
        eprintln!("{} Parsing {}", cyan("◆"), bold(&cli.input.display().to_string()));
    }

    let outcome = run_single(&cli.input, &artifacts, config)
        .await
        .context("Parsing failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome.stats).context("Failed to serialise stats")?
        );
    }
    if !cli.quiet {
        print_summary(&outcome, config.result_type, &artifacts);
    }
    Ok(())
}

async fn run_batch_mode(cli: &Cli, config: &ParseConfig) -> Result<()> {
    let out_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| cli.input.join("parsed"));

    let report = run_batch(&cli.input, &out_dir, config)
        .await
        .context("Batch run failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    }

    if !cli.quiet {
        eprintln!(
            "{} {} parsed  {} skipped  {} failed  →  {}",
            if report.failed.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&report.succeeded.len().to_string()),
            report.skipped.len(),
            red(&report.failed.len().to_string()),
            bold(&out_dir.display().to_string()),
        );
        for failure in &report.failed {
            eprintln!("   {} {}: {}", red("✗"), failure.path.display(), failure.error);
        }
    }

    if !report.failed.is_empty() {
        anyhow::bail!("{}/{} files failed", report.failed.len(), report.total());
    }
    Ok(())
}

/// Per-file summary: page count, first-page preview, first items, stats.
fn print_summary(outcome: &ParseOutcome, result_type: ResultType, artifacts: &OutputArtifacts) {
    let stats = &outcome.stats;
    eprintln!("{} Parsed {} pages", green("✔"), bold(&stats.total_pages.to_string()));

    if let Some(first) = outcome.result.pages().first() {
        eprintln!("   First page:   {}", first.number_label());
        if let Some(content) = first.content(result_type) {
            eprintln!("   Length:       {} chars", content.chars().count());
            eprintln!("{}", dim(&"=".repeat(60)));
            eprintln!("{}", truncate_chars(content, SINGLE_PREVIEW_CHARS));
            eprintln!("{}", dim(&"=".repeat(60)));
        }
        for (i, (kind, text)) in first.item_summaries(3).iter().enumerate() {
            eprintln!("   Item {}: {} - {}", i + 1, kind, truncate_chars(text, 100));
        }
    }

    eprintln!("   JSON:         {}", bold(&artifacts.json_path.display().to_string()));
    eprintln!("   Markdown:     {}", bold(&artifacts.markdown_path.display().to_string()));
    eprintln!(
        "   {} chars  /  {} words  in  {}ms",
        dim(&stats.total_chars.to_string()),
        dim(&stats.word_count.to_string()),
        stats.elapsed_ms,
    );
}

/// Map CLI args to `ParseConfig`.
fn build_config(cli: &Cli, progress: Option<BatchCallback>) -> Result<ParseConfig> {
    let vendor = if cli.no_vendor_model {
        None
    } else {
        Some(cli.vendor_model.clone())
    };

    let mut builder = ParseConfig::builder()
        .result_type(cli.result_type.clone().into())
        .language(&cli.language)
        .parse_mode(&cli.parse_mode)
        .vision_model_vendor(vendor)
        .disable_ocr(cli.disable_ocr)
        .disable_image_extraction(cli.disable_image_extraction)
        .base_url(&cli.base_url)
        .poll_interval_ms(cli.poll_interval)
        .max_timeout_secs(cli.max_timeout)
        .delay_range_ms(cli.min_delay, cli.max_delay)
        .rate_limit_wait_secs(cli.rate_limit_wait)
        .skip_existing(!cli.force);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
