//! Configuration types for a parse run.
//!
//! All behaviour is controlled through [`ParseConfig`], built via its
//! [`ParseConfigBuilder`]. The per-file [`ParseRequest`] is derived from the
//! config with [`ParseConfig::request_for`], so every file in a batch is sent
//! with exactly the same options.

use crate::error::ParseError;
use crate::progress::BatchCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default LlamaParse endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.cloud.llamaindex.ai";

/// Which content field of each page is rendered into the markdown artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// The service's markdown rendering of each page (`md`). (default)
    #[default]
    Markdown,
    /// Plain extracted text (`text`).
    Text,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Markdown => "markdown",
            ResultType::Text => "text",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the service needs to know to parse one PDF.
///
/// Immutable once built; one request per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseRequest {
    pub file_path: PathBuf,
    pub result_type: ResultType,
    /// Document language code, e.g. `"ko"`, `"en"`.
    pub language: String,
    /// Service parse mode, e.g. `"parse_page_with_lvm"`.
    pub parse_mode: String,
    /// Multimodal model the service should use, e.g. `"openai-gpt4o"`.
    pub vision_model_vendor: Option<String>,
    pub disable_ocr: bool,
    pub disable_image_extraction: bool,
}

/// Configuration for parsing one file or a directory of files.
///
/// Built via [`ParseConfig::builder()`] or [`ParseConfig::default()`].
///
/// # Example
/// ```rust
/// use llamaparse_md::{ParseConfig, ResultType};
///
/// let config = ParseConfig::builder()
///     .result_type(ResultType::Text)
///     .language("en")
///     .poll_interval_ms(500)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ParseConfig {
    /// Content rendered into the markdown artifact. Default: Markdown.
    pub result_type: ResultType,

    /// Document language code. Default: `"ko"`.
    pub language: String,

    /// Service parse mode. Default: `"parse_page_with_lvm"`.
    pub parse_mode: String,

    /// Vision-model vendor name. Default: `Some("openai-gpt4o")`.
    ///
    /// `None` leaves the choice to the service.
    pub vision_model_vendor: Option<String>,

    /// Ask the service to skip OCR. Default: false.
    pub disable_ocr: bool,

    /// Ask the service not to extract embedded images. Default: false.
    pub disable_image_extraction: bool,

    /// Service root URL. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Delay between job-status polls in milliseconds. Default: 1000.
    pub poll_interval_ms: u64,

    /// Give up waiting for a job after this many seconds. Default: 2000.
    pub max_timeout_secs: u64,

    /// Lower bound of the random pause between batch requests. Default: 1000.
    pub min_delay_ms: u64,

    /// Upper bound of the random pause between batch requests. Default: 3000.
    pub max_delay_ms: u64,

    /// Wait before the single batch retry after HTTP 429, unless the server
    /// sent `Retry-After`. Default: 30.
    pub rate_limit_wait_secs: u64,

    /// Batch mode: skip files whose JSON artifact already exists. Default: true.
    pub skip_existing: bool,

    /// Optional batch progress callback.
    pub progress_callback: Option<BatchCallback>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            result_type: ResultType::default(),
            language: "ko".to_string(),
            parse_mode: "parse_page_with_lvm".to_string(),
            vision_model_vendor: Some("openai-gpt4o".to_string()),
            disable_ocr: false,
            disable_image_extraction: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 1000,
            max_timeout_secs: 2000,
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            rate_limit_wait_secs: 30,
            skip_existing: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("result_type", &self.result_type)
            .field("language", &self.language)
            .field("parse_mode", &self.parse_mode)
            .field("vision_model_vendor", &self.vision_model_vendor)
            .field("disable_ocr", &self.disable_ocr)
            .field("disable_image_extraction", &self.disable_image_extraction)
            .field("base_url", &self.base_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_timeout_secs", &self.max_timeout_secs)
            .field("min_delay_ms", &self.min_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .field("rate_limit_wait_secs", &self.rate_limit_wait_secs)
            .field("skip_existing", &self.skip_existing)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ParseConfig {
    /// Create a new builder for `ParseConfig`.
    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder {
            config: Self::default(),
        }
    }

    /// The request sent for `file_path` under this configuration.
    pub fn request_for(&self, file_path: impl AsRef<Path>) -> ParseRequest {
        ParseRequest {
            file_path: file_path.as_ref().to_path_buf(),
            result_type: self.result_type,
            language: self.language.clone(),
            parse_mode: self.parse_mode.clone(),
            vision_model_vendor: self.vision_model_vendor.clone(),
            disable_ocr: self.disable_ocr,
            disable_image_extraction: self.disable_image_extraction,
        }
    }
}

/// Builder for [`ParseConfig`].
#[derive(Debug)]
pub struct ParseConfigBuilder {
    config: ParseConfig,
}

impl ParseConfigBuilder {
    pub fn result_type(mut self, t: ResultType) -> Self {
        self.config.result_type = t;
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn parse_mode(mut self, mode: impl Into<String>) -> Self {
        self.config.parse_mode = mode.into();
        self
    }

    pub fn vision_model_vendor(mut self, vendor: Option<String>) -> Self {
        self.config.vision_model_vendor = vendor;
        self
    }

    pub fn disable_ocr(mut self, v: bool) -> Self {
        self.config.disable_ocr = v;
        self
    }

    pub fn disable_image_extraction(mut self, v: bool) -> Self {
        self.config.disable_image_extraction = v;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn max_timeout_secs(mut self, secs: u64) -> Self {
        self.config.max_timeout_secs = secs;
        self
    }

    pub fn delay_range_ms(mut self, min: u64, max: u64) -> Self {
        self.config.min_delay_ms = min;
        self.config.max_delay_ms = max;
        self
    }

    pub fn rate_limit_wait_secs(mut self, secs: u64) -> Self {
        self.config.rate_limit_wait_secs = secs;
        self
    }

    pub fn skip_existing(mut self, v: bool) -> Self {
        self.config.skip_existing = v;
        self
    }

    pub fn progress_callback(mut self, cb: BatchCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ParseConfig, ParseError> {
        let c = &self.config;
        if c.language.trim().is_empty() {
            return Err(ParseError::InvalidConfig("language must not be empty".into()));
        }
        if c.parse_mode.trim().is_empty() {
            return Err(ParseError::InvalidConfig("parse mode must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(ParseError::InvalidConfig(format!(
                "base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.poll_interval_ms == 0 {
            return Err(ParseError::InvalidConfig(
                "poll interval must be ≥ 1 ms".into(),
            ));
        }
        if c.max_timeout_secs == 0 {
            return Err(ParseError::InvalidConfig("max timeout must be ≥ 1 s".into()));
        }
        if c.min_delay_ms > c.max_delay_ms {
            return Err(ParseError::InvalidConfig(format!(
                "delay range is inverted: {}ms > {}ms",
                c.min_delay_ms, c.max_delay_ms
            )));
        }
        Ok(self.config)
    }
}
