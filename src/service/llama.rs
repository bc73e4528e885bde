//! LlamaParse REST client.
//!
//! A parse is three calls against the service:
//!
//! ```text
//! POST /api/parsing/upload             multipart PDF + options → { id }
//! GET  /api/parsing/job/{id}           poll until SUCCESS / ERROR
//! GET  /api/parsing/job/{id}/result/json                      → { pages, job_metadata }
//! ```
//!
//! Every call is authenticated with `Authorization: Bearer <LLAMA_CLOUD_API_KEY>`.
//! Non-success HTTP statuses are mapped to [`ParseError`] variants by
//! [`classify_status`]; nothing here retries.

use crate::config::{ParseConfig, ParseRequest};
use crate::credentials::Credentials;
use crate::error::ParseError;
use crate::output::{ParseResult, ParsedDocument};
use crate::service::ParseService;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::Deserialize;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

/// Client for the LlamaParse cloud API.
#[derive(Debug, Clone)]
pub struct LlamaCloudClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    poll_interval: Duration,
    max_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Terminal and non-terminal job states.
#[derive(Debug, PartialEq, Eq)]
enum JobState {
    Done,
    Failed,
    Running,
}

fn job_state(status: &str) -> JobState {
    match status.to_ascii_uppercase().as_str() {
        "SUCCESS" | "PARTIAL_SUCCESS" => JobState::Done,
        "ERROR" | "CANCELED" | "CANCELLED" => JobState::Failed,
        _ => JobState::Running,
    }
}

impl LlamaCloudClient {
    /// Build a client from explicit credentials.
    pub fn new(credentials: Credentials, config: &ParseConfig) -> Result<Self, ParseError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("llamaparse-md/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ParseError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_timeout: Duration::from_secs(config.max_timeout_secs),
        })
    }

    /// Build a client with credentials from the process environment.
    ///
    /// Fails with [`ParseError::MissingApiKey`] before any network I/O when
    /// `LLAMA_CLOUD_API_KEY` is unset.
    pub fn from_env(config: &ParseConfig) -> Result<Self, ParseError> {
        Self::new(Credentials::from_env()?, config)
    }

    /// Build a client with credentials from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, config: &ParseConfig) -> Result<Self, ParseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(Credentials::from_lookup(lookup)?, config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn upload_url(&self) -> String {
        format!("{}/api/parsing/upload", self.base_url)
    }

    fn job_url(&self, job_id: &str) -> String {
        format!("{}/api/parsing/job/{}", self.base_url, job_id)
    }

    fn result_url(&self, job_id: &str) -> String {
        format!("{}/api/parsing/job/{}/result/json", self.base_url, job_id)
    }

    /// Upload the PDF and return the job id.
    async fn upload(&self, request: &ParseRequest) -> Result<String, ParseError> {
        let path = &request.file_path;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ParseError::ReadFailed {
                path: path.clone(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;

        let mut form = Form::new().part("file", part);
        for (name, value) in form_fields(request, &self.credentials) {
            form = form.text(name, value);
        }

        let response = self
            .http
            .post(self.upload_url())
            .bearer_auth(&self.credentials.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;

        let upload: UploadResponse = check_status(response).await?.json().await?;
        debug!(
            "Upload accepted: job {} ({})",
            upload.id,
            upload.status.as_deref().unwrap_or("unknown")
        );
        Ok(upload.id)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ParseError> {
        let response = self
            .http
            .get(self.job_url(job_id))
            .bearer_auth(&self.credentials.api_key)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Poll until the job reaches a terminal state or the ceiling is hit.
    async fn wait_for_job(&self, job_id: &str) -> Result<(), ParseError> {
        let start = Instant::now();
        loop {
            let status = self.job_status(job_id).await?;
            match job_state(&status.status) {
                JobState::Done => return Ok(()),
                JobState::Failed => {
                    let detail = status
                        .error_message
                        .or(status.error_code)
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(ParseError::JobFailed {
                        job_id: job_id.to_string(),
                        status: status.status,
                        detail,
                    });
                }
                JobState::Running => {
                    debug!("Job {} is {}", job_id, status.status);
                }
            }

            if start.elapsed() >= self.max_timeout {
                return Err(ParseError::JobTimeout {
                    job_id: job_id.to_string(),
                    secs: self.max_timeout.as_secs(),
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn fetch_json_result(&self, job_id: &str) -> Result<ParsedDocument, ParseError> {
        let response = self
            .http
            .get(self.result_url(job_id))
            .bearer_auth(&self.credentials.api_key)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

#[async_trait]
impl ParseService for LlamaCloudClient {
    fn name(&self) -> &str {
        "llamaparse"
    }

    async fn parse(&self, request: &ParseRequest) -> Result<ParseResult, ParseError> {
        info!(
            "Uploading {} (mode={}, language={}, vendor={})",
            request.file_path.display(),
            request.parse_mode,
            request.language,
            request.vision_model_vendor.as_deref().unwrap_or("-")
        );
        let job_id = self.upload(request).await?;
        self.wait_for_job(&job_id).await?;

        let mut doc = self.fetch_json_result(&job_id).await?;
        doc.insert_if_absent("job_id", job_id);
        doc.insert_if_absent("file_path", request.file_path.to_string_lossy().into_owned());
        Ok(ParseResult::single(doc))
    }
}

/// Text fields sent with the upload, in a stable order.
pub fn form_fields(request: &ParseRequest, credentials: &Credentials) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("language", request.language.clone()),
        ("parse_mode", request.parse_mode.clone()),
    ];
    if let Some(ref vendor) = request.vision_model_vendor {
        fields.push(("vendor_multimodal_model_name", vendor.clone()));
        if let Some(key) = credentials.vendor_key_for(vendor) {
            fields.push(("vendor_multimodal_api_key", key.to_string()));
        }
    }
    fields.push(("disable_ocr", request.disable_ocr.to_string()));
    fields.push((
        "disable_image_extraction",
        request.disable_image_extraction.to_string(),
    ));
    fields
}

/// Pass 2xx responses through; turn everything else into a [`ParseError`].
async fn check_status(response: Response) -> Result<Response, ParseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = retry_after_secs(response.headers());
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status.as_u16(), retry_after, body))
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Map a non-success HTTP status to the matching error variant.
pub fn classify_status(status: u16, retry_after_secs: Option<u64>, body: String) -> ParseError {
    let detail = if body.trim().is_empty() {
        "(empty body)".to_string()
    } else {
        body.trim().to_string()
    };
    match status {
        401 | 403 => ParseError::AuthFailed { status, detail },
        429 => ParseError::RateLimited { retry_after_secs },
        400 | 415 | 422 => ParseError::DocumentRejected { status, detail },
        _ => ParseError::ServiceStatus { status, detail },
    }
}
