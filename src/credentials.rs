//! API credentials read from the process environment.
//!
//! The parsing service key is mandatory. Vision-model provider keys are
//! optional: when the configured vendor has a matching key it is forwarded
//! with the upload, otherwise the service falls back to its own account.

use crate::error::ParseError;
use std::fmt;

pub const LLAMA_CLOUD_API_KEY: &str = "LLAMA_CLOUD_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Keys needed to talk to the parsing service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, ParseError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read credentials through an arbitrary lookup.
    ///
    /// Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ParseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = get(LLAMA_CLOUD_API_KEY).ok_or_else(|| ParseError::MissingApiKey {
            var: LLAMA_CLOUD_API_KEY.to_string(),
        })?;

        Ok(Self {
            api_key,
            openai_api_key: get(OPENAI_API_KEY),
            anthropic_api_key: get(ANTHROPIC_API_KEY),
            gemini_api_key: get(GEMINI_API_KEY),
        })
    }

    /// Service key only, no vendor keys.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            openai_api_key: None,
            anthropic_api_key: None,
            gemini_api_key: None,
        }
    }

    /// The provider key matching a vendor name such as `"openai-gpt4o"`.
    pub fn vendor_key_for(&self, vendor: &str) -> Option<&str> {
        let provider = vendor.split('-').next().unwrap_or(vendor).to_ascii_lowercase();
        match provider.as_str() {
            "openai" => self.openai_api_key.as_deref(),
            "anthropic" => self.anthropic_api_key.as_deref(),
            "gemini" => self.gemini_api_key.as_deref(),
            _ => None,
        }
    }
}

fn redact(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "<set>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .finish()
    }
}
