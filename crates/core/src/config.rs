use crate::error::PipelineError;
use crate::inference::RetryPolicy;
use std::time::Duration;

pub const DEFAULT_PACING_MS: u64 = 1_000;
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const ENDPOINT_VAR: &str = "GEMINI_ENDPOINT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub retry: RetryPolicy,
    /// Fixed wait between consecutive remote calls of one run.
    pub pacing_delay: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            pacing_delay: Duration::from_millis(DEFAULT_PACING_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PipelineError> {
        let read = |key: &str| {
            lookup(key).and_then(|value| {
                let value = value.trim().to_string();
                if value.is_empty() {
                    None
                } else {
                    Some(value)
                }
            })
        };

        let api_key = read(API_KEY_VAR).ok_or_else(|| {
            PipelineError::Configuration(format!("{API_KEY_VAR} is not set"))
        })?;

        Ok(Self {
            endpoint: read(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
            model: read(MODEL_VAR).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_key,
        })
    }
}
