use crate::error::InferenceError;
use crate::inference::{InferenceRequest, RetryPolicy};
use crate::models::Document;
use crate::PipelineOptions;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use zip::write::SimpleFileOptions;

use crate::traits::InferenceBackend;

/// Backend that replays a fixed script of results and records every request.
#[derive(Clone)]
pub struct ScriptedBackend {
    script: Arc<Mutex<VecDeque<Result<String, InferenceError>>>>,
    requests: Arc<Mutex<Vec<InferenceRequest>>>,
    configured: bool,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, InferenceError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
            configured: true,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(InferenceError::Api {
                status: 500,
                message: "script exhausted".to_string(),
            }))
    }
}

pub fn rate_limited() -> Result<String, InferenceError> {
    Err(InferenceError::Api {
        status: 429,
        message: "RESOURCE_EXHAUSTED".to_string(),
    })
}

pub fn terminal() -> Result<String, InferenceError> {
    Err(InferenceError::Api {
        status: 400,
        message: "INVALID_ARGUMENT".to_string(),
    })
}

pub fn profile_json(name: &str, email: &str, skills: &[&str]) -> Result<String, InferenceError> {
    Ok(json!({
        "name": name,
        "email": email,
        "skills": skills,
        "experienceSummary": format!("{name} has relevant experience"),
    })
    .to_string())
}

pub fn score_json(score: u8) -> Result<String, InferenceError> {
    Ok(json!({ "matchScore": score }).to_string())
}

pub fn pdf(name: &str) -> Document {
    Document::new(name, "application/pdf", format!("%PDF-1.4 {name}").into_bytes())
}

pub fn fast_options() -> PipelineOptions {
    PipelineOptions {
        retry: RetryPolicy {
            max_jitter: Duration::ZERO,
            ..RetryPolicy::default()
        },
        ..PipelineOptions::default()
    }
}

/// Builds an in-memory zip. Names ending in `/` become directory entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

pub fn assert_elapsed(started: Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "elapsed {elapsed:?}, expected about {expected:?}"
    );
}
