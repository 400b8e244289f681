use crate::config::GeminiConfig;
use crate::error::InferenceError;
use crate::inference::{ContentPart, InferenceRequest};
use crate::traits::InferenceBackend;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct GeminiBackend {
    config: GeminiConfig,
    client: Client,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

fn request_body(request: &InferenceRequest) -> Value {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::InlineData { mime_type, data } => json!({
                "inline_data": { "mime_type": mime_type, "data": data }
            }),
            ContentPart::Text(text) => json!({ "text": text }),
        })
        .collect::<Vec<_>>();

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema,
        }
    })
}

fn response_text(payload: &Value) -> Result<String, InferenceError> {
    let text = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(InferenceError::EmptyResponse);
    }
    Ok(text)
}

/// Builds the error for a non-success reply, keeping the service's status word
/// (for example `RESOURCE_EXHAUSTED`) in the message so it can be classified.
fn api_error(status: u16, body: &str) -> InferenceError {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let error = parsed.as_ref().and_then(|value| value.get("error"));

    let message = match error {
        Some(error) => {
            let code = error.get("status").and_then(Value::as_str).unwrap_or_default();
            let text = error.get("message").and_then(Value::as_str).unwrap_or_default();
            if code.is_empty() {
                text.to_string()
            } else {
                format!("{code}: {text}")
            }
        }
        None => body.trim().to_string(),
    };

    InferenceError::Api { status, message }
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty() && !self.config.model.trim().is_empty()
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        if !self.is_configured() {
            return Err(InferenceError::NotConfigured(
                "api key or model is missing".to_string(),
            ));
        }

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let payload: Value = response.json().await?;
        response_text(&payload)
    }
}
