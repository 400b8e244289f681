use crate::error::ExtractionError;
use crate::inference::{ContentPart, InferenceClient, InferenceRequest};
use crate::models::{CandidateProfile, Document};
use crate::prompts::{profile_schema, EXTRACTION_PROMPT};
use crate::traits::InferenceBackend;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// A document-level extraction failure, carrying the document's display name.
#[derive(Debug)]
pub struct DocumentFailure {
    pub document: String,
    pub reason: ExtractionError,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractedFields {
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_age")]
    age: Option<u32>,
    #[serde(default)]
    governorate: Option<String>,
    #[serde(default)]
    applied_for: Option<String>,
    skills: Vec<String>,
    experience_summary: String,
}

pub struct ProfileExtractor<'a, B> {
    client: &'a InferenceClient<B>,
}

impl<'a, B> ProfileExtractor<'a, B>
where
    B: InferenceBackend + Send + Sync,
{
    pub fn new(client: &'a InferenceClient<B>) -> Self {
        Self { client }
    }

    pub async fn extract(&self, document: &Document) -> Result<CandidateProfile, DocumentFailure> {
        self.try_extract(document)
            .await
            .map_err(|reason| DocumentFailure {
                document: document.name.clone(),
                reason,
            })
    }

    async fn try_extract(&self, document: &Document) -> Result<CandidateProfile, ExtractionError> {
        if document.bytes.is_empty() {
            return Err(ExtractionError::Encoding(format!(
                "{} has no content",
                document.name
            )));
        }

        let request = InferenceRequest {
            parts: vec![
                ContentPart::inline(document.media_type.clone(), &document.bytes),
                ContentPart::text(EXTRACTION_PROMPT),
            ],
            schema: profile_schema(),
        };

        let text = self.client.generate(&request).await?;
        let fields = parse_profile(&text)?;
        debug!(document = %document.name, skills = fields.skills.len(), "profile extracted");

        Ok(CandidateProfile {
            id: Uuid::new_v4().to_string(),
            name: non_blank(Some(fields.name)),
            email: non_blank(fields.email),
            phone: non_blank(fields.phone),
            age: fields.age,
            governorate: non_blank(fields.governorate),
            applied_for: non_blank(fields.applied_for),
            skills: fields
                .skills
                .into_iter()
                .filter(|skill| !skill.trim().is_empty())
                .collect(),
            experience_summary: fields.experience_summary,
            match_score: None,
            source_document: document.clone(),
        })
    }
}

fn parse_profile(text: &str) -> Result<ExtractedFields, ExtractionError> {
    serde_json::from_str(strip_json_fences(text))
        .map_err(|error| ExtractionError::Malformed(error.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|age| *age >= 0.0).map(|age| age.round() as u64))
            .and_then(|age| u32::try_from(age).ok()),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Strips ```json ... ``` or ``` ... ``` fences some models wrap around JSON.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}
