use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const ARCHIVE_EXTENSION: &str = "zip";

pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "csv"];

/// A named blob with its media type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    pub media_type: String,
    #[serde(skip_serializing)]
    pub bytes: Arc<[u8]>,
}

impl Document {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let declared = media_type.into();
        let media_type = if declared.trim().is_empty() {
            media_type_for(&name).to_string()
        } else {
            declared
        };

        Self {
            name,
            media_type,
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    pub fn is_archive(&self) -> bool {
        self.extension().as_deref() == Some(ARCHIVE_EXTENSION)
    }

    pub fn is_supported_document(&self) -> bool {
        is_supported_document_name(&self.name)
    }
}

pub fn extension_of(name: &str) -> Option<String> {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() && extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

pub fn is_supported_document_name(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
}

pub fn media_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("csv") => "text/csv",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub governorate: Option<String>,
    pub applied_for: Option<String>,
    pub skills: Vec<String>,
    pub experience_summary: String,
    pub match_score: Option<u8>,
    pub source_document: Document,
}

impl CandidateProfile {
    /// Human-readable label for messages: the name when known, else the source file.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.source_document.name.as_str())
    }

    pub fn skills_list(&self) -> String {
        if self.skills.is_empty() {
            "none listed".to_string()
        } else {
            self.skills.join(", ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription(String);

impl JobDescription {
    pub fn new(text: impl Into<String>) -> Result<Self, PipelineError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::Validation(
                "job description is empty".to_string(),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FilterSpec {
    pub job: String,
    pub governorate: String,
    pub age: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Ingestion,
    Matching,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub documents: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub scored: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
