use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference backend is not configured: {0}")]
    NotConfigured(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference request failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("inference response had no text content")]
    EmptyResponse,

    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl InferenceError {
    /// Rate-limit class failures: HTTP 429 or a resource-exhaustion marker.
    pub fn is_retriable(&self) -> bool {
        match self {
            InferenceError::Api { status, message } => {
                *status == 429 || signals_resource_exhaustion(message)
            }
            _ => false,
        }
    }
}

fn signals_resource_exhaustion(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("resource_exhausted") || lowered.contains("resource exhausted")
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document could not be encoded: {0}")]
    Encoding(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("corrupt archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive entry {name} could not be read: {details}")]
    Entry { name: String, details: String },

    #[error("archive nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("archive task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to expand {file}: {source}")]
    Archive {
        file: String,
        #[source]
        source: ArchiveError,
    },

    #[error("failed to analyze {document}: {source}")]
    Document {
        document: String,
        #[source]
        source: ExtractionError,
    },

    #[error("failed to score {candidate}: {source}")]
    Candidate {
        candidate: String,
        #[source]
        source: ExtractionError,
    },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("run was superseded by a newer ingestion run")]
    Superseded,
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_retriable() {
        let error = InferenceError::Api {
            status: 429,
            message: "Too Many Requests".to_string(),
        };
        assert!(error.is_retriable());
    }

    #[test]
    fn resource_exhausted_marker_is_retriable_regardless_of_status() {
        let error = InferenceError::Api {
            status: 503,
            message: "RESOURCE_EXHAUSTED: quota exceeded".to_string(),
        };
        assert!(error.is_retriable());

        let error = InferenceError::Api {
            status: 500,
            message: "Resource exhausted for project".to_string(),
        };
        assert!(error.is_retriable());
    }

    #[test]
    fn other_failures_are_terminal() {
        let error = InferenceError::Api {
            status: 400,
            message: "INVALID_ARGUMENT: unsupported mime type".to_string(),
        };
        assert!(!error.is_retriable());
        assert!(!InferenceError::EmptyResponse.is_retriable());
        assert!(!InferenceError::RetriesExhausted {
            attempts: 4,
            last: "429".to_string()
        }
        .is_retriable());
    }
}
