pub mod archive;
pub mod backends;
pub mod config;
pub mod dedup;
pub mod error;
pub mod events;
pub mod extractor;
pub mod filter;
pub mod inference;
pub mod models;
pub mod orchestrator;
pub mod profile_set;
pub mod prompts;
pub mod scorer;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use archive::{expand_archive, expand_inputs, MAX_NESTING_DEPTH};
pub use backends::GeminiBackend;
pub use config::{GeminiConfig, PipelineOptions};
pub use dedup::{Deduplicator, IdentityKey};
pub use error::{ArchiveError, ExtractionError, InferenceError, PipelineError};
pub use events::{EventSink, PipelineEvent};
pub use extractor::{DocumentFailure, ProfileExtractor};
pub use filter::{filter_profiles, matches_spec};
pub use inference::{ContentPart, InferenceClient, InferenceRequest, RetryPolicy};
pub use models::{
    media_type_for, CandidateProfile, Document, FilterSpec, JobDescription, MatchSummary, Phase,
    RunSummary, ARCHIVE_EXTENSION, DOCUMENT_EXTENSIONS,
};
pub use orchestrator::{BatchOrchestrator, RunState};
pub use profile_set::ProfileSet;
pub use scorer::MatchScorer;
pub use session::Session;
pub use traits::InferenceBackend;
