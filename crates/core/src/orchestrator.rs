use crate::archive::expand_inputs;
use crate::config::PipelineOptions;
use crate::dedup::Deduplicator;
use crate::error::PipelineError;
use crate::events::{EventSink, PipelineEvent};
use crate::extractor::ProfileExtractor;
use crate::inference::InferenceClient;
use crate::models::{Document, Phase, RunSummary};
use crate::profile_set::ProfileSet;
use crate::traits::InferenceBackend;
use chrono::Utc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Preparing,
    Extracting,
    Completed,
    Aborted,
}

/// One ingestion run. The first failing document aborts it.
pub struct BatchOrchestrator<'a, B> {
    client: &'a InferenceClient<B>,
    options: &'a PipelineOptions,
    events: &'a EventSink,
    state: RunState,
    dedup: Deduplicator,
    extracted: usize,
    unique: usize,
}

impl<'a, B> BatchOrchestrator<'a, B>
where
    B: InferenceBackend + Send + Sync,
{
    pub fn new(client: &'a InferenceClient<B>, options: &'a PipelineOptions, events: &'a EventSink) -> Self {
        Self {
            client,
            options,
            events,
            state: RunState::Idle,
            dedup: Deduplicator::new(),
            extracted: 0,
            unique: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn unique(&self) -> usize {
        self.unique
    }

    pub fn duplicates(&self) -> usize {
        self.extracted - self.unique
    }

    pub async fn run(
        &mut self,
        files: Vec<Document>,
        profiles: &mut ProfileSet,
    ) -> Result<RunSummary, PipelineError> {
        if self.state != RunState::Idle {
            return Err(PipelineError::Validation(
                "an ingestion run can only be started once".to_string(),
            ));
        }
        if files.is_empty() {
            return Err(self.abort(PipelineError::Validation(
                "no files were selected".to_string(),
            )));
        }
        if !self.client.is_configured() {
            return Err(self.abort(PipelineError::Configuration(
                "inference backend is not configured".to_string(),
            )));
        }

        let started_at = Utc::now();
        profiles.clear();
        self.state = RunState::Preparing;

        let documents = match expand_inputs(files).await {
            Ok(documents) => documents,
            Err(error) => return Err(self.abort(error)),
        };

        self.state = RunState::Extracting;
        let total = documents.len();
        info!(documents = total, "ingestion started");

        let extractor = ProfileExtractor::new(self.client);
        for (index, document) in documents.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.options.pacing_delay).await;
            }

            self.events.emit(PipelineEvent::Progress {
                phase: Phase::Ingestion,
                current: index + 1,
                total,
            });
            debug!(document = %document.name, current = index + 1, total, "extracting profile");

            let profile = match extractor.extract(document).await {
                Ok(profile) => profile,
                Err(failure) => {
                    return Err(self.abort(PipelineError::Document {
                        document: failure.document,
                        source: failure.reason,
                    }))
                }
            };

            self.extracted += 1;
            if self.dedup.is_new(&profile) {
                self.unique += 1;
                self.events.emit(PipelineEvent::ProfileAdded(profile.clone()));
                profiles.push(profile);
            } else {
                debug!(document = %document.name, "duplicate candidate skipped");
                self.events.emit(PipelineEvent::DuplicateSkipped {
                    document: document.name.clone(),
                });
            }
        }

        self.state = RunState::Completed;
        let summary = RunSummary {
            documents: total,
            unique: self.unique,
            duplicates: self.duplicates(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            unique = summary.unique,
            duplicates = summary.duplicates,
            "ingestion completed"
        );
        self.events
            .emit(PipelineEvent::IngestionCompleted(summary.clone()));

        Ok(summary)
    }

    fn abort(&mut self, error: PipelineError) -> PipelineError {
        self.state = RunState::Aborted;
        warn!(error = %error, "ingestion aborted");
        self.events.emit(PipelineEvent::Failed {
            message: error.to_string(),
        });
        error
    }
}
