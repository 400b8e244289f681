use crate::config::PipelineOptions;
use crate::error::PipelineError;
use crate::events::{EventSink, PipelineEvent};
use crate::filter::filter_profiles;
use crate::inference::InferenceClient;
use crate::models::{CandidateProfile, Document, FilterSpec, JobDescription, MatchSummary, RunSummary};
use crate::orchestrator::BatchOrchestrator;
use crate::profile_set::ProfileSet;
use crate::scorer::MatchScorer;
use crate::traits::InferenceBackend;
use tokio::sync::{watch, Mutex};
use tracing::warn;

/// Inference client, profile set and run generation of one screening session.
/// A new ingestion run supersedes whatever run holds the set.
pub struct Session<B> {
    client: InferenceClient<B>,
    options: PipelineOptions,
    profiles: Mutex<ProfileSet>,
    generation: watch::Sender<u64>,
}

impl<B> Session<B>
where
    B: InferenceBackend + Send + Sync,
{
    pub fn new(backend: B, options: PipelineOptions) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            client: InferenceClient::new(backend, options.retry),
            options,
            profiles: Mutex::new(ProfileSet::new()),
            generation,
        }
    }

    pub fn client(&self) -> &InferenceClient<B> {
        &self.client
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub async fn ingest(&self, files: Vec<Document>, events: &EventSink) -> Result<RunSummary, PipelineError> {
        let generation = self.bump_generation();
        let mut watcher = self.generation.subscribe();
        let mut profiles = self.profiles.lock().await;
        if *watcher.borrow_and_update() != generation {
            return Err(self.superseded(events));
        }
        // a rejected run still discards what the superseded one left behind
        profiles.clear();

        let mut run = BatchOrchestrator::new(&self.client, &self.options, events);
        tokio::select! {
            biased;
            _ = newer_run(&mut watcher, generation) => Err(self.superseded(events)),
            result = run.run(files, &mut profiles) => result,
        }
    }

    pub async fn score(&self, job: &JobDescription, events: &EventSink) -> Result<MatchSummary, PipelineError> {
        let mut watcher = self.generation.subscribe();
        let generation = *watcher.borrow_and_update();
        let mut profiles = self.profiles.lock().await;
        if *watcher.borrow_and_update() != generation {
            return Err(self.superseded(events));
        }

        let scorer = MatchScorer::new(&self.client, &self.options, events);
        tokio::select! {
            biased;
            _ = newer_run(&mut watcher, generation) => Err(self.superseded(events)),
            result = scorer.score(job, &mut profiles) => result,
        }
    }

    pub async fn snapshot(&self) -> Vec<CandidateProfile> {
        self.profiles.lock().await.snapshot()
    }

    pub async fn filter(&self, spec: &FilterSpec) -> Vec<CandidateProfile> {
        let profiles = self.profiles.lock().await;
        filter_profiles(&*profiles, spec)
    }

    /// The source document of a profile, for viewing the original file.
    pub async fn document(&self, id: &str) -> Option<Document> {
        self.profiles.lock().await.source_document(id).cloned()
    }

    /// Cancels any in-flight run and releases every profile and document buffer.
    pub async fn clear(&self) {
        self.bump_generation();
        self.profiles.lock().await.clear();
    }

    fn bump_generation(&self) -> u64 {
        let mut current = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            current = *generation;
        });
        current
    }

    fn superseded(&self, events: &EventSink) -> PipelineError {
        let error = PipelineError::Superseded;
        warn!("run superseded by a newer ingestion run");
        events.emit(PipelineEvent::Failed {
            message: error.to_string(),
        });
        error
    }
}

/// Resolves once the generation moves past `generation`.
async fn newer_run(watcher: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if *watcher.borrow_and_update() != generation {
            return;
        }
        if watcher.changed().await.is_err() {
            // the session is gone, nothing can supersede this run any more
            std::future::pending::<()>().await;
        }
    }
}
