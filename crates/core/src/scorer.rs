use crate::config::PipelineOptions;
use crate::error::{ExtractionError, PipelineError};
use crate::events::{EventSink, PipelineEvent};
use crate::extractor::strip_json_fences;
use crate::inference::{ContentPart, InferenceClient, InferenceRequest};
use crate::models::{CandidateProfile, JobDescription, MatchSummary, Phase};
use crate::profile_set::ProfileSet;
use crate::prompts::{score_schema, scoring_prompt};
use crate::traits::InferenceBackend;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

pub struct MatchScorer<'a, B> {
    client: &'a InferenceClient<B>,
    options: &'a PipelineOptions,
    events: &'a EventSink,
}

impl<'a, B> MatchScorer<'a, B>
where
    B: InferenceBackend + Send + Sync,
{
    pub fn new(client: &'a InferenceClient<B>, options: &'a PipelineOptions, events: &'a EventSink) -> Self {
        Self {
            client,
            options,
            events,
        }
    }

    pub async fn score(
        &self,
        job: &JobDescription,
        profiles: &mut ProfileSet,
    ) -> Result<MatchSummary, PipelineError> {
        if job.as_str().trim().is_empty() {
            return Err(PipelineError::Validation(
                "job description is empty".to_string(),
            ));
        }
        if profiles.is_empty() {
            return Err(PipelineError::Validation(
                "there are no candidate profiles to score".to_string(),
            ));
        }
        if !self.client.is_configured() {
            return Err(PipelineError::Configuration(
                "inference backend is not configured".to_string(),
            ));
        }

        let started_at = Utc::now();
        // built up front, the set is re-sorted after every score
        let pending: Vec<_> = profiles
            .iter()
            .map(|profile| {
                (
                    profile.id.clone(),
                    profile.display_name().to_string(),
                    scoring_request(job, profile),
                )
            })
            .collect();
        let total = pending.len();
        info!(profiles = total, "match pass started");

        let mut scored = 0;
        for (index, (id, candidate, request)) in pending.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.options.pacing_delay).await;
            }

            self.events.emit(PipelineEvent::Progress {
                phase: Phase::Matching,
                current: index + 1,
                total,
            });

            let score = match self.request_score(&request).await {
                Ok(score) => score,
                Err(source) => {
                    let error = PipelineError::Candidate { candidate, source };
                    warn!(error = %error, "match pass aborted");
                    self.events.emit(PipelineEvent::Failed {
                        message: error.to_string(),
                    });
                    return Err(error);
                }
            };

            profiles.upsert_and_resort(&id, score);
            scored += 1;
            debug!(candidate = %candidate, score, "candidate scored");
            self.events.emit(PipelineEvent::ScoreUpdated { id, score });
        }

        let summary = MatchSummary {
            scored,
            started_at,
            finished_at: Utc::now(),
        };
        info!(scored, "match pass completed");
        self.events.emit(PipelineEvent::MatchCompleted(summary.clone()));
        Ok(summary)
    }

    async fn request_score(&self, request: &InferenceRequest) -> Result<u8, ExtractionError> {
        let text = self.client.generate(request).await?;
        parse_score(&text)
    }
}

fn scoring_request(job: &JobDescription, profile: &CandidateProfile) -> InferenceRequest {
    InferenceRequest {
        parts: vec![ContentPart::text(scoring_prompt(
            job.as_str(),
            &profile.skills_list(),
            &profile.experience_summary,
        ))],
        schema: score_schema(),
    }
}

/// Reads `matchScore`, rounding fractional values and clamping to 0..=100.
fn parse_score(text: &str) -> Result<u8, ExtractionError> {
    let payload: Value = serde_json::from_str(strip_json_fences(text))
        .map_err(|error| ExtractionError::Malformed(error.to_string()))?;

    let raw = payload
        .get("matchScore")
        .and_then(Value::as_f64)
        .ok_or_else(|| ExtractionError::Malformed("matchScore is missing or not a number".to_string()))?;

    Ok(raw.round().clamp(0.0, 100.0) as u8)
}
