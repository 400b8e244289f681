use crate::models::{CandidateProfile, MatchSummary, Phase, RunSummary};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Observations emitted while a run progresses, always in processing order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    Progress {
        phase: Phase,
        current: usize,
        total: usize,
    },
    ProfileAdded(CandidateProfile),
    DuplicateSkipped {
        document: String,
    },
    ScoreUpdated {
        id: String,
        score: u8,
    },
    IngestionCompleted(RunSummary),
    MatchCompleted(MatchSummary),
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<UnboundedSender<PipelineEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// A sink that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: PipelineEvent) {
        if let Some(sender) = &self.sender {
            // a dropped receiver only means nobody is watching
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
pub(crate) fn drain(receiver: &mut UnboundedReceiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
