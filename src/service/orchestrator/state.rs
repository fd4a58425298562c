//! Pipeline state machine
//!
//! Normal path: `Validating -> Classifying -> Aggregating -> Done`. Rejected input goes
//! straight to `Done`; a failure while classifying or aggregating moves to `Degraded`,
//! which always ends in `Done` whether the emergency pass succeeded or not.

use crate::model::PipelineStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    InputAccepted,
    InputRejected,
    ClassificationsCollected,
    Aggregated,
    Failed,
}

/// Current stage plus every stage visited so far
#[derive(Debug, Clone)]
pub struct Pipeline {
    stage: PipelineStage,
    trace: Vec<PipelineStage>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::Validating,
            trace: vec![PipelineStage::Validating],
        }
    }

    pub fn trace(&self) -> &[PipelineStage] {
        &self.trace
    }

    /// Apply an event; events not valid in the current stage are ignored
    pub fn advance(&mut self, event: PipelineEvent) -> PipelineStage {
        match next(self.stage, event) {
            Some(stage) => {
                tracing::debug!(from = ?self.stage, to = ?stage, event = ?event, "Pipeline transition");
                self.stage = stage;
                self.trace.push(stage);
            }
            None => {
                tracing::warn!(stage = ?self.stage, event = ?event, "Ignoring invalid pipeline transition");
            }
        }
        self.stage
    }
}

fn next(stage: PipelineStage, event: PipelineEvent) -> Option<PipelineStage> {
    use PipelineEvent::*;
    use PipelineStage::*;

    match (stage, event) {
        (Validating, InputAccepted) => Some(Classifying),
        (Validating, InputRejected) => Some(Done),
        (Classifying, ClassificationsCollected) => Some(Aggregating),
        (Aggregating, Aggregated) => Some(Done),
        (Classifying | Aggregating, Failed) => Some(Degraded),
        (Degraded, Aggregated | Failed) => Some(Done),
        _ => None,
    }
}
