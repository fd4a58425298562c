//! End-to-end classification pipeline
//!
//! Sequences input validation, sanitization, the specialist fan-out, the final
//! fallback and aggregation. [`Orchestrator::classify`] never fails: pipeline failures
//! move to an emergency single pass, and if that fails too a hard-coded envelope is
//! returned. A sanitizer failure skips the emergency pass, since only sanitized text
//! may reach the capability.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use uuid::Uuid;

use crate::model::{
    AgentDiagnostic, AgentStatus, AnalysisResult, Classification, ClassifierConfig,
    ComplexityLevel, Diagnostics, Envelope, EnvelopeStatus, Taxonomy,
};
use crate::service::agent::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::service::confidence::consensus_confidence;
use crate::service::fallback::FinalFallbackClassifier;
use crate::service::guardrails::input::{self, Severity};
use crate::service::sanitizer::{SanitizerError, TextSanitizer};

pub mod quality;
pub mod state;

use state::{Pipeline, PipelineEvent};

/// Quality signal used when no sanitizer output is available
const NEUTRAL_QUALITY: f64 = 0.5;

#[derive(Debug, Error)]
enum PipelineFailure {
    #[error(transparent)]
    Sanitizer(#[from] SanitizerError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("{agent_id} returned an unexpected outcome")]
    UnexpectedOutcome { agent_id: String },
}

/// Per-request working state
struct Request {
    id: Uuid,
    /// Raw narrative until the sanitizer succeeds, the sanitized text afterwards.
    /// Only the sanitized form is ever handed to an agent.
    narrative: String,
    narrative_quality: f64,
    pipeline: Pipeline,
    diagnostics: Diagnostics,
}

/// How a specialist task ended
#[derive(Debug)]
enum TaskReport {
    Finished(Result<AgentOutcome, AgentError>),
    Panicked(String),
    TimedOut,
}

/// What a specialist slot holds once the fan-out is over
///
/// `Err` carries the join error of a task that never reported.
type Slot = Result<(TaskReport, f64), String>;

pub struct Orchestrator {
    taxonomy: Arc<Taxonomy>,
    specialists: Vec<Arc<dyn Agent>>,
    final_fallback: Arc<FinalFallbackClassifier>,
    coordinator: Arc<dyn Agent>,
    sanitizer: Arc<dyn TextSanitizer>,
    config: ClassifierConfig,
}

impl Orchestrator {
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        specialists: Vec<Arc<dyn Agent>>,
        final_fallback: Arc<FinalFallbackClassifier>,
        coordinator: Arc<dyn Agent>,
        sanitizer: Arc<dyn TextSanitizer>,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            taxonomy,
            specialists,
            final_fallback,
            coordinator,
            sanitizer,
            config,
        }
    }

    /// Classify a raw narrative into a response envelope
    pub async fn classify(&self, narrative: &str) -> Envelope {
        let started = Instant::now();
        let mut request = Request {
            id: Uuid::new_v4(),
            narrative: narrative.to_string(),
            narrative_quality: NEUTRAL_QUALITY,
            pipeline: Pipeline::new(),
            diagnostics: Diagnostics::default(),
        };

        let validation = input::validate(narrative);
        if !validation.valid {
            tracing::info!(
                request_id = %request.id,
                issues = ?validation.issues,
                "Narrative rejected by input guardrail"
            );
            request.pipeline.advance(PipelineEvent::InputRejected);
            request.diagnostics.states = request.pipeline.trace().to_vec();
            return Envelope::rejected(request.id, validation.issues, request.diagnostics);
        }
        if validation.severity == Severity::Warning {
            tracing::warn!(request_id = %request.id, warnings = ?validation.issues, "Narrative looks like spam");
            request.diagnostics.input_warnings = validation.issues;
        }
        request.pipeline.advance(PipelineEvent::InputAccepted);

        let (status, result) = match self.run(&mut request).await {
            Ok(result) => {
                request.pipeline.advance(PipelineEvent::Aggregated);
                (EnvelopeStatus::Success, result)
            }
            Err(PipelineFailure::Sanitizer(e)) => {
                tracing::error!(request_id = %request.id, error = %e, "Sanitizer failed, returning ultimate fallback");
                request.diagnostics.failure = Some(e.to_string());
                request.pipeline.advance(PipelineEvent::Failed);
                (EnvelopeStatus::Fallback, self.ultimate(&mut request))
            }
            Err(e) => {
                tracing::error!(request_id = %request.id, error = %e, "Pipeline failed, running emergency classification");
                request.diagnostics.failure = Some(e.to_string());
                request.pipeline.advance(PipelineEvent::Failed);
                self.degraded(&mut request).await
            }
        };

        request.diagnostics.states = request.pipeline.trace().to_vec();

        tracing::info!(
            request_id = %request.id,
            status = ?status,
            category = %result.primary.category,
            subcategory = %result.primary.subcategory,
            consensus_confidence = result.consensus_confidence,
            elapsed_ms = started.elapsed().as_millis(),
            "Classification complete"
        );

        Envelope::classified(status, request.id, &result, request.diagnostics)
    }

    /// Normal multi-agent path
    async fn run(&self, request: &mut Request) -> Result<AnalysisResult, PipelineFailure> {
        let sanitized = self.sanitizer.cleanse(&request.narrative).await?;
        let assessment = quality::assess(&sanitized, &self.taxonomy);
        if assessment.gibberish {
            tracing::warn!(request_id = %request.id, reasons = ?assessment.reasons, "Narrative flagged as gibberish");
        }
        request.narrative = sanitized.cleaned_text;
        request.narrative_quality = assessment.quality_score;
        request.diagnostics.quality = Some(assessment);

        let mut context = AgentContext::new(request.narrative_quality);
        let (mut classifications, agents) =
            self.run_specialists(&request.narrative, &context).await;
        request.diagnostics.agents = agents;

        if classifications.is_empty() {
            tracing::info!(request_id = %request.id, "No specialist produced a classification, running final fallback");
            request.diagnostics.final_fallback_used = true;

            let started = Instant::now();
            let agent_id = self.final_fallback.agent_id().to_string();
            match self.final_fallback.process(&request.narrative, &context).await? {
                AgentOutcome::Classified(c) => {
                    request.diagnostics.agents.push(AgentDiagnostic {
                        agent_id,
                        status: AgentStatus::Success,
                        detail: warnings_detail(&c),
                        used_fallback: Some(c.used_fallback),
                        processing_time: started.elapsed().as_secs_f64(),
                    });
                    classifications.push(c);
                }
                _ => return Err(PipelineFailure::UnexpectedOutcome { agent_id }),
            }
        }

        request.pipeline.advance(PipelineEvent::ClassificationsCollected);

        context.classifications = classifications;
        self.aggregate(&request.narrative, &context).await
    }

    async fn aggregate(
        &self,
        narrative: &str,
        context: &AgentContext,
    ) -> Result<AnalysisResult, PipelineFailure> {
        match self.coordinator.process(narrative, context).await? {
            AgentOutcome::Aggregated(result) => Ok(*result),
            _ => Err(PipelineFailure::UnexpectedOutcome {
                agent_id: self.coordinator.agent_id().to_string(),
            }),
        }
    }

    /// Run every specialist concurrently, each under its own budget
    ///
    /// A specialist's budget starts once it holds a concurrency permit, so time spent
    /// queued never counts against it. Classifications and diagnostics come back in
    /// roster order regardless of completion order.
    async fn run_specialists(
        &self,
        narrative: &str,
        context: &AgentContext,
    ) -> (Vec<Classification>, Vec<AgentDiagnostic>) {
        let narrative: Arc<str> = Arc::from(narrative);
        let context = Arc::new(context.clone());
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let budget = self.config.specialist_budget();

        let mut set: JoinSet<(usize, TaskReport, f64)> = JoinSet::new();
        let mut indices: HashMap<task::Id, usize> = HashMap::with_capacity(self.specialists.len());
        for (index, agent) in self.specialists.iter().enumerate() {
            let agent = Arc::clone(agent);
            let narrative = Arc::clone(&narrative);
            let context = Arc::clone(&context);
            let semaphore = Arc::clone(&semaphore);

            let handle = set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let started = tokio::time::Instant::now();
                let run = AssertUnwindSafe(agent.process(&narrative, &context)).catch_unwind();
                let report = match tokio::time::timeout(budget, run).await {
                    Ok(Ok(result)) => TaskReport::Finished(result),
                    Ok(Err(panic)) => TaskReport::Panicked(panic_message(panic.as_ref())),
                    Err(_) => TaskReport::TimedOut,
                };
                (index, report, started.elapsed().as_secs_f64())
            });
            indices.insert(handle.id(), index);
        }

        let mut slots: Vec<Slot> = self
            .specialists
            .iter()
            .map(|_| Err("task did not report".to_string()))
            .collect();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, report, processing_time)) => slots[index] = Ok((report, processing_time)),
                Err(e) => {
                    let Some(&index) = indices.get(&e.id()) else {
                        tracing::error!(error = %e, "Unknown specialist task failed to join");
                        continue;
                    };
                    slots[index] = if e.is_panic() {
                        Ok((TaskReport::Panicked(panic_message(e.into_panic().as_ref())), 0.0))
                    } else {
                        Err(e.to_string())
                    };
                }
            }
        }

        let mut classifications = Vec::new();
        let mut diagnostics = Vec::with_capacity(self.specialists.len());
        for (agent, slot) in self.specialists.iter().zip(slots) {
            let (diagnostic, classification) =
                diagnostic_for(agent.agent_id().to_string(), slot, budget);
            classifications.extend(classification);
            diagnostics.push(diagnostic);
        }

        (classifications, diagnostics)
    }

    /// Emergency single pass over the sanitized narrative; falls back to the
    /// hard-coded result if it fails
    async fn degraded(&self, request: &mut Request) -> (EnvelopeStatus, AnalysisResult) {
        request.diagnostics.final_fallback_used = true;

        let emergency = match self
            .final_fallback
            .try_classify(&request.narrative, request.narrative_quality)
            .await
        {
            Ok(classification) => {
                let mut context = AgentContext::new(request.narrative_quality);
                context.classifications.push(classification);
                self.aggregate(&request.narrative, &context).await
            }
            Err(e) => Err(PipelineFailure::from(e)),
        };

        match emergency {
            Ok(result) => {
                request.pipeline.advance(PipelineEvent::Aggregated);
                (EnvelopeStatus::Degraded, result)
            }
            Err(e) => {
                tracing::error!(request_id = %request.id, error = %e, "Emergency classification failed, returning ultimate fallback");
                request.diagnostics.failure = Some(match request.diagnostics.failure.take() {
                    Some(first) => format!("{}; emergency pass: {}", first, e),
                    None => e.to_string(),
                });
                (EnvelopeStatus::Fallback, self.ultimate(request))
            }
        }
    }

    /// Hard-coded result; makes no capability call
    fn ultimate(&self, request: &mut Request) -> AnalysisResult {
        request.diagnostics.final_fallback_used = true;
        request.pipeline.advance(PipelineEvent::Failed);
        ultimate_result(self.final_fallback.default_classification(&request.narrative))
    }
}

/// Diagnostic for one specialist slot, plus its classification when it produced one
fn diagnostic_for(
    agent_id: String,
    slot: Slot,
    budget: Duration,
) -> (AgentDiagnostic, Option<Classification>) {
    let (report, processing_time) = match slot {
        Ok(reported) => reported,
        Err(message) => {
            tracing::error!(agent_id = %agent_id, error = %message, "Specialist task did not report");
            let diagnostic = AgentDiagnostic {
                agent_id,
                status: AgentStatus::Cancelled,
                detail: Some(message),
                used_fallback: None,
                processing_time: 0.0,
            };
            return (diagnostic, None);
        }
    };

    let (status, detail, classification) = match report {
        TaskReport::Finished(Ok(AgentOutcome::Classified(c))) => {
            (AgentStatus::Success, warnings_detail(&c), Some(c))
        }
        TaskReport::Finished(Ok(AgentOutcome::Abstained(reason))) => {
            (reason.status(), Some(reason.to_string()), None)
        }
        TaskReport::Finished(Ok(AgentOutcome::Aggregated(_))) => (
            AgentStatus::Error,
            Some("unexpected aggregate outcome".to_string()),
            None,
        ),
        TaskReport::Finished(Err(e)) => {
            tracing::error!(agent_id = %agent_id, error = %e, "Specialist failed");
            (AgentStatus::Error, Some(e.to_string()), None)
        }
        TaskReport::Panicked(message) => {
            tracing::error!(agent_id = %agent_id, panic = %message, "Specialist panicked");
            (AgentStatus::Error, Some(format!("panicked: {}", message)), None)
        }
        TaskReport::TimedOut => {
            tracing::warn!(agent_id = %agent_id, budget_secs = budget.as_secs(), "Specialist exceeded its budget");
            (
                AgentStatus::TimedOut,
                Some(format!(
                    "no result within the {}s specialist budget",
                    budget.as_secs()
                )),
                None,
            )
        }
    };

    let diagnostic = AgentDiagnostic {
        agent_id,
        status,
        detail,
        used_fallback: classification.as_ref().map(|c| c.used_fallback),
        processing_time,
    };
    (diagnostic, classification)
}

fn warnings_detail(classification: &Classification) -> Option<String> {
    if classification.guardrail_warnings.is_empty() {
        None
    } else {
        Some(classification.guardrail_warnings.join("; "))
    }
}

/// Hard-coded single-classification result; built without any fallible step
fn ultimate_result(primary: Classification) -> AnalysisResult {
    AnalysisResult {
        consensus_confidence: consensus_confidence(&[primary.confidence_score]),
        agents_consulted: vec![primary.source_agent_id.clone()],
        total_processing_time: primary.processing_time,
        accuracy_score: primary.evidentiary_score,
        primary,
        secondaries: Vec::new(),
        complexity_level: ComplexityLevel::Simple,
        complexity_score: 0.0,
        requires_multiple_specialists: false,
        consistency_score: 1.0,
        validation_passed: false,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
