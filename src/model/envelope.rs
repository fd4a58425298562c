//! Response envelope returned to callers of the orchestrator

use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use crate::model::{AnalysisResult, Classification, ComplexityLevel, ConfidenceLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    /// Normal multi-agent path
    Success,
    /// Input rejected before classification
    Error,
    /// Emergency single-pass result
    Degraded,
    /// Hard-coded ultimate fallback
    Fallback,
}

/// Pipeline states, recorded in order in the diagnostics trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    Classifying,
    Aggregating,
    Degraded,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Success,
    NotRelevant,
    /// Answer discarded by a guardrail or consistency check
    Rejected,
    InvalidInput,
    Error,
    /// Did not finish within the specialist budget
    TimedOut,
    /// Task ended without reporting, e.g. aborted by the runtime
    Cancelled,
}

/// Per-agent outcome for one request
#[derive(Debug, Clone, Serialize)]
pub struct AgentDiagnostic {
    pub agent_id: String,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_fallback: Option<bool>,
    pub processing_time: f64,
}

/// Narrative quality signal derived from the sanitizer output
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeQuality {
    pub gibberish: bool,
    pub reasons: Vec<String>,
    pub legal_terms_found: BTreeSet<String>,
    pub word_count: usize,
    pub reduction_percentage: f64,
    /// In [0, 1]; feeds the per-classification confidence score
    pub quality_score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub states: Vec<PipelineStage>,
    pub agents: Vec<AgentDiagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<NarrativeQuality>,
    pub final_fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Alternative category surfaced next to the primary
#[derive(Debug, Clone, Serialize)]
pub struct SecondaryIssue {
    pub category: String,
    pub subcategory: String,
    pub confidence_score: u8,
    pub confidence_label: ConfidenceLabel,
    pub source_agent_id: String,
}

impl From<&Classification> for SecondaryIssue {
    fn from(c: &Classification) -> Self {
        Self {
            category: c.category.clone(),
            subcategory: c.subcategory.clone(),
            confidence_score: c.confidence_score,
            confidence_label: c.confidence_label,
            source_agent_id: c.source_agent_id.clone(),
        }
    }
}

/// Flattened classification fields of a successful envelope
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationPayload {
    pub category: String,
    pub subcategory: String,
    pub confidence_label: ConfidenceLabel,
    pub confidence_score: u8,
    pub reasoning: String,
    pub keywords_found: BTreeSet<String>,
    pub used_fallback: bool,
    pub secondary_issues: Vec<SecondaryIssue>,
    pub case_complexity: ComplexityLevel,
    pub requires_multiple_specialists: bool,
    pub confidence_consensus: u8,
    pub consistency_score: f64,
    pub accuracy_score: f64,
    pub validation_passed: bool,
    pub agents_consulted: Vec<String>,
    pub total_processing_time: f64,
}

impl From<&AnalysisResult> for ClassificationPayload {
    fn from(result: &AnalysisResult) -> Self {
        let primary = &result.primary;
        Self {
            category: primary.category.clone(),
            subcategory: primary.subcategory.clone(),
            confidence_label: primary.confidence_label,
            confidence_score: primary.confidence_score,
            reasoning: primary.reasoning.clone(),
            keywords_found: primary.keywords_found.clone(),
            used_fallback: primary.used_fallback,
            secondary_issues: result.secondaries.iter().map(SecondaryIssue::from).collect(),
            case_complexity: result.complexity_level,
            requires_multiple_specialists: result.requires_multiple_specialists,
            confidence_consensus: result.consensus_confidence,
            consistency_score: result.consistency_score,
            accuracy_score: result.accuracy_score,
            validation_passed: result.validation_passed,
            agents_consulted: result.agents_consulted.clone(),
            total_processing_time: result.total_processing_time,
        }
    }
}

/// Structured error body for rejected input
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub issues: Vec<String>,
}

/// Top-level response; always structurally valid regardless of pipeline failures
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    /// RFC 3339 / ISO-8601 timestamp
    pub timestamp: String,
    pub request_id: Uuid,
    #[serde(flatten)]
    pub payload: Option<ClassificationPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub diagnostics: Diagnostics,
}

impl Envelope {
    pub fn classified(
        status: EnvelopeStatus,
        request_id: Uuid,
        result: &AnalysisResult,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
            payload: Some(ClassificationPayload::from(result)),
            error: None,
            diagnostics,
        }
    }

    pub fn rejected(request_id: Uuid, issues: Vec<String>, diagnostics: Diagnostics) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
            payload: None,
            error: Some(ErrorBody {
                error: "input_validation_error".to_string(),
                message: "Narrative failed input validation".to_string(),
                issues,
            }),
            diagnostics,
        }
    }
}
