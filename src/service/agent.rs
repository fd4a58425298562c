//! Common interface of specialists, the final fallback and the coordinator

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{AgentStatus, AnalysisResult, Classification};
use crate::service::capability::CapabilityError;

/// Error type for agents
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgentError {
    #[error("Aggregation invariant violated: no classifications to aggregate")]
    AggregationInvariantViolation,

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Per-request input shared by every agent
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    /// Narrative quality signal in [0, 1]
    pub narrative_quality: f64,
    /// Classifications produced so far (consumed by the coordinator)
    pub classifications: Vec<Classification>,
}

impl AgentContext {
    pub fn new(narrative_quality: f64) -> Self {
        Self {
            narrative_quality,
            classifications: Vec::new(),
        }
    }
}

/// Why a classifier declined to produce a classification
#[derive(Debug, Clone, PartialEq)]
pub enum Abstention {
    InvalidInput(String),
    NotRelevant,
    AreaMismatch { claimed: String },
    InsufficientReasoning { length: usize },
    GuardrailRejected(Vec<String>),
    NoSubcategories,
    CapabilityFailed(String),
}

impl Abstention {
    /// Diagnostic status reported for an agent that abstained this way
    pub fn status(&self) -> AgentStatus {
        match self {
            Abstention::NotRelevant => AgentStatus::NotRelevant,
            Abstention::InvalidInput(_) => AgentStatus::InvalidInput,
            Abstention::AreaMismatch { .. }
            | Abstention::InsufficientReasoning { .. }
            | Abstention::GuardrailRejected(_)
            | Abstention::NoSubcategories => AgentStatus::Rejected,
            Abstention::CapabilityFailed(_) => AgentStatus::Error,
        }
    }
}

impl fmt::Display for Abstention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Abstention::InvalidInput(issues) => write!(f, "invalid input: {}", issues),
            Abstention::NotRelevant => write!(f, "not relevant to this area"),
            Abstention::AreaMismatch { claimed } => {
                write!(f, "capability answered for a different area: {}", claimed)
            }
            Abstention::InsufficientReasoning { length } => {
                write!(f, "insufficient reasoning ({} characters)", length)
            }
            Abstention::GuardrailRejected(errors) => {
                write!(f, "output guardrail rejected: {}", errors.join("; "))
            }
            Abstention::NoSubcategories => write!(f, "area has no subcategories"),
            Abstention::CapabilityFailed(e) => write!(f, "capability failed: {}", e),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AgentOutcome {
    Classified(Classification),
    Abstained(Abstention),
    Aggregated(Box<AnalysisResult>),
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn agent_id(&self) -> &str;

    async fn process(&self, narrative: &str, context: &AgentContext) -> Result<AgentOutcome, AgentError>;
}

/// Stable agent id derived from a category name, e.g. `employment_law_specialist`
pub fn specialist_id(category: &str) -> String {
    let slug = category
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    format!("{}_specialist", slug)
}
