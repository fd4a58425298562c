use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Confidence bucket derived from a 1-100 confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

impl ConfidenceLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => ConfidenceLabel::High,
            40.. => ConfidenceLabel::Medium,
            _ => ConfidenceLabel::Low,
        }
    }
}

/// One classification attempt produced by a single agent
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub category: String,
    pub subcategory: String,
    /// Integer confidence in [1, 100]
    pub confidence_score: u8,
    pub confidence_label: ConfidenceLabel,
    pub reasoning: String,
    pub keywords_found: BTreeSet<String>,
    /// Weighted blend of urgency, complexity and evidentiary support, in [0, 1]
    pub relevance_score: f64,
    pub urgency_score: f64,
    pub source_agent_id: String,
    /// Seconds spent producing this classification
    pub processing_time: f64,
    pub used_fallback: bool,
    pub attempt_number: u32,
    /// Short hash of narrative prefix, category and subcategory
    pub consistency_fingerprint: String,
    /// How well the reasoning is supported, in [0, 1]
    pub evidentiary_score: f64,
    /// Non-fatal output guardrail findings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guardrail_warnings: Vec<String>,
}

/// Case complexity bucket used for routing to human reviewers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
}

/// Aggregated outcome of all classification attempts for one narrative
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub primary: Classification,
    /// Ranked alternatives, never sharing the primary's category
    pub secondaries: Vec<Classification>,
    pub complexity_level: ComplexityLevel,
    pub complexity_score: f64,
    pub requires_multiple_specialists: bool,
    pub total_processing_time: f64,
    pub agents_consulted: Vec<String>,
    pub consensus_confidence: u8,
    pub consistency_score: f64,
    pub accuracy_score: f64,
    pub validation_passed: bool,
}
