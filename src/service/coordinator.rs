//! Aggregation of classification attempts into one authoritative result

use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;

use crate::model::{AnalysisResult, Classification, ComplexityLevel};
use crate::service::agent::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::service::confidence::consensus_confidence;
use crate::service::validators::consistency;

pub const COORDINATOR_AGENT_ID: &str = "coordinator";

/// Confidence at or above which an attempt counts as high confidence for complexity
const HIGH_CONFIDENCE: u8 = 80;

#[derive(Debug, Clone)]
pub struct Coordinator {
    consistency_threshold: f64,
    accuracy_threshold: f64,
}

impl Coordinator {
    pub fn new(consistency_threshold: f64, accuracy_threshold: f64) -> Self {
        Self {
            consistency_threshold,
            accuracy_threshold,
        }
    }

    pub fn aggregate(&self, classifications: &[Classification]) -> Result<AnalysisResult, AgentError> {
        if classifications.is_empty() {
            return Err(AgentError::AggregationInvariantViolation);
        }

        let total = classifications.len() as f64;
        let consistency = consistency::check(classifications, self.consistency_threshold);
        let accuracy = mean(classifications.iter().map(|c| c.evidentiary_score));

        let mut ranked: Vec<&Classification> = classifications.iter().collect();
        ranked.sort_by(|a, b| rank(a, b));

        let primary = ranked[0].clone();
        let secondaries: Vec<Classification> = ranked[1..]
            .iter()
            .filter(|c| c.category != primary.category)
            .map(|c| (*c).clone())
            .collect();

        let distinct_categories = classifications
            .iter()
            .map(|c| c.category.as_str())
            .collect::<HashSet<_>>()
            .len();
        let fallback_ratio =
            classifications.iter().filter(|c| c.used_fallback).count() as f64 / total;
        let high_confidence_ratio = classifications
            .iter()
            .filter(|c| c.confidence_score >= HIGH_CONFIDENCE)
            .count() as f64
            / total;

        let complexity_score = 0.25 * (distinct_categories - 1) as f64
            + 0.2 * mean(classifications.iter().map(|c| c.relevance_score))
            + 0.15 * mean(classifications.iter().map(|c| c.urgency_score))
            + 0.15 * fallback_ratio
            + 0.10 * (1.0 - high_confidence_ratio)
            + 0.15 * (1.0 - accuracy);

        let scores: Vec<u8> = classifications.iter().map(|c| c.confidence_score).collect();

        let result = AnalysisResult {
            primary,
            secondaries,
            complexity_level: complexity_level(complexity_score),
            complexity_score,
            requires_multiple_specialists: distinct_categories > 1,
            total_processing_time: classifications.iter().map(|c| c.processing_time).sum(),
            agents_consulted: classifications
                .iter()
                .map(|c| c.source_agent_id.clone())
                .collect(),
            consensus_confidence: consensus_confidence(&scores),
            consistency_score: consistency.score,
            accuracy_score: accuracy,
            validation_passed: consistency.passed && accuracy >= self.accuracy_threshold,
        };

        tracing::info!(
            category = %result.primary.category,
            subcategory = %result.primary.subcategory,
            attempts = classifications.len(),
            secondaries = result.secondaries.len(),
            complexity = ?result.complexity_level,
            consensus_confidence = result.consensus_confidence,
            validation_passed = result.validation_passed,
            "Aggregated classifications"
        );

        Ok(result)
    }
}

#[async_trait]
impl Agent for Coordinator {
    fn agent_id(&self) -> &str {
        COORDINATOR_AGENT_ID
    }

    async fn process(&self, _narrative: &str, context: &AgentContext) -> Result<AgentOutcome, AgentError> {
        let result = self.aggregate(&context.classifications)?;
        Ok(AgentOutcome::Aggregated(Box::new(result)))
    }
}

/// Total order over attempts, best first
///
/// Non-fallback before fallback, then evidentiary score, confidence, relevance and
/// urgency descending, then attempt number ascending and agent id ascending.
fn rank(a: &Classification, b: &Classification) -> Ordering {
    a.used_fallback
        .cmp(&b.used_fallback)
        .then_with(|| b.evidentiary_score.total_cmp(&a.evidentiary_score))
        .then_with(|| b.confidence_score.cmp(&a.confidence_score))
        .then_with(|| b.relevance_score.total_cmp(&a.relevance_score))
        .then_with(|| b.urgency_score.total_cmp(&a.urgency_score))
        .then_with(|| a.attempt_number.cmp(&b.attempt_number))
        .then_with(|| a.source_agent_id.cmp(&b.source_agent_id))
}

/// Bucket a complexity score; rounded to four decimals so float noise never crosses a boundary
pub fn complexity_level(score: f64) -> ComplexityLevel {
    let score = (score * 10_000.0).round() / 10_000.0;
    if score <= 0.4 {
        ComplexityLevel::Simple
    } else if score <= 0.7 {
        ComplexityLevel::Moderate
    } else {
        ComplexityLevel::Complex
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
