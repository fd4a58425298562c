//! Taxonomy-wide last-resort classifier
//!
//! Runs only when every specialist abstained. It never abstains and never fails:
//! out-of-taxonomy answers are replaced by the configured default pair, and a failed
//! capability call yields a hard-coded low-confidence classification.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::model::{Classification, ConfidenceLabel, Taxonomy};
use crate::service::agent::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::service::capability::{ClassificationCapability, with_timeout};
use crate::service::confidence::confidence_score;
use crate::service::fingerprint::consistency_fingerprint;
use crate::service::guardrails;
use crate::service::validators::{EvidenceFields, accuracy};

pub const FINAL_FALLBACK_AGENT_ID: &str = "final_fallback";

const FALLBACK_RELEVANCE: f64 = 0.75;
const DEFAULT_CONFIDENCE: u8 = 25;
const DEFAULT_URGENCY: f64 = 0.5;
const DEFAULT_REASONING: &str = "Automatic classification was unavailable; the matter was assigned to a general category for manual review.";

pub struct FinalFallbackClassifier {
    taxonomy: Arc<Taxonomy>,
    capability: Arc<dyn ClassificationCapability>,
    call_timeout: Duration,
    default_category: String,
    default_subcategory: String,
}

impl FinalFallbackClassifier {
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        capability: Arc<dyn ClassificationCapability>,
        call_timeout: Duration,
        default_category: String,
        default_subcategory: String,
    ) -> Self {
        Self {
            taxonomy,
            capability,
            call_timeout,
            default_category,
            default_subcategory,
        }
    }

    /// Single taxonomy-wide classification; fails only when the capability fails
    pub async fn try_classify(
        &self,
        narrative: &str,
        narrative_quality: f64,
    ) -> Result<Classification, AgentError> {
        let started = Instant::now();

        let general = with_timeout(
            self.call_timeout,
            self.capability.classify_general(narrative, &self.taxonomy),
        )
        .await?;

        let check = guardrails::output::validate(
            &general.category,
            &general.subcategory,
            &general.reasoning,
            &self.taxonomy,
        );

        if !check.warnings.is_empty() {
            tracing::warn!(warnings = ?check.warnings, "Final fallback output guardrail warnings");
        }

        let (category, subcategory) = if check.is_valid {
            (general.category.clone(), general.subcategory.clone())
        } else {
            tracing::warn!(
                category = %general.category,
                subcategory = %general.subcategory,
                errors = ?check.errors,
                default_category = %self.default_category,
                "Final fallback answer violated output guardrail, substituting default"
            );
            (self.default_category.clone(), self.default_subcategory.clone())
        };

        let reasoning = match general.reasoning.trim() {
            "" => DEFAULT_REASONING.to_string(),
            reasoning => reasoning.to_string(),
        };

        let evidentiary_score = accuracy::score(&EvidenceFields::from(&general), &category);
        let confidence = confidence_score(evidentiary_score, narrative_quality, true);

        let mut keywords_found = self
            .taxonomy
            .profile(&category)
            .map(|p| p.keywords_in(narrative))
            .unwrap_or_default();
        keywords_found.extend(
            general
                .keywords_found
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty()),
        );

        tracing::info!(
            category = %category,
            subcategory = %subcategory,
            confidence = confidence,
            "Final fallback produced classification"
        );

        Ok(Classification {
            consistency_fingerprint: consistency_fingerprint(narrative, &category, &subcategory),
            category,
            subcategory,
            confidence_score: confidence,
            confidence_label: ConfidenceLabel::from_score(confidence),
            reasoning,
            keywords_found,
            relevance_score: FALLBACK_RELEVANCE,
            urgency_score: general.urgency.clamp(0.0, 1.0),
            source_agent_id: FINAL_FALLBACK_AGENT_ID.to_string(),
            processing_time: started.elapsed().as_secs_f64(),
            used_fallback: true,
            attempt_number: 1,
            evidentiary_score,
            guardrail_warnings: check.warnings,
        })
    }

    /// Hard-coded low-confidence classification in the default pair
    pub fn default_classification(&self, narrative: &str) -> Classification {
        Classification {
            category: self.default_category.clone(),
            subcategory: self.default_subcategory.clone(),
            confidence_score: DEFAULT_CONFIDENCE,
            confidence_label: ConfidenceLabel::from_score(DEFAULT_CONFIDENCE),
            reasoning: DEFAULT_REASONING.to_string(),
            keywords_found: BTreeSet::new(),
            relevance_score: FALLBACK_RELEVANCE,
            urgency_score: DEFAULT_URGENCY,
            source_agent_id: FINAL_FALLBACK_AGENT_ID.to_string(),
            processing_time: 0.0,
            used_fallback: true,
            attempt_number: 1,
            consistency_fingerprint: consistency_fingerprint(
                narrative,
                &self.default_category,
                &self.default_subcategory,
            ),
            evidentiary_score: 0.0,
            guardrail_warnings: Vec::new(),
        }
    }

    /// Always returns a classification
    pub async fn classify(&self, narrative: &str, narrative_quality: f64) -> Classification {
        match self.try_classify(narrative, narrative_quality).await {
            Ok(classification) => classification,
            Err(e) => {
                tracing::error!(error = %e, "Final fallback classification failed, using default");
                self.default_classification(narrative)
            }
        }
    }
}

#[async_trait]
impl Agent for FinalFallbackClassifier {
    fn agent_id(&self) -> &str {
        FINAL_FALLBACK_AGENT_ID
    }

    async fn process(&self, narrative: &str, context: &AgentContext) -> Result<AgentOutcome, AgentError> {
        Ok(AgentOutcome::Classified(
            self.classify(narrative, context.narrative_quality).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{Script, ScriptedCapability, general};

    const NARRATIVE: &str = "Something happened with a government office and I need help with it";

    fn fallback(capability: ScriptedCapability) -> FinalFallbackClassifier {
        FinalFallbackClassifier::new(
            Arc::new(Taxonomy::embedded().unwrap()),
            capability.into_arc(),
            Duration::from_secs(5),
            "Government & Administrative Law".to_string(),
            "General Administrative Law".to_string(),
        )
    }

    #[tokio::test]
    async fn test_valid_answer_is_used() {
        let classifier = fallback(
            ScriptedCapability::new()
                .with_general(Script::Respond(general("Immigration Law", "Citizenship"))),
        );

        let c = classifier.classify(NARRATIVE, 0.5).await;
        assert_eq!(c.category, "Immigration Law");
        assert_eq!(c.subcategory, "Citizenship");
        assert!(c.used_fallback);
        assert_eq!(c.relevance_score, 0.75);
        assert_eq!(c.source_agent_id, FINAL_FALLBACK_AGENT_ID);
        assert_eq!(c.evidentiary_score, 0.55);
        assert_eq!(c.confidence_score, confidence_score(0.55, 0.5, true));
    }

    #[tokio::test]
    async fn test_out_of_taxonomy_answer_substitutes_default() {
        let classifier = fallback(
            ScriptedCapability::new()
                .with_general(Script::Respond(general("Maritime Law", "Salvage"))),
        );

        let c = classifier.classify(NARRATIVE, 0.5).await;
        assert_eq!(c.category, "Government & Administrative Law");
        assert_eq!(c.subcategory, "General Administrative Law");
        assert!(classifier.taxonomy.contains(&c.category, &c.subcategory));
    }

    #[tokio::test]
    async fn test_capability_failure_returns_default() {
        let classifier =
            fallback(ScriptedCapability::new().with_general(Script::Fail("down".to_string())));

        assert!(classifier.try_classify(NARRATIVE, 0.5).await.is_err());

        let c = classifier.classify(NARRATIVE, 0.5).await;
        assert_eq!(c.category, "Government & Administrative Law");
        assert_eq!(c.confidence_score, 25);
        assert_eq!(c.confidence_label, ConfidenceLabel::Low);
        assert!(c.used_fallback);
    }

    #[tokio::test]
    async fn test_process_never_fails() {
        let classifier = fallback(ScriptedCapability::new());
        let outcome = classifier
            .process(NARRATIVE, &AgentContext::new(0.5))
            .await
            .unwrap();
        assert!(matches!(outcome, AgentOutcome::Classified(c) if c.used_fallback));
    }
}
