//! Per-area specialist classifier
//!
//! Each specialist is bound to one taxonomy category. It runs a deep analysis pass
//! and, when the result is missing or weakly supported, its own lower-bar fallback
//! pass. Capability failures never leave this module: they become abstentions.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::model::{Classification, ConfidenceLabel, SpecialistProfile, Taxonomy};
use crate::service::agent::{Abstention, Agent, AgentContext, AgentError, AgentOutcome, specialist_id};
use crate::service::capability::{CapabilityError, ClassificationCapability, with_timeout};
use crate::service::confidence::confidence_score;
use crate::service::fingerprint::consistency_fingerprint;
use crate::service::guardrails;
use crate::service::validators::{EvidenceFields, accuracy};

pub mod subcategory;

use subcategory::{Resolution, ResolutionMethod};

/// Deep-pass reasoning shorter than this is not trusted
const MIN_DEEP_REASONING: usize = 50;
/// The fallback pass asks a lower-bar question and accepts shorter reasoning
const MIN_FALLBACK_REASONING: usize = 25;

#[derive(Debug, Clone, Copy)]
pub struct SpecialistSettings {
    pub call_timeout: Duration,
    /// Evidentiary score at which the deep pass is accepted without a fallback pass
    pub accuracy_threshold: f64,
}

enum PassOutcome {
    Accepted(Classification),
    Abstained(Abstention),
    Failed(CapabilityError),
}

/// Fields shared by both passes once the capability has answered
struct Draft<'a> {
    subcategory: String,
    reasoning: &'a str,
    reported_keywords: &'a [String],
    evidentiary_score: f64,
    urgency: f64,
    complexity: f64,
    used_fallback: bool,
    attempt_number: u32,
}

pub struct SpecialistClassifier {
    agent_id: String,
    profile: Arc<SpecialistProfile>,
    taxonomy: Arc<Taxonomy>,
    capability: Arc<dyn ClassificationCapability>,
    settings: SpecialistSettings,
}

impl SpecialistClassifier {
    pub fn new(
        profile: Arc<SpecialistProfile>,
        taxonomy: Arc<Taxonomy>,
        capability: Arc<dyn ClassificationCapability>,
        settings: SpecialistSettings,
    ) -> Self {
        Self {
            agent_id: specialist_id(&profile.name),
            profile,
            taxonomy,
            capability,
            settings,
        }
    }

    /// Classify a narrative; abstains instead of failing
    pub async fn classify(&self, narrative: &str, narrative_quality: f64) -> AgentOutcome {
        let validation = guardrails::input::validate(narrative);
        if !validation.valid {
            return AgentOutcome::Abstained(Abstention::InvalidInput(validation.issues.join("; ")));
        }

        let started = Instant::now();

        match self.deep_pass(narrative, narrative_quality, started).await {
            PassOutcome::Accepted(deep) if deep.evidentiary_score >= self.settings.accuracy_threshold => {
                self.log_accepted(&deep);
                AgentOutcome::Classified(deep)
            }
            PassOutcome::Accepted(deep) => {
                tracing::debug!(
                    agent_id = %self.agent_id,
                    evidentiary_score = deep.evidentiary_score,
                    "Deep pass below accuracy threshold, running fallback pass"
                );

                let chosen = match self.fallback_pass(narrative, narrative_quality, started).await {
                    PassOutcome::Accepted(fallback)
                        if fallback.evidentiary_score > deep.evidentiary_score =>
                    {
                        fallback
                    }
                    PassOutcome::Failed(e) => {
                        tracing::warn!(
                            agent_id = %self.agent_id,
                            error = %e,
                            "Fallback pass failed, keeping deep pass result"
                        );
                        deep
                    }
                    _ => deep,
                };

                self.log_accepted(&chosen);
                AgentOutcome::Classified(chosen)
            }
            PassOutcome::Abstained(reason) => {
                tracing::debug!(agent_id = %self.agent_id, reason = %reason, "Specialist abstained");
                AgentOutcome::Abstained(reason)
            }
            PassOutcome::Failed(e) => {
                tracing::warn!(
                    agent_id = %self.agent_id,
                    error = %e,
                    "Deep pass failed, running fallback pass"
                );

                match self.fallback_pass(narrative, narrative_quality, started).await {
                    PassOutcome::Accepted(fallback) => {
                        self.log_accepted(&fallback);
                        AgentOutcome::Classified(fallback)
                    }
                    PassOutcome::Abstained(reason) => AgentOutcome::Abstained(reason),
                    PassOutcome::Failed(e) => {
                        tracing::warn!(
                            agent_id = %self.agent_id,
                            error = %e,
                            "Fallback pass failed, abstaining"
                        );
                        AgentOutcome::Abstained(Abstention::CapabilityFailed(e.to_string()))
                    }
                }
            }
        }
    }

    async fn deep_pass(&self, narrative: &str, narrative_quality: f64, started: Instant) -> PassOutcome {
        let analysis = match with_timeout(
            self.settings.call_timeout,
            self.capability.analyze(narrative, &self.profile),
        )
        .await
        {
            Ok(analysis) => analysis,
            Err(e) => return PassOutcome::Failed(e),
        };

        if !analysis.is_relevant {
            return PassOutcome::Abstained(Abstention::NotRelevant);
        }

        if !same_area(&analysis.legal_area, &self.profile.name) {
            return PassOutcome::Abstained(Abstention::AreaMismatch {
                claimed: analysis.legal_area,
            });
        }

        let reasoning_length = analysis.reasoning.trim().chars().count();
        if reasoning_length < MIN_DEEP_REASONING {
            return PassOutcome::Abstained(Abstention::InsufficientReasoning {
                length: reasoning_length,
            });
        }

        let Some(resolution) = self.resolve_subcategory(narrative, &analysis.subcategory).await else {
            return PassOutcome::Abstained(Abstention::NoSubcategories);
        };

        let evidentiary_score =
            accuracy::score(&EvidenceFields::from(&analysis), &self.profile.name);

        self.accept(
            narrative,
            narrative_quality,
            started,
            Draft {
                subcategory: resolution.subcategory,
                reasoning: &analysis.reasoning,
                reported_keywords: &analysis.keywords_found,
                evidentiary_score,
                urgency: analysis.urgency,
                complexity: analysis.complexity,
                used_fallback: false,
                attempt_number: 1,
            },
        )
    }

    async fn fallback_pass(&self, narrative: &str, narrative_quality: f64, started: Instant) -> PassOutcome {
        let check = match with_timeout(
            self.settings.call_timeout,
            self.capability.check_connection(narrative, &self.profile),
        )
        .await
        {
            Ok(check) => check,
            Err(e) => return PassOutcome::Failed(e),
        };

        if !check.has_connection {
            return PassOutcome::Abstained(Abstention::NotRelevant);
        }

        let reasoning_length = check.reasoning.trim().chars().count();
        if reasoning_length < MIN_FALLBACK_REASONING {
            return PassOutcome::Abstained(Abstention::InsufficientReasoning {
                length: reasoning_length,
            });
        }

        let Some(resolution) = self.resolve_subcategory(narrative, &check.subcategory).await else {
            return PassOutcome::Abstained(Abstention::NoSubcategories);
        };

        let evidentiary_score = accuracy::score(&EvidenceFields::from(&check), &self.profile.name);

        self.accept(
            narrative,
            narrative_quality,
            started,
            Draft {
                subcategory: resolution.subcategory,
                reasoning: &check.reasoning,
                reported_keywords: &check.keywords_found,
                evidentiary_score,
                urgency: check.urgency,
                complexity: check.complexity,
                used_fallback: true,
                attempt_number: 2,
            },
        )
    }

    /// Resolve a subcategory answer: exact, re-ask, substring, word overlap, first entry
    async fn resolve_subcategory(&self, narrative: &str, candidate: &str) -> Option<Resolution> {
        if let Some(name) = subcategory::exact_match(&self.profile, candidate) {
            return Some(Resolution::new(name, ResolutionMethod::Exact));
        }

        let resolution = self.resolve_inexact(narrative, candidate).await?;
        tracing::debug!(
            agent_id = %self.agent_id,
            candidate = %candidate,
            subcategory = %resolution.subcategory,
            method = ?resolution.method,
            "Resolved invalid subcategory"
        );
        Some(resolution)
    }

    async fn resolve_inexact(&self, narrative: &str, candidate: &str) -> Option<Resolution> {
        match with_timeout(
            self.settings.call_timeout,
            self.capability.choose_subcategory(narrative, &self.profile),
        )
        .await
        {
            Ok(choice) => {
                if let Some(name) = subcategory::exact_match(&self.profile, &choice.subcategory) {
                    return Some(Resolution::new(name, ResolutionMethod::ReAsk));
                }
            }
            Err(e) => {
                tracing::debug!(
                    agent_id = %self.agent_id,
                    error = %e,
                    "Subcategory re-ask failed"
                );
            }
        }

        if let Some(name) = subcategory::substring_match(&self.profile, candidate) {
            return Some(Resolution::new(name, ResolutionMethod::Substring));
        }

        if let Some(name) = subcategory::word_overlap_match(&self.profile, candidate) {
            return Some(Resolution::new(name, ResolutionMethod::WordOverlap));
        }

        self.profile
            .first_subcategory()
            .map(|name| Resolution::new(name, ResolutionMethod::Default))
    }

    fn accept(
        &self,
        narrative: &str,
        narrative_quality: f64,
        started: Instant,
        draft: Draft<'_>,
    ) -> PassOutcome {
        let check = guardrails::output::validate(
            &self.profile.name,
            &draft.subcategory,
            draft.reasoning,
            &self.taxonomy,
        );
        if !check.is_valid {
            return PassOutcome::Abstained(Abstention::GuardrailRejected(check.errors));
        }
        if !check.warnings.is_empty() {
            tracing::warn!(
                agent_id = %self.agent_id,
                warnings = ?check.warnings,
                "Output guardrail warnings"
            );
        }

        let urgency = draft.urgency.clamp(0.0, 1.0);
        let complexity = draft.complexity.clamp(0.0, 1.0);
        let relevance_score = 0.4 * urgency + 0.3 * complexity + 0.3 * draft.evidentiary_score;
        let confidence =
            confidence_score(draft.evidentiary_score, narrative_quality, draft.used_fallback);

        let mut keywords_found: BTreeSet<String> = self.profile.keywords_in(narrative);
        keywords_found.extend(
            draft
                .reported_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty()),
        );

        PassOutcome::Accepted(Classification {
            consistency_fingerprint: consistency_fingerprint(
                narrative,
                &self.profile.name,
                &draft.subcategory,
            ),
            category: self.profile.name.clone(),
            subcategory: draft.subcategory,
            confidence_score: confidence,
            confidence_label: ConfidenceLabel::from_score(confidence),
            reasoning: draft.reasoning.trim().to_string(),
            keywords_found,
            relevance_score,
            urgency_score: urgency,
            source_agent_id: self.agent_id.clone(),
            processing_time: started.elapsed().as_secs_f64(),
            used_fallback: draft.used_fallback,
            attempt_number: draft.attempt_number,
            evidentiary_score: draft.evidentiary_score,
            guardrail_warnings: check.warnings,
        })
    }

    fn log_accepted(&self, classification: &Classification) {
        tracing::info!(
            agent_id = %self.agent_id,
            subcategory = %classification.subcategory,
            confidence = classification.confidence_score,
            evidentiary_score = classification.evidentiary_score,
            used_fallback = classification.used_fallback,
            "Specialist produced classification"
        );
    }
}

#[async_trait]
impl Agent for SpecialistClassifier {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn process(&self, narrative: &str, context: &AgentContext) -> Result<AgentOutcome, AgentError> {
        Ok(self.classify(narrative, context.narrative_quality).await)
    }
}

/// Compare area names ignoring case, punctuation and `&` vs `and`
fn same_area(claimed: &str, area: &str) -> bool {
    fn key(s: &str) -> String {
        s.to_lowercase()
            .replace('&', " and ")
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    key(claimed) == key(area)
}
