//! Scripted capability and fixtures for agent and orchestrator tests

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::model::extraction::{
    ExtractedConfidence, ExtractedConnectionCheck, ExtractedGeneralClassification,
    ExtractedSpecialistAnalysis, ExtractedSubcategoryChoice,
};
use crate::model::{Classification, ConfidenceLabel, SpecialistProfile, Taxonomy};
use crate::service::capability::{CapabilityError, ClassificationCapability};

/// Scripted answer for one capability call
#[derive(Debug, Clone)]
pub enum Script<T> {
    Respond(T),
    Fail(String),
    /// Respond only after sleeping
    Slow(Duration, T),
    Panic,
}

impl<T: Clone> Script<T> {
    async fn play(&self) -> Result<T, CapabilityError> {
        match self {
            Script::Respond(value) => Ok(value.clone()),
            Script::Fail(message) => Err(CapabilityError::Request(message.clone())),
            Script::Slow(delay, value) => {
                tokio::time::sleep(*delay).await;
                Ok(value.clone())
            }
            Script::Panic => panic!("scripted capability panic"),
        }
    }
}

/// Capability answering from per-area scripts
///
/// Areas without a script answer "not relevant" / "no connection"; the
/// subcategory re-ask and the general classification fail unless scripted.
#[derive(Default)]
pub struct ScriptedCapability {
    analyses: HashMap<String, Script<ExtractedSpecialistAnalysis>>,
    subcategories: HashMap<String, Script<ExtractedSubcategoryChoice>>,
    connections: HashMap<String, Script<ExtractedConnectionCheck>>,
    general: Option<Script<ExtractedGeneralClassification>>,
    calls: Mutex<Vec<String>>,
    narratives: Mutex<Vec<String>>,
}

impl ScriptedCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_analysis(mut self, area: &str, script: Script<ExtractedSpecialistAnalysis>) -> Self {
        self.analyses.insert(area.to_string(), script);
        self
    }

    pub fn with_subcategory(mut self, area: &str, subcategory: &str) -> Self {
        self.subcategories.insert(
            area.to_string(),
            Script::Respond(ExtractedSubcategoryChoice {
                subcategory: subcategory.to_string(),
            }),
        );
        self
    }

    pub fn with_connection(mut self, area: &str, script: Script<ExtractedConnectionCheck>) -> Self {
        self.connections.insert(area.to_string(), script);
        self
    }

    pub fn with_general(mut self, script: Script<ExtractedGeneralClassification>) -> Self {
        self.general = Some(script);
        self
    }

    pub fn into_arc(self) -> Arc<dyn ClassificationCapability> {
        Arc::new(self)
    }

    /// Calls made so far, as `operation:area`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Narratives passed to the capability so far, in call order
    pub fn narratives(&self) -> Vec<String> {
        self.narratives.lock().map(|n| n.clone()).unwrap_or_default()
    }

    fn record(&self, operation: &str, area: &str, narrative: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{}:{}", operation, area));
        }
        if let Ok(mut narratives) = self.narratives.lock() {
            narratives.push(narrative.to_string());
        }
    }
}

#[async_trait]
impl ClassificationCapability for ScriptedCapability {
    async fn analyze(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedSpecialistAnalysis, CapabilityError> {
        self.record("analyze", &profile.name, narrative);
        match self.analyses.get(&profile.name) {
            Some(script) => script.play().await,
            None => Ok(not_relevant(&profile.name)),
        }
    }

    async fn choose_subcategory(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedSubcategoryChoice, CapabilityError> {
        self.record("choose_subcategory", &profile.name, narrative);
        match self.subcategories.get(&profile.name) {
            Some(script) => script.play().await,
            None => Err(CapabilityError::Request("no scripted subcategory".to_string())),
        }
    }

    async fn check_connection(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedConnectionCheck, CapabilityError> {
        self.record("check_connection", &profile.name, narrative);
        match self.connections.get(&profile.name) {
            Some(script) => script.play().await,
            None => Ok(connection("", false)),
        }
    }

    async fn classify_general(
        &self,
        narrative: &str,
        _taxonomy: &Taxonomy,
    ) -> Result<ExtractedGeneralClassification, CapabilityError> {
        self.record("classify_general", "*", narrative);
        match &self.general {
            Some(script) => script.play().await,
            None => Err(CapabilityError::Request("no scripted classification".to_string())),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Well-supported analysis; scores an evidentiary 1.0
pub fn relevant_analysis(area: &str, subcategory: &str) -> ExtractedSpecialistAnalysis {
    ExtractedSpecialistAnalysis {
        is_relevant: true,
        legal_area: area.to_string(),
        subcategory: subcategory.to_string(),
        confidence: ExtractedConfidence::High,
        reasoning: format!(
            "The facts describe a legal claim within {}: the person suffered harm the law protects against and seeks a remedy.",
            area
        ),
        relationships: strings(&["the other party's conduct caused the harm"]),
        applicable_laws: strings(&["governing state and federal statutes"]),
        remedies: strings(&["damages", "injunctive relief"]),
        competency_justification: format!(
            "{} practitioners handle exactly this kind of dispute every day.",
            area
        ),
        urgency: 0.7,
        complexity: 0.5,
        keywords_found: strings(&["Harm"]),
    }
}

/// Relevant but thinly supported analysis; scores an evidentiary 0.2
pub fn weak_analysis(area: &str, subcategory: &str) -> ExtractedSpecialistAnalysis {
    ExtractedSpecialistAnalysis {
        is_relevant: true,
        legal_area: area.to_string(),
        subcategory: subcategory.to_string(),
        confidence: ExtractedConfidence::Low,
        reasoning: "The narrative describes a situation that could possibly touch this field somewhat."
            .to_string(),
        relationships: Vec::new(),
        applicable_laws: Vec::new(),
        remedies: Vec::new(),
        competency_justification: String::new(),
        urgency: 0.9,
        complexity: 0.3,
        keywords_found: Vec::new(),
    }
}

pub fn not_relevant(area: &str) -> ExtractedSpecialistAnalysis {
    ExtractedSpecialistAnalysis {
        is_relevant: false,
        legal_area: area.to_string(),
        subcategory: String::new(),
        confidence: ExtractedConfidence::Low,
        reasoning: "Not within this practice area.".to_string(),
        relationships: Vec::new(),
        applicable_laws: Vec::new(),
        remedies: Vec::new(),
        competency_justification: String::new(),
        urgency: 0.0,
        complexity: 0.0,
        keywords_found: Vec::new(),
    }
}

/// Connection check answer; when connected it scores an evidentiary 0.55
pub fn connection(subcategory: &str, has_connection: bool) -> ExtractedConnectionCheck {
    ExtractedConnectionCheck {
        has_connection,
        subcategory: subcategory.to_string(),
        confidence: ExtractedConfidence::Medium,
        reasoning: "There is a legitimate connection: the person may hold rights that a court would enforce."
            .to_string(),
        relationships: strings(&["the person and the other party"]),
        applicable_laws: Vec::new(),
        remedies: Vec::new(),
        urgency: 0.4,
        complexity: 0.4,
        keywords_found: Vec::new(),
    }
}

pub fn general(category: &str, subcategory: &str) -> ExtractedGeneralClassification {
    ExtractedGeneralClassification {
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        confidence: ExtractedConfidence::Medium,
        reasoning: format!(
            "Closest fit is {} because the narrative concerns a dispute the law may address.",
            category
        ),
        relationships: Vec::new(),
        applicable_laws: Vec::new(),
        remedies: Vec::new(),
        urgency: 0.5,
        complexity: 0.5,
        keywords_found: Vec::new(),
    }
}

/// Plain accepted classification for aggregation tests
pub fn classification(category: &str, subcategory: &str, agent_id: &str) -> Classification {
    Classification {
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        confidence_score: 70,
        confidence_label: ConfidenceLabel::High,
        reasoning: "Reasoning supplied by a test fixture for aggregation.".to_string(),
        keywords_found: BTreeSet::new(),
        relevance_score: 0.5,
        urgency_score: 0.5,
        source_agent_id: agent_id.to_string(),
        processing_time: 0.5,
        used_fallback: false,
        attempt_number: 1,
        consistency_fingerprint: String::new(),
        evidentiary_score: 0.7,
        guardrail_warnings: Vec::new(),
    }
}
