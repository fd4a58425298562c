//! Evidentiary scoring of classification reasoning
//!
//! Additive heuristic over the structure of the capability's answer. The narrative is
//! not re-analysed here; only how well the answer supports itself.

use crate::model::extraction::{
    ExtractedConfidence, ExtractedConnectionCheck, ExtractedGeneralClassification,
    ExtractedSpecialistAnalysis,
};
use crate::model::taxonomy::contains_term;

const LEGAL_VOCABULARY: &[&str] = &[
    "law",
    "legal",
    "statute",
    "statutory",
    "claim",
    "rights",
    "liability",
    "liable",
    "court",
    "violation",
    "damages",
    "remedy",
    "contract",
    "regulation",
    "protected",
    "retaliation",
    "negligence",
    "jurisdiction",
    "lawsuit",
    "obligation",
    "duty",
    "breach",
    "unlawful",
    "wrongful",
];

/// Fields of a capability answer that carry evidentiary weight
#[derive(Debug, Clone, Copy)]
pub struct EvidenceFields<'a> {
    pub reasoning: &'a str,
    pub relationships: &'a [String],
    pub applicable_laws: &'a [String],
    pub remedies: &'a [String],
    pub competency_justification: &'a str,
    pub confidence: ExtractedConfidence,
    pub urgency: f64,
    pub complexity: f64,
}

impl<'a> From<&'a ExtractedSpecialistAnalysis> for EvidenceFields<'a> {
    fn from(a: &'a ExtractedSpecialistAnalysis) -> Self {
        Self {
            reasoning: &a.reasoning,
            relationships: &a.relationships,
            applicable_laws: &a.applicable_laws,
            remedies: &a.remedies,
            competency_justification: &a.competency_justification,
            confidence: a.confidence,
            urgency: a.urgency,
            complexity: a.complexity,
        }
    }
}

impl<'a> From<&'a ExtractedConnectionCheck> for EvidenceFields<'a> {
    fn from(c: &'a ExtractedConnectionCheck) -> Self {
        Self {
            reasoning: &c.reasoning,
            relationships: &c.relationships,
            applicable_laws: &c.applicable_laws,
            remedies: &c.remedies,
            competency_justification: "",
            confidence: c.confidence,
            urgency: c.urgency,
            complexity: c.complexity,
        }
    }
}

impl<'a> From<&'a ExtractedGeneralClassification> for EvidenceFields<'a> {
    fn from(g: &'a ExtractedGeneralClassification) -> Self {
        Self {
            reasoning: &g.reasoning,
            relationships: &g.relationships,
            applicable_laws: &g.applicable_laws,
            remedies: &g.remedies,
            competency_justification: "",
            confidence: g.confidence,
            urgency: g.urgency,
            complexity: g.complexity,
        }
    }
}

/// Score how well a classification's reasoning is supported, in [0, 1]
///
/// Points are accumulated in hundredths so the cap is hit exactly.
pub fn score(fields: &EvidenceFields<'_>, area: &str) -> f64 {
    let reasoning = fields.reasoning.trim();
    let reasoning_lower = reasoning.to_lowercase();
    let mut points: u32 = 0;

    if reasoning.chars().count() > 50 {
        points += 20;
    }

    if LEGAL_VOCABULARY
        .iter()
        .any(|term| contains_term(&reasoning_lower, term))
    {
        points += 10;
    }

    if mentions_area(&reasoning_lower, area) {
        points += 10;
    }

    for list in [fields.relationships, fields.applicable_laws, fields.remedies] {
        if list.iter().any(|item| !item.trim().is_empty()) {
            points += 10;
        }
    }

    points += coherence_points(fields.confidence, fields.urgency, fields.complexity);

    if fields.competency_justification.trim().chars().count() >= 40 {
        points += 10;
    }

    f64::from(points.min(100)) / 100.0
}

/// Whether the reasoning names the area or one of its distinctive words
fn mentions_area(reasoning_lower: &str, area: &str) -> bool {
    let area_lower = area.to_lowercase();
    if reasoning_lower.contains(&area_lower) {
        return true;
    }

    area_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 4 && *w != "law")
        .any(|w| contains_term(reasoning_lower, w))
}

/// Reward confidence labels consistent with the urgency/complexity estimates
fn coherence_points(confidence: ExtractedConfidence, urgency: f64, complexity: f64) -> u32 {
    match confidence {
        ExtractedConfidence::High if complexity <= 0.7 => 20,
        ExtractedConfidence::High => 10,
        ExtractedConfidence::Medium => 15,
        ExtractedConfidence::Low if urgency < 0.8 => 10,
        ExtractedConfidence::Low => 0,
    }
}
