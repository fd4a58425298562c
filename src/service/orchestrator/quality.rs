//! Narrative quality heuristic over the sanitizer output

use std::collections::BTreeSet;

use crate::model::NarrativeQuality;
use crate::model::Taxonomy;
use crate::model::taxonomy::contains_term;
use crate::service::sanitizer::SanitizedText;

const MAX_REDUCTION_PERCENT: f64 = 60.0;
const MIN_WORDS: usize = 5;
const MIN_LENGTH: usize = 15;
/// Quality ceiling for narratives flagged as gibberish
const GIBBERISH_CEILING: f64 = 0.3;

/// Terms that signal a legal context regardless of practice area
const GENERAL_LEGAL_TERMS: &[&str] = &[
    "lawyer", "attorney", "court", "sue", "sued", "suing", "lawsuit", "legal", "law", "judge",
    "rights", "claim", "illegal", "unfair", "owed", "dispute", "agreement", "signed", "notice",
    "lost", "damage", "refused",
];

/// Assess a sanitized narrative
///
/// Gibberish when the sanitizer removed more than 60% of the words, fewer than five
/// words remain, no legal-context term occurs, or fewer than 15 characters remain.
pub fn assess(sanitized: &SanitizedText, taxonomy: &Taxonomy) -> NarrativeQuality {
    let text = sanitized.cleaned_text.trim();
    let lower = text.to_lowercase();
    let word_count = text.split_whitespace().count();

    let mut legal_terms_found: BTreeSet<String> = GENERAL_LEGAL_TERMS
        .iter()
        .filter(|t| contains_term(&lower, t))
        .map(|t| t.to_string())
        .collect();
    for profile in taxonomy.profiles() {
        legal_terms_found.extend(profile.keywords_in(text));
    }

    let mut reasons = Vec::new();
    if sanitized.reduction_percentage > MAX_REDUCTION_PERCENT {
        reasons.push(format!(
            "sanitizer removed {:.1}% of the words",
            sanitized.reduction_percentage
        ));
    }
    if word_count < MIN_WORDS {
        reasons.push(format!("only {} words after sanitization", word_count));
    }
    if legal_terms_found.is_empty() {
        reasons.push("no legal context terms found".to_string());
    }
    if text.chars().count() < MIN_LENGTH {
        reasons.push(format!("fewer than {} characters after sanitization", MIN_LENGTH));
    }

    let gibberish = !reasons.is_empty();

    let words_component = (word_count as f64 / 40.0).min(1.0);
    let terms_component = (legal_terms_found.len() as f64 / 3.0).min(1.0);
    let retention_component = 1.0 - (sanitized.reduction_percentage / 100.0).clamp(0.0, 1.0);
    let mut quality_score =
        0.4 * words_component + 0.4 * terms_component + 0.2 * retention_component;
    if gibberish {
        quality_score = quality_score.min(GIBBERISH_CEILING);
    }

    NarrativeQuality {
        gibberish,
        reasons,
        legal_terms_found,
        word_count,
        reduction_percentage: sanitized.reduction_percentage,
        quality_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitized(text: &str, reduction_percentage: f64) -> SanitizedText {
        SanitizedText {
            cleaned_text: text.to_string(),
            reduction_percentage,
        }
    }

    #[test]
    fn test_legal_narrative_is_not_gibberish() {
        let taxonomy = Taxonomy::embedded().unwrap();
        let quality = assess(
            &sanitized(
                "I was fired for reporting safety violations at work and my manager retaliated against me",
                0.0,
            ),
            &taxonomy,
        );

        assert!(!quality.gibberish);
        assert!(quality.reasons.is_empty());
        assert!(quality.legal_terms_found.contains("fired"));
        assert!(quality.quality_score > 0.6);
    }

    #[test]
    fn test_gibberish_flags() {
        let taxonomy = Taxonomy::embedded().unwrap();

        let quality = assess(&sanitized("asdf qwer zxcv uiop hjkl", 0.0), &taxonomy);
        assert!(quality.gibberish);
        assert_eq!(quality.reasons, vec!["no legal context terms found"]);
        assert!(quality.quality_score <= GIBBERISH_CEILING);

        let quality = assess(&sanitized("sued [NAME]", 0.0), &taxonomy);
        assert!(quality.gibberish);
        assert_eq!(quality.reasons.len(), 2);

        let quality = assess(
            &sanitized("[NAME] [NAME] [NAME] sued my landlord over the lease", 65.0),
            &taxonomy,
        );
        assert!(quality.gibberish);
        assert!(quality.reasons[0].contains("65.0%"));
    }

    #[test]
    fn test_quality_score_in_unit_range() {
        let taxonomy = Taxonomy::embedded().unwrap();
        let long = "my landlord refused to return the deposit and the court ".repeat(20);
        let quality = assess(&sanitized(&long, 0.0), &taxonomy);
        assert!(!quality.gibberish);
        assert!((quality.quality_score - 1.0).abs() < 1e-9);
    }
}
