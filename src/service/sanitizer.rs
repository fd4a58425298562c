//! PII redaction ahead of classification
//!
//! Consumed for its output quality signal. The regex implementation keeps legal,
//! medical, business and property context intact while removing personal identifiers.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SanitizerError {
    #[error("Sanitization failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedText {
    pub cleaned_text: String,
    /// Whitespace word-count reduction, in percent
    pub reduction_percentage: f64,
}

#[async_trait]
pub trait TextSanitizer: Send + Sync {
    async fn cleanse(&self, narrative: &str) -> Result<SanitizedText, SanitizerError>;
}

const PRESERVE_TERMS: &[&str] = &[
    // medical
    "doctor", "dr", "surgeon", "physician", "nurse", "medical", "hospital", "clinic", "patient",
    "surgery", "device", "treatment", "diagnosis", "medication", "prescription", "therapy",
    "procedure", "operation",
    // business
    "business", "company", "corporation", "llc", "inc", "partner", "customer", "client", "vendor",
    "supplier", "contractor", "employee", "employer", "manager", "supervisor", "ceo", "president",
    "director",
    // legal
    "attorney", "lawyer", "judge", "court", "lawsuit", "contract", "agreement", "plaintiff",
    "defendant", "witness", "evidence", "trial", "hearing", "settlement", "damages", "liability",
    "negligence", "breach",
    // property
    "property", "house", "home", "apartment", "building", "land", "mortgage", "loan",
    "foreclosure", "lease", "tenant", "landlord",
];

const COMPANY_OR_TITLE_MARKERS: &[&str] = &[
    "inc", "llc", "corp", "ltd", "company", "co", "group", "associates", "dr", "mr", "ms", "mrs",
    "prof", "judge", "attorney",
];

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b").expect("valid name regex"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,2}\s?)?(?:\(\d{3}\)|\b\d{3})[\s.-]?\d{3}[\s.-]?\d{4}\b")
        .expect("valid phone regex")
});
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").expect("valid email regex")
});
static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid ssn regex"));
static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+\s+[A-Z][a-z]+(?: [A-Z][a-z]+)?\s+(?:Street|St\.?|Avenue|Ave\.?|Road|Rd\.?|Boulevard|Blvd\.?|Lane|Ln\.?|Drive|Dr\.?)\b",
    )
    .expect("valid address regex")
});
static CREDIT_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{4}[-\s]?){3}\d{4}\b").expect("valid credit card regex")
});
static ACCOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{8,}\b").expect("valid account regex"));

/// Longest narrative the regex pass accepts
const DEFAULT_MAX_CHARS: usize = 20_000;

/// Regex-based redaction of personal identifiers
#[derive(Debug, Clone)]
pub struct RegexSanitizer {
    max_chars: usize,
}

impl Default for RegexSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexSanitizer {
    pub fn new() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn clean_text(&self, text: &str) -> String {
        // Card numbers before phone numbers so a card is never split into a phone match
        let cleaned = SSN.replace_all(text, "[SSN]");
        let cleaned = CREDIT_CARD.replace_all(&cleaned, "[CREDIT_CARD]");
        let cleaned = PHONE.replace_all(&cleaned, "[PHONE]");
        let cleaned = EMAIL.replace_all(&cleaned, "[EMAIL]");
        let cleaned = ADDRESS.replace_all(&cleaned, "[ADDRESS]");
        let cleaned = ACCOUNT.replace_all(&cleaned, "[ACCOUNT]").into_owned();

        NAME.replace_all(&cleaned, |caps: &Captures| match caps.get(0) {
            Some(m) if keep_name(&cleaned, m.start(), m.as_str()) => m.as_str().to_string(),
            Some(_) => "[NAME]".to_string(),
            None => String::new(),
        })
        .into_owned()
    }
}

#[async_trait]
impl TextSanitizer for RegexSanitizer {
    async fn cleanse(&self, narrative: &str) -> Result<SanitizedText, SanitizerError> {
        let length = narrative.chars().count();
        if length > self.max_chars {
            return Err(SanitizerError::Failed(format!(
                "narrative has {} characters, limit is {}",
                length, self.max_chars
            )));
        }

        let cleaned_text = self.clean_text(narrative);
        let reduction_percentage = reduction_percentage(narrative, &cleaned_text);

        tracing::debug!(
            original_words = narrative.split_whitespace().count(),
            cleaned_words = cleaned_text.split_whitespace().count(),
            reduction_percentage = reduction_percentage,
            "Sanitized narrative"
        );

        Ok(SanitizedText {
            cleaned_text,
            reduction_percentage,
        })
    }
}

fn is_preserve_term(word: &str) -> bool {
    let word = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    PRESERVE_TERMS.contains(&word.as_str())
}

fn keep_name(text: &str, start: usize, name: &str) -> bool {
    if name.split_whitespace().any(is_preserve_term) {
        return true;
    }

    let lower = name.to_lowercase();
    if lower
        .split_whitespace()
        .any(|w| COMPANY_OR_TITLE_MARKERS.contains(&w.trim_end_matches('.')))
    {
        return true;
    }

    // Sentence openers are more often ordinary words than names
    let before = text[..start].trim_end();
    before.is_empty() || before.ends_with(['.', '!', '?'])
}

/// Whitespace word-count reduction in percent
pub fn reduction_percentage(original: &str, cleaned: &str) -> f64 {
    let original_words = original.split_whitespace().count();
    if original_words == 0 {
        return 0.0;
    }
    let cleaned_words = cleaned.split_whitespace().count();

    (original_words.saturating_sub(cleaned_words)) as f64 / original_words as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_details_redacted() {
        let cleaned = RegexSanitizer::new()
            .clean_text("My phone number is 555-123-4567 and email is john@email.com");
        assert_eq!(cleaned, "My phone number is [PHONE] and email is [EMAIL]");
    }

    #[test]
    fn test_names_redacted_but_context_preserved() {
        let sanitizer = RegexSanitizer::new();

        let cleaned = sanitizer
            .clean_text("My business partner John Smith stole our customer list and started competing");
        assert_eq!(
            cleaned,
            "My business partner [NAME] stole our customer list and started competing"
        );

        let cleaned = sanitizer.clean_text("I was fired by Acme Company for reporting safety violations");
        assert!(cleaned.contains("Acme Company"));

        let cleaned = sanitizer.clean_text("Memorial Hospital misdiagnosed my condition");
        assert!(cleaned.contains("Memorial Hospital"));
    }

    #[test]
    fn test_identifiers_redacted() {
        let cleaned = RegexSanitizer::new().clean_text(
            "SSN 123-45-6789, card 4111 1111 1111 1111, account 987654321, at 42 Elm Street now",
        );
        assert_eq!(
            cleaned,
            "SSN [SSN], card [CREDIT_CARD], account [ACCOUNT], at [ADDRESS] now"
        );
    }

    #[test]
    fn test_dates_are_kept() {
        let cleaned = RegexSanitizer::new().clean_text("I was evicted on 03/15/2024 without notice");
        assert!(cleaned.contains("03/15/2024"));
    }

    #[tokio::test]
    async fn test_cleanse_reports_reduction() {
        let result = RegexSanitizer::new()
            .cleanse("My business partner John Smith stole our customer list")
            .await
            .unwrap();
        // 9 words down to 8
        assert!((result.reduction_percentage - 100.0 / 9.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_oversized_narrative_fails() {
        let sanitizer = RegexSanitizer::with_max_chars(20);
        let result = sanitizer
            .cleanse("My landlord kept my whole security deposit")
            .await;
        assert!(matches!(result, Err(SanitizerError::Failed(m)) if m.contains("limit is 20")));
        assert!(sanitizer.cleanse("My landlord left").await.is_ok());
    }

    #[test]
    fn test_reduction_percentage() {
        assert_eq!(reduction_percentage("", ""), 0.0);
        assert_eq!(reduction_percentage("a b c d", "a b c d"), 0.0);
        assert_eq!(reduction_percentage("a b c d", "a"), 75.0);
    }
}
