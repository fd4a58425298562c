//! Narrative validation before any costly work

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const MIN_LENGTH: usize = 10;
const MIN_WORDS: usize = 3;
const MAX_REPEATED_CHAR: usize = 10;

static PUNCTUATION_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[!?]{5,}").expect("valid punctuation regex"));
static UPPERCASE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{20,}").expect("valid uppercase regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct InputValidation {
    pub valid: bool,
    pub issues: Vec<String>,
    pub severity: Severity,
}

impl InputValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
            severity: Severity::Ok,
        }
    }

    fn fail(&mut self, issue: impl Into<String>) {
        self.valid = false;
        self.severity = Severity::Error;
        self.issues.push(issue.into());
    }

    fn warn(&mut self, issue: impl Into<String>) {
        if self.severity == Severity::Ok {
            self.severity = Severity::Warning;
        }
        self.issues.push(issue.into());
    }
}

/// Validate a raw narrative
///
/// Too-short input fails; spam heuristics only warn.
pub fn validate(narrative: &str) -> InputValidation {
    let mut result = InputValidation::ok();
    let trimmed = narrative.trim();

    if trimmed.chars().count() < MIN_LENGTH {
        result.fail(format!(
            "Narrative too short ({} characters): insufficient detail to classify, at least {} characters required",
            trimmed.chars().count(),
            MIN_LENGTH
        ));
    }

    let words = trimmed.split_whitespace().count();
    if words < MIN_WORDS {
        result.fail(format!(
            "Narrative has insufficient detail: {} word(s), at least {} required",
            words, MIN_WORDS
        ));
    }

    if longest_repeated_char(trimmed) >= MAX_REPEATED_CHAR {
        result.warn(format!(
            "Possible spam: a character is repeated {} or more times in a row",
            MAX_REPEATED_CHAR
        ));
    }

    if PUNCTUATION_RUN.is_match(trimmed) {
        result.warn("Possible spam: excessive consecutive punctuation");
    }

    if UPPERCASE_RUN.is_match(trimmed) {
        result.warn("Possible spam: long run of uppercase letters");
    }

    result
}

fn longest_repeated_char(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;

    for c in text.chars() {
        if Some(c) == previous {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }

    longest
}
