//! Matching a free-text subcategory answer onto an area's valid list

use std::collections::HashSet;

use crate::model::SpecialistProfile;

/// Minimum Jaccard word overlap for a fuzzy match
const MIN_WORD_OVERLAP: f64 = 0.3;

const STOPWORDS: &[&str] = &["and", "or", "the", "of", "for", "etc"];

/// How a subcategory was resolved, in ladder order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    Exact,
    ReAsk,
    Substring,
    WordOverlap,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub subcategory: String,
    pub method: ResolutionMethod,
}

impl Resolution {
    pub fn new(subcategory: &str, method: ResolutionMethod) -> Self {
        Self {
            subcategory: subcategory.to_string(),
            method,
        }
    }
}

/// Lowercase, `&` spelled out, punctuation collapsed to single spaces
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .replace('&', " and ")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact match after normalization
pub fn exact_match<'a>(profile: &'a SpecialistProfile, candidate: &str) -> Option<&'a str> {
    let candidate = normalize(candidate);
    if candidate.is_empty() {
        return None;
    }

    profile
        .subcategory_names()
        .find(|name| normalize(name) == candidate)
}

/// Containment in either direction; the longest matching name wins
pub fn substring_match<'a>(profile: &'a SpecialistProfile, candidate: &str) -> Option<&'a str> {
    let candidate = normalize(candidate);
    if candidate.is_empty() {
        return None;
    }

    profile
        .subcategory_names()
        .filter(|name| {
            let name = normalize(name);
            name.contains(&candidate) || candidate.contains(&name)
        })
        .fold(None, |best: Option<&str>, name| match best {
            Some(b) if b.len() >= name.len() => Some(b),
            _ => Some(name),
        })
}

fn significant_words(s: &str) -> HashSet<String> {
    normalize(s)
        .split(' ')
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Best Jaccard word overlap above the minimum; earlier entries win ties
pub fn word_overlap_match<'a>(profile: &'a SpecialistProfile, candidate: &str) -> Option<&'a str> {
    let candidate_words = significant_words(candidate);
    if candidate_words.is_empty() {
        return None;
    }

    let mut best: Option<(&str, f64)> = None;
    for name in profile.subcategory_names() {
        let words = significant_words(name);
        let intersection = words.intersection(&candidate_words).count();
        let union = words.union(&candidate_words).count();
        if union == 0 {
            continue;
        }

        let overlap = intersection as f64 / union as f64;
        if overlap >= MIN_WORD_OVERLAP && best.is_none_or(|(_, b)| overlap > b) {
            best = Some((name, overlap));
        }
    }

    best.map(|(name, _)| name)
}
