//! Legal practice-area taxonomy and specialist profiles
//!
//! The taxonomy is loaded once at startup (embedded YAML, optionally overridden by a
//! file on disk) and shared read-only with every classifier through an `Arc`.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

/// Taxonomy shipped with the binary
const EMBEDDED_TAXONOMY: &str = include_str!("../../config/taxonomy.yaml");

/// Error type for taxonomy loading
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse taxonomy: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid taxonomy: {0}")]
    Invalid(String),
}

/// A subcategory and the short description shown to classifiers
#[derive(Debug, Clone, Deserialize)]
pub struct SubcategoryDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Reference data for one practice area
///
/// Consumed by the specialist bound to this area and by the capability adapter when
/// building prompts. Never mutated after load.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecialistProfile {
    pub name: String,
    #[serde(default)]
    pub definition: String,
    /// Areas commonly confused with this one
    #[serde(default)]
    pub related: Vec<String>,
    pub subcategories: Vec<SubcategoryDefinition>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl SpecialistProfile {
    pub fn subcategory_names(&self) -> impl Iterator<Item = &str> {
        self.subcategories.iter().map(|s| s.name.as_str())
    }

    pub fn has_subcategory(&self, subcategory: &str) -> bool {
        self.subcategories.iter().any(|s| s.name == subcategory)
    }

    /// Default subcategory when nothing better can be resolved
    pub fn first_subcategory(&self) -> Option<&str> {
        self.subcategories.first().map(|s| s.name.as_str())
    }

    /// Profile keywords that literally occur in the narrative (case-insensitive, whole words)
    pub fn keywords_in(&self, narrative: &str) -> BTreeSet<String> {
        let haystack = narrative.to_lowercase();
        self.keywords
            .iter()
            .map(|k| k.to_lowercase())
            .filter(|k| contains_term(&haystack, k))
            .collect()
    }
}

/// Check whether `term` occurs in `haystack` on word boundaries
///
/// Both arguments are expected to be lowercase already.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }

    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    categories: Vec<SpecialistProfile>,
}

/// Immutable two-level category/subcategory hierarchy
#[derive(Debug, Clone)]
pub struct Taxonomy {
    profiles: Vec<Arc<SpecialistProfile>>,
}

impl Taxonomy {
    /// Load the taxonomy compiled into the binary
    pub fn embedded() -> Result<Self, TaxonomyError> {
        Self::from_yaml(EMBEDDED_TAXONOMY)
    }

    /// Load a taxonomy from a YAML file on disk
    pub fn from_path(path: &Path) -> Result<Self, TaxonomyError> {
        let contents = fs::read_to_string(path).map_err(|source| TaxonomyError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let taxonomy = Self::from_yaml(&contents)?;
        tracing::info!(
            path = %path.display(),
            categories = taxonomy.len(),
            "Loaded taxonomy from file"
        );
        Ok(taxonomy)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, TaxonomyError> {
        let file: TaxonomyFile = serde_yaml::from_str(contents)?;
        Self::validate(&file.categories)?;

        Ok(Self {
            profiles: file.categories.into_iter().map(Arc::new).collect(),
        })
    }

    fn validate(categories: &[SpecialistProfile]) -> Result<(), TaxonomyError> {
        if categories.is_empty() {
            return Err(TaxonomyError::Invalid(
                "taxonomy defines no categories".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for profile in categories {
            if !seen.insert(profile.name.as_str()) {
                return Err(TaxonomyError::Invalid(format!(
                    "duplicate category '{}'",
                    profile.name
                )));
            }
            if profile.subcategories.is_empty() {
                return Err(TaxonomyError::Invalid(format!(
                    "category '{}' has no subcategories",
                    profile.name
                )));
            }
        }

        for profile in categories {
            if let Some(unknown) = profile.related.iter().find(|r| !seen.contains(r.as_str())) {
                return Err(TaxonomyError::Invalid(format!(
                    "category '{}' lists unknown related category '{}'",
                    profile.name, unknown
                )));
            }
        }

        Ok(())
    }

    /// Category names in roster order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn profiles(&self) -> &[Arc<SpecialistProfile>] {
        &self.profiles
    }

    pub fn profile(&self, category: &str) -> Option<&Arc<SpecialistProfile>> {
        self.profiles.iter().find(|p| p.name == category)
    }

    pub fn subcategories(&self, category: &str) -> Option<&[SubcategoryDefinition]> {
        self.profile(category).map(|p| p.subcategories.as_slice())
    }

    pub fn contains(&self, category: &str, subcategory: &str) -> bool {
        self.profile(category)
            .is_some_and(|p| p.has_subcategory(subcategory))
    }

    pub fn related_categories(&self, category: &str) -> &[String] {
        self.profile(category)
            .map(|p| p.related.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_taxonomy_loads() {
        let taxonomy = Taxonomy::embedded().unwrap();
        assert_eq!(taxonomy.len(), 13);
        assert_eq!(taxonomy.categories().next(), Some("Family Law"));
        assert!(taxonomy.contains("Employment Law", "Wrongful Termination"));
        assert!(taxonomy.contains("Business/Corporate Law", "Corporations, LLCs, Partnerships, etc."));
        assert!(!taxonomy.contains("Employment Law", "Divorce"));
        assert!(!taxonomy.contains("Space Law", "Orbits"));
    }

    #[test]
    fn test_first_subcategory_follows_file_order() {
        let taxonomy = Taxonomy::embedded().unwrap();
        let first = |category: &str| taxonomy.profile(category).and_then(|p| p.first_subcategory());
        assert_eq!(first("Family Law"), Some("Adoptions"));
        assert_eq!(first("Criminal Law"), Some("General Criminal Defense"));
        assert_eq!(
            taxonomy.subcategories("Criminal Law").map(|s| s[0].name.as_str()),
            Some("General Criminal Defense")
        );
        assert!(taxonomy.subcategories("Unknown").is_none());
    }

    #[test]
    fn test_related_categories() {
        let taxonomy = Taxonomy::embedded().unwrap();
        assert_eq!(
            taxonomy.related_categories("Landlord/Tenant Law"),
            ["Real Estate Law", "Business/Corporate Law"]
        );
        assert!(taxonomy.related_categories("Unknown").is_empty());
    }

    #[test]
    fn test_rejects_duplicate_categories() {
        let yaml = r#"
categories:
  - name: A
    subcategories: [{ name: One }]
  - name: A
    subcategories: [{ name: Two }]
"#;
        let err = Taxonomy::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, TaxonomyError::Invalid(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_rejects_category_without_subcategories() {
        let yaml = r#"
categories:
  - name: A
    subcategories: []
"#;
        assert!(matches!(
            Taxonomy::from_yaml(yaml),
            Err(TaxonomyError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_unparseable() {
        assert!(matches!(
            Taxonomy::from_yaml("categories: []"),
            Err(TaxonomyError::Invalid(_))
        ));
        assert!(matches!(
            Taxonomy::from_yaml("categories: 12"),
            Err(TaxonomyError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_related_category() {
        let yaml = r#"
categories:
  - name: A
    related: [B]
    subcategories: [{ name: One }]
"#;
        assert!(matches!(
            Taxonomy::from_yaml(yaml),
            Err(TaxonomyError::Invalid(msg)) if msg.contains("unknown related")
        ));
    }

    #[test]
    fn test_keywords_in_matches_whole_words() {
        let taxonomy = Taxonomy::embedded().unwrap();
        let profile = taxonomy.profile("Wills, Trusts, & Estates Law").unwrap();

        let found = profile.keywords_in("I am willing to help my mother with her Will.");
        assert!(found.contains("will"));
        assert_eq!(found.len(), 1);

        let found = profile.keywords_in("Nothing relevant here");
        assert!(found.is_empty());
    }

    #[test]
    fn test_contains_term() {
        assert!(contains_term("i was fired today", "fired"));
        assert!(contains_term("fired.", "fired"));
        assert!(!contains_term("misfired engine", "fired"));
        assert!(contains_term("a slip and fall case", "slip and fall"));
        assert!(!contains_term("anything", ""));
    }
}
