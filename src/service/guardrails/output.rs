//! Validation of a raw classification against the taxonomy

use crate::model::Taxonomy;

/// Reasoning shorter than this is accepted with a warning
const MIN_REASONING_LENGTH: usize = 50;

/// Result of output validation
#[derive(Debug)]
pub struct OutputValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl OutputValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Validate a category/subcategory/reasoning triple
///
/// Checks:
/// 1. Category exists in the taxonomy
/// 2. Subcategory belongs to that category
/// 3. Reasoning is present (short reasoning only warns)
pub fn validate(
    category: &str,
    subcategory: &str,
    reasoning: &str,
    taxonomy: &Taxonomy,
) -> OutputValidationResult {
    let mut result = OutputValidationResult::valid();

    match taxonomy.profile(category) {
        None => result.add_error(format!("Unknown category '{}'", category)),
        Some(profile) if !profile.has_subcategory(subcategory) => result.add_error(format!(
            "Subcategory '{}' is not valid for category '{}'",
            subcategory, category
        )),
        Some(_) => {}
    }

    let reasoning_length = reasoning.trim().chars().count();
    if reasoning_length == 0 {
        result.add_error("Reasoning is empty".to_string());
    } else if reasoning_length < MIN_REASONING_LENGTH {
        result.add_warning(format!(
            "Insufficient reasoning: {} characters",
            reasoning_length
        ));
    }

    result
}
