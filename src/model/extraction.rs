//! Structured responses extracted from the classification capability

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Deep analysis of a narrative from one practice area's point of view
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedSpecialistAnalysis {
    /// Whether the narrative falls within this practice area
    #[schemars(description = "True only if the narrative presents a legal issue within this practice area")]
    pub is_relevant: bool,

    #[schemars(description = "Exact name of the practice area being analysed")]
    pub legal_area: String,

    #[schemars(description = "Exactly one subcategory from the provided list")]
    pub subcategory: String,

    pub confidence: ExtractedConfidence,

    #[schemars(
        description = "Structured explanation connecting the facts in the narrative to the legal issue (at least 50 characters)"
    )]
    pub reasoning: String,

    /// Fact-to-law relationships identified in the narrative
    #[schemars(description = "Relationships between the parties and facts that create the legal issue")]
    #[serde(default)]
    pub relationships: Vec<String>,

    #[schemars(description = "Statutes, doctrines or legal standards that apply")]
    #[serde(default)]
    pub applicable_laws: Vec<String>,

    #[schemars(description = "Remedies or outcomes available to the person")]
    #[serde(default)]
    pub remedies: Vec<String>,

    #[schemars(description = "Why a specialist in this area is competent to handle the matter")]
    #[serde(default)]
    pub competency_justification: String,

    #[schemars(description = "Urgency of the matter between 0.0 and 1.0")]
    pub urgency: f64,

    #[schemars(description = "Legal complexity of the matter between 0.0 and 1.0")]
    pub complexity: f64,

    #[schemars(description = "Words or phrases from the narrative that indicate this area")]
    #[serde(default)]
    pub keywords_found: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractedConfidence {
    High,
    Medium,
    Low,
}

/// Focused re-ask restricted to the valid subcategory list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedSubcategoryChoice {
    #[schemars(description = "Exactly one subcategory name copied from the provided list")]
    pub subcategory: String,
}

/// Broader, lower-bar check for any legitimate connection to a practice area
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedConnectionCheck {
    #[schemars(description = "True if the narrative has any legitimate connection to this practice area")]
    pub has_connection: bool,

    #[schemars(description = "Best matching subcategory from the provided list")]
    pub subcategory: String,

    pub confidence: ExtractedConfidence,

    #[schemars(description = "Short explanation of the connection")]
    pub reasoning: String,

    #[serde(default)]
    pub relationships: Vec<String>,

    #[serde(default)]
    pub applicable_laws: Vec<String>,

    #[serde(default)]
    pub remedies: Vec<String>,

    #[schemars(description = "Urgency of the matter between 0.0 and 1.0")]
    pub urgency: f64,

    #[schemars(description = "Legal complexity of the matter between 0.0 and 1.0")]
    pub complexity: f64,

    #[serde(default)]
    pub keywords_found: Vec<String>,
}

/// Taxonomy-wide single best classification
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedGeneralClassification {
    #[schemars(description = "Exactly one category name from the provided taxonomy")]
    pub category: String,

    #[schemars(description = "Exactly one subcategory of the chosen category")]
    pub subcategory: String,

    pub confidence: ExtractedConfidence,

    #[schemars(description = "Explanation of why this category and subcategory fit best")]
    pub reasoning: String,

    #[serde(default)]
    pub relationships: Vec<String>,

    #[serde(default)]
    pub applicable_laws: Vec<String>,

    #[serde(default)]
    pub remedies: Vec<String>,

    #[schemars(description = "Urgency of the matter between 0.0 and 1.0")]
    pub urgency: f64,

    #[schemars(description = "Legal complexity of the matter between 0.0 and 1.0")]
    pub complexity: f64,

    #[serde(default)]
    pub keywords_found: Vec<String>,
}
