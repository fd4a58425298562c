//! Application state and service initialization
//!
//! Builds the classifier dependency graph once at startup: taxonomy, capability
//! adapter, specialist roster, final fallback, coordinator and sanitizer.

use std::sync::Arc;

use crate::model::{Config, Taxonomy, TaxonomyError};
use crate::service::agent::Agent;
use crate::service::{
    ClassificationCapability, Coordinator, FinalFallbackClassifier, LlmClient, Orchestrator,
    RegexSanitizer, RigCapability, SpecialistClassifier, SpecialistSettings,
};

/// Application state containing the orchestrator and its shared resources
pub struct AppState {
    pub taxonomy: Arc<Taxonomy>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Taxonomy loading (file override or embedded)
    /// 2. LLM client initialization (requires OPENAI_API_KEY)
    /// 3. Specialist roster and orchestrator construction
    pub fn new(config: Config) -> Result<Self, AppError> {
        let classifier = config.classifier;

        let taxonomy = Arc::new(match &classifier.taxonomy_path {
            Some(path) => Taxonomy::from_path(path)?,
            None => Taxonomy::embedded()?,
        });

        if !taxonomy.contains(&classifier.default_category, &classifier.default_subcategory) {
            return Err(AppError::InvalidConfig(
                "default_category/default_subcategory not in taxonomy",
            ));
        }

        tracing::info!(categories = taxonomy.len(), "Taxonomy loaded");

        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AppError::MissingConfig("OPENAI_API_KEY"))?;

        let llm_client = LlmClient::new(&api_key)
            .map_err(|_| AppError::InvalidConfig("Invalid OPENAI_API_KEY"))?;

        let capability: Arc<dyn ClassificationCapability> = Arc::new(RigCapability::new(
            llm_client,
            config.specialist_model,
            config.fallback_model,
        ));

        let settings = SpecialistSettings {
            call_timeout: classifier.call_timeout(),
            accuracy_threshold: classifier.accuracy_threshold,
        };

        let specialists: Vec<Arc<dyn Agent>> = taxonomy
            .profiles()
            .iter()
            .map(|profile| {
                Arc::new(SpecialistClassifier::new(
                    Arc::clone(profile),
                    Arc::clone(&taxonomy),
                    Arc::clone(&capability),
                    settings,
                )) as Arc<dyn Agent>
            })
            .collect();

        let final_fallback = Arc::new(FinalFallbackClassifier::new(
            Arc::clone(&taxonomy),
            capability,
            classifier.call_timeout(),
            classifier.default_category.clone(),
            classifier.default_subcategory.clone(),
        ));

        let coordinator: Arc<dyn Agent> = Arc::new(Coordinator::new(
            classifier.consistency_threshold,
            classifier.accuracy_threshold,
        ));

        let orchestrator = Orchestrator::new(
            Arc::clone(&taxonomy),
            specialists,
            final_fallback,
            coordinator,
            Arc::new(RegexSanitizer::new()),
            classifier,
        );

        Ok(Self {
            taxonomy,
            orchestrator,
        })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Taxonomy could not be loaded
    #[error("Failed to load taxonomy: {0}")]
    Taxonomy(#[from] TaxonomyError),
}
