//! External classification capability
//!
//! Every classifier talks to the language model through [`ClassificationCapability`].
//! The production implementation uses rig structured extraction; tests script it.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rig::client::CompletionClient;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::extraction::{
    ExtractedConnectionCheck, ExtractedGeneralClassification, ExtractedSpecialistAnalysis,
    ExtractedSubcategoryChoice,
};
use crate::model::{SpecialistProfile, Taxonomy};
use crate::service::llm::LlmClient;
use crate::service::prompts::{
    CONNECTION_SYSTEM_PROMPT, GENERAL_SYSTEM_PROMPT, SPECIALIST_SYSTEM_PROMPT,
    SUBCATEGORY_SYSTEM_PROMPT, build_connection_prompt, build_general_prompt,
    build_specialist_prompt, build_subcategory_prompt,
};

/// Error type for capability calls
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CapabilityError {
    #[error("Capability call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Capability request failed: {0}")]
    Request(String),

    #[error("Capability returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Structured requests against the external classification service
#[async_trait]
pub trait ClassificationCapability: Send + Sync {
    /// Deep, area-specific analysis of a narrative
    async fn analyze(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedSpecialistAnalysis, CapabilityError>;

    /// Re-ask restricted to the area's valid subcategories
    async fn choose_subcategory(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedSubcategoryChoice, CapabilityError>;

    /// Lower-bar check for any legitimate connection to the area
    async fn check_connection(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedConnectionCheck, CapabilityError>;

    /// Single best category and subcategory across the whole taxonomy
    async fn classify_general(
        &self,
        narrative: &str,
        taxonomy: &Taxonomy,
    ) -> Result<ExtractedGeneralClassification, CapabilityError>;
}

/// Run a capability call under a per-call timeout
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CapabilityError::Timeout {
            seconds: timeout.as_secs(),
        }),
    }
}

/// Capability backed by OpenAI structured extraction
pub struct RigCapability {
    llm_client: LlmClient,
    specialist_model: String,
    fallback_model: String,
}

impl RigCapability {
    pub fn new(llm_client: LlmClient, specialist_model: String, fallback_model: String) -> Self {
        tracing::info!(
            specialist_model = %specialist_model,
            fallback_model = %fallback_model,
            "Classification capability initialized"
        );

        Self {
            llm_client,
            specialist_model,
            fallback_model,
        }
    }

    async fn extract<T>(
        &self,
        model: &str,
        preamble: &str,
        prompt: String,
        operation: &'static str,
    ) -> Result<T, CapabilityError>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let start_time = Instant::now();
        let prompt_length = prompt.len();

        tracing::debug!(
            operation = operation,
            model = %model,
            prompt_length = prompt_length,
            "Initiating OpenAI API call"
        );

        // Use temperature=0.0 and seed for deterministic, reproducible outputs
        let extractor = self
            .llm_client
            .openai_client()
            .extractor::<T>(model)
            .preamble(preamble)
            .additional_params(serde_json::json!({
                "temperature": 0.0,
                "seed": 42
            }))
            .build();

        match extractor.extract(&prompt).await {
            Ok(result) => {
                tracing::info!(
                    operation = operation,
                    model = %model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    prompt_length = prompt_length,
                    "OpenAI API call completed successfully"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!(
                    operation = operation,
                    model = %model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    prompt_length = prompt_length,
                    error = %e,
                    "OpenAI API call failed"
                );
                Err(CapabilityError::Request(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl ClassificationCapability for RigCapability {
    async fn analyze(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedSpecialistAnalysis, CapabilityError> {
        let analysis: ExtractedSpecialistAnalysis = self
            .extract(
                &self.specialist_model,
                SPECIALIST_SYSTEM_PROMPT,
                build_specialist_prompt(narrative, profile),
                "specialist_analysis",
            )
            .await?;

        if !(0.0..=1.0).contains(&analysis.urgency) || !(0.0..=1.0).contains(&analysis.complexity)
        {
            return Err(CapabilityError::InvalidResponse(format!(
                "urgency {} / complexity {} outside [0, 1]",
                analysis.urgency, analysis.complexity
            )));
        }

        Ok(analysis)
    }

    async fn choose_subcategory(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedSubcategoryChoice, CapabilityError> {
        self.extract(
            &self.specialist_model,
            SUBCATEGORY_SYSTEM_PROMPT,
            build_subcategory_prompt(narrative, profile),
            "subcategory_choice",
        )
        .await
    }

    async fn check_connection(
        &self,
        narrative: &str,
        profile: &SpecialistProfile,
    ) -> Result<ExtractedConnectionCheck, CapabilityError> {
        self.extract(
            &self.specialist_model,
            CONNECTION_SYSTEM_PROMPT,
            build_connection_prompt(narrative, profile),
            "connection_check",
        )
        .await
    }

    async fn classify_general(
        &self,
        narrative: &str,
        taxonomy: &Taxonomy,
    ) -> Result<ExtractedGeneralClassification, CapabilityError> {
        self.extract(
            &self.fallback_model,
            GENERAL_SYSTEM_PROMPT,
            build_general_prompt(narrative, taxonomy),
            "general_classification",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_through_result() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, CapabilityError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_with_timeout_reports_timeout() {
        let result: Result<(), _> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(CapabilityError::Timeout { seconds: 0 })));
    }
}
