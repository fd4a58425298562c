//! Shared OpenAI client
//!
//! Created once at startup and cloned into the capability adapter.

use rig::providers::openai;

use crate::service::capability::CapabilityError;

#[derive(Clone)]
pub struct LlmClient {
    client: openai::Client,
}

impl LlmClient {
    pub fn new(api_key: &str) -> Result<Self, CapabilityError> {
        if api_key.trim().is_empty() {
            return Err(CapabilityError::Request(
                "Failed to create OpenAI client: empty API key".to_string(),
            ));
        }
        let client = openai::Client::new(api_key);

        Ok(Self { client })
    }

    /// Underlying client, used to build typed extractors
    pub fn openai_client(&self) -> &openai::Client {
        &self.client
    }
}
