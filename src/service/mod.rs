pub mod agent;
pub mod capability;
pub mod confidence;
pub mod coordinator;
pub mod fallback;
pub mod fingerprint;
pub mod guardrails;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod sanitizer;
pub mod specialist;
pub mod validators;

#[cfg(test)]
pub mod testing;

pub use capability::{ClassificationCapability, RigCapability};
pub use coordinator::Coordinator;
pub use fallback::FinalFallbackClassifier;
pub use llm::LlmClient;
pub use orchestrator::Orchestrator;
pub use sanitizer::RegexSanitizer;
pub use specialist::{SpecialistClassifier, SpecialistSettings};
