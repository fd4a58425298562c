use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_CONFIG_PATH: &str = "CASE_TRIAGE_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_SPECIALIST_MODEL: &str = "SPECIALIST_MODEL";
const ENV_FALLBACK_MODEL: &str = "FALLBACK_MODEL";

/// Default model for specialist and fallback classification
const DEFAULT_MODEL: &str = rig::providers::openai::GPT_4O_MINI;

/// Classifier tuning knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Timeout applied to every single capability call
    pub call_timeout_secs: u64,
    /// Budget per specialist, counted from when it starts running; overruns are recorded as timed out
    pub specialist_budget_secs: u64,
    /// Maximum number of specialists running at once
    pub max_concurrency: usize,
    /// Evidentiary score a deep pass needs to skip the fallback pass
    pub accuracy_threshold: f64,
    pub consistency_threshold: f64,
    /// Pair substituted by the final fallback when its answer is outside the taxonomy
    pub default_category: String,
    pub default_subcategory: String,
    /// Taxonomy file overriding the embedded one
    pub taxonomy_path: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 12,
            specialist_budget_secs: 45,
            max_concurrency: 4,
            accuracy_threshold: 0.6,
            consistency_threshold: 0.6,
            default_category: "Government & Administrative Law".to_string(),
            default_subcategory: "General Administrative Law".to_string(),
            taxonomy_path: None,
        }
    }
}

impl ClassifierConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn specialist_budget(&self) -> Duration {
        Duration::from_secs(self.specialist_budget_secs)
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub specialist_model: String,
    pub fallback_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            specialist_model: DEFAULT_MODEL.to_string(),
            fallback_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let specialist_model =
            std::env::var(ENV_SPECIALIST_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let fallback_model =
            std::env::var(ENV_FALLBACK_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let config_path = std::env::var(ENV_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let classifier = Self::load_config_file(&config_path)
            .map(|cf| cf.classifier)
            .unwrap_or_default();

        Self {
            classifier,
            specialist_model,
            fallback_model,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => parse_config(path, &contents),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }
}

fn parse_config(path: &Path, contents: &str) -> Option<ConfigFile> {
    let contents = contents.trim();
    if contents.is_empty() {
        tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
        return Some(ConfigFile::default());
    }

    match serde_yaml::from_str(contents) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Loaded configuration from file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_classifier_section_keeps_defaults() {
        let yaml = "classifier:\n  call_timeout_secs: 8\n  max_concurrency: 13\n";
        let config = parse_config(Path::new("test.yaml"), yaml).unwrap();

        assert_eq!(config.classifier.call_timeout(), Duration::from_secs(8));
        assert_eq!(config.classifier.max_concurrency, 13);
        assert_eq!(config.classifier.specialist_budget_secs, 45);
        assert_eq!(config.classifier.accuracy_threshold, 0.6);
        assert_eq!(
            config.classifier.default_subcategory,
            "General Administrative Law"
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config(Path::new("test.yaml"), "   \n").unwrap();
        assert_eq!(config.classifier.call_timeout_secs, 12);
        assert!(config.classifier.taxonomy_path.is_none());
    }

    #[test]
    fn test_invalid_config_is_ignored() {
        assert!(parse_config(Path::new("test.yaml"), "classifier: [1, 2").is_none());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(Config::load_config_file("/nonexistent/case-triage.yaml").is_none());
    }
}
