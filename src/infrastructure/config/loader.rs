use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{Config, ProviderKind};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid token limit: {0}. Must be positive")]
    InvalidTokenLimit(usize),

    #[error(
        "Invalid response reservation: {0} tokens reserved but the context window is only {1}"
    )]
    InvalidResponseReservation(usize, usize),

    #[error("Missing credentials for provider '{0}': {1}")]
    MissingCredentials(&'static str, &'static str),

    #[error("use_prompt_tags is enabled but prompt_tags is empty")]
    EmptyPromptTagList,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid external context budget: must be positive")]
    InvalidExternalContextBudget,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. tagsmith.yaml (project config)
    /// 3. tagsmith.local.yaml (local overrides, optional)
    /// 4. Environment variables (TAGSMITH_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("tagsmith.yaml"))
            .merge(Yaml::file("tagsmith.local.yaml"))
            .merge(Env::prefixed("TAGSMITH_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.tokens.limit == 0 {
            return Err(ConfigError::InvalidTokenLimit(config.tokens.limit));
        }

        // The reservation must leave room for at least some prompt/content
        if config.tokens.response_tokens >= config.tokens.limit {
            return Err(ConfigError::InvalidResponseReservation(
                config.tokens.response_tokens,
                config.tokens.limit,
            ));
        }

        if config.analysis.external_context_budget == 0 {
            return Err(ConfigError::InvalidExternalContextBudget);
        }

        if config.analysis.use_prompt_tags && config.analysis.prompt_tags.is_empty() {
            return Err(ConfigError::EmptyPromptTagList);
        }

        // Credential presence for the active provider; the provider registry
        // repeats these checks but this surfaces them with config context.
        match config.ai_provider {
            ProviderKind::OpenAi => {
                if config.openai.api_key.is_empty() {
                    return Err(ConfigError::MissingCredentials("openai", "api_key"));
                }
            }
            ProviderKind::Azure => {
                if config.azure.api_key.is_empty() {
                    return Err(ConfigError::MissingCredentials("azure", "api_key"));
                }
                if config.azure.endpoint.is_empty() || config.azure.deployment.is_empty() {
                    return Err(ConfigError::MissingCredentials(
                        "azure",
                        "endpoint and deployment",
                    ));
                }
            }
            ProviderKind::Ollama => {
                if config.ollama.api_url.is_empty() {
                    return Err(ConfigError::MissingCredentials("ollama", "api_url"));
                }
            }
            ProviderKind::Custom => {
                if config.custom.base_url.is_empty() || config.custom.model.is_empty() {
                    return Err(ConfigError::MissingCredentials(
                        "custom",
                        "base_url and model",
                    ));
                }
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.openai.api_key = "sk-test".to_string();
        config
    }

    #[test]
    fn test_default_config_needs_credentials() {
        let result = ConfigLoader::validate(&Config::default());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::MissingCredentials("openai", _)
        ));
    }

    #[test]
    fn test_valid_config_passes() {
        ConfigLoader::validate(&valid_config()).expect("config with credentials should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
ai_provider: ollama
ollama:
  api_url: http://gpu-box:11434
  model: mistral
tokens:
  limit: 4096
  response_tokens: 512
logging:
  level: debug
  format: json
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.ai_provider, ProviderKind::Ollama);
        assert_eq!(config.ollama.api_url, "http://gpu-box:11434");
        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.tokens.limit, 4096);
        assert_eq!(config.tokens.response_tokens, 512);
        assert_eq!(config.logging.level, "debug");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_token_limit() {
        let mut config = valid_config();
        config.tokens.limit = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTokenLimit(0)
        ));
    }

    #[test]
    fn test_validate_reservation_exceeding_limit() {
        let mut config = valid_config();
        config.tokens.limit = 512;
        config.tokens.response_tokens = 512;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidResponseReservation(512, 512)
        ));
    }

    #[test]
    fn test_validate_prompt_tags_without_list() {
        let mut config = valid_config();
        config.analysis.use_prompt_tags = true;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyPromptTagList
        ));
    }

    #[test]
    fn test_validate_azure_credentials() {
        let mut config = Config::default();
        config.ai_provider = ProviderKind::Azure;
        config.azure.api_key = "key".to_string();
        // endpoint and deployment still missing
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::MissingCredentials("azure", _)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = valid_config();
        config.logging.level = "verbose".to_string();
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = valid_config();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "openai:\n  api_key: sk-from-file\n  model: gpt-4o\nlogging:\n  level: info"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.openai.api_key, "sk-from-file");
        assert_eq!(config.openai.model, "gpt-4o", "base value should persist");
        assert_eq!(
            config.logging.level, "debug",
            "override should win for nested fields"
        );
        ConfigLoader::validate(&config).expect("merged config should be valid");
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ai_provider: ollama").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).expect("load should succeed");
        assert_eq!(config.ai_provider, ProviderKind::Ollama);
        assert_eq!(config.ollama.api_url, "http://localhost:11434");
    }
}
