//! Theorem Configuration
//!
//! Config file: ~/.config/theorem/config.toml or /etc/theorem/config.toml
//!
//! Every field has a default, so a partial file (or no file) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::llm_client::ModelConfig;

/// Answer extraction settings for the model fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Keyword that marks the answer line, matched as `<prefix>:` at line start
    pub answer_prefix: String,
    /// Characters kept when the response has no answer line
    pub max_answer_chars: usize,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            answer_prefix: "Answer".to_string(),
            max_answer_chars: 100,
        }
    }
}

/// Dataset evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Questions solved at the same time
    pub concurrency: usize,
    /// Questions taken from the head of a dataset
    pub samples: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            samples: 20,
        }
    }
}

/// Knowledge table source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Table file replacing the built-in table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TheoremConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub reasoning: ReasoningConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TheoremConfig {
    /// Get default user config path: ~/.config/theorem/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("theorem").join("config.toml"))
    }

    /// Get system config path: /etc/theorem/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/theorem/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config (~/.config/theorem/config.toml)
    /// 3. System config (/etc/theorem/config.toml)
    /// 4. Defaults
    ///
    /// `THEOREM_MODEL` and `THEOREM_ENDPOINT` override the model section.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => Self::load_default_locations()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_default_locations() -> Result<Self> {
        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TheoremConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    fn validate(&self) -> Result<()> {
        if self.batch.concurrency == 0 {
            anyhow::bail!("batch.concurrency must be at least 1");
        }
        if self.reasoning.answer_prefix.trim().is_empty() {
            anyhow::bail!("reasoning.answer_prefix must not be empty");
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("THEOREM_MODEL") {
            if !model.is_empty() {
                self.model.model = model;
            }
        }
        if let Ok(endpoint) = std::env::var("THEOREM_ENDPOINT") {
            if !endpoint.is_empty() {
                self.model.endpoint = endpoint;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TheoremConfig::default();
        assert_eq!(config.reasoning.answer_prefix, "Answer");
        assert_eq!(config.reasoning.max_answer_chars, 100);
        assert_eq!(config.batch.concurrency, 1);
        assert_eq!(config.batch.samples, 20);
        assert!(config.knowledge.path.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TheoremConfig::from_toml_str(
            r#"
            [model]
            model = "llama3.2:3b"

            [batch]
            concurrency = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.model.model, "llama3.2:3b");
        assert_eq!(config.model.endpoint, "http://127.0.0.1:11434");
        assert_eq!(config.batch.concurrency, 4);
        assert_eq!(config.batch.samples, 20);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(
            TheoremConfig::from_toml_str("").unwrap(),
            TheoremConfig::default()
        );
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = TheoremConfig::from_toml_str("[batch]\nconcurrency = 0\n").unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_toml_serialization() {
        let toml = TheoremConfig::default().to_toml_string().unwrap();
        assert!(toml.contains("[model]"));
        assert!(toml.contains("[reasoning]"));
        assert!(toml.contains("answer_prefix"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[knowledge]\npath = \"/srv/theorem/table.json\"").unwrap();

        let config = TheoremConfig::load_from(file.path()).unwrap();
        assert_eq!(
            config.knowledge.path,
            Some(PathBuf::from("/srv/theorem/table.json"))
        );
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err = TheoremConfig::load(Some(Path::new("/nonexistent/theorem.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
