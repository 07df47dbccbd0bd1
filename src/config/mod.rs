//! Configuration (`spec.md` §6, ambient).
//!
//! A plain struct with sensible defaults, overridable from environment
//! variables (prefix `EXTRACTOR__`, double-underscore nesting, e.g.
//! `EXTRACTOR__LLM__MODEL`) and an optional config file via the `config`
//! crate.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: 2048,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: "all-MiniLM-L6-v2".to_string(),
        }
    }
}

/// Extraction-pipeline defaults, mirroring [`crate::model::ExtractionOptions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionDefaults {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_concurrency: usize,
    pub dedup_threshold: f32,
    pub default_output_formats: Vec<String>,
    pub default_domain: String,
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        Self {
            chunk_size: crate::chunking::DEFAULT_CHUNK_SIZE,
            chunk_overlap: crate::chunking::DEFAULT_OVERLAP,
            max_concurrency: 20,
            dedup_threshold: 0.9,
            default_output_formats: vec!["structured".to_string()],
            default_domain: String::new(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub extraction: ExtractionDefaults,
}

impl AppConfig {
    /// Loads configuration by layering, lowest to highest precedence:
    /// built-in defaults, an optional config file (TOML or JSON,
    /// resolved via [`dirs::config_dir`] under `extractor/config`), and
    /// `EXTRACTOR__`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a source fails to parse
    /// or deserialize into [`AppConfig`].
    pub fn load() -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default()).map_err(|e| ConfigError::InvalidValue {
            key: "<defaults>".to_string(),
            reason: e.to_string(),
        })?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("extractor").join("config");
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("EXTRACTOR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "<build>".to_string(),
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidValue {
                key: "<deserialize>".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}
