//! Configuration management for paperlens
//!
//! All tuning constants that are part of the observable retrieval contract
//! (RRF k, score threshold, result caps, query sizes, excerpt and citation
//! caps, the reference year) live here rather than inline in logic.

use crate::error::{PaperlensError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub search: SearchConfig,
    pub report: ReportConfig,
    pub time: TimeConfig,
    pub llm: LlmConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Retrieval and fusion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Index query size for AND-mode searches
    pub and_query_size: usize,

    /// Index query size for OR-mode searches (larger, for comprehensiveness)
    pub or_query_size: usize,

    /// RRF K constant (typically 60)
    pub rrf_k: f64,

    /// Minimum fused score for an AND-mode result to be kept
    pub score_threshold: f64,

    /// Cap on the curated AND-mode result list; also the size of the
    /// OR-mode subset shown to the model
    pub max_final_results: usize,
}

/// Report composition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Per-source content excerpt cap, in characters
    pub excerpt_max_chars: usize,

    /// Maximum citation numbers kept per inline marker group
    pub citation_cap: usize,
}

/// Time-window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// The active analysis year that relative windows resolve against
    pub reference_year: i32,
}

/// Language model configuration.
///
/// The pipeline never talks to a vendor SDK itself; the caller constructs
/// its [`crate::report::LanguageModel`] implementation from this section
/// (provider, model name, generation parameters) before handing it to the
/// orchestrator. Validation here keeps the section sane at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PaperlensError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PaperlensError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| PaperlensError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: PAPERLENS_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("PAPERLENS_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SEARCH__SCORE_THRESHOLD" => {
                self.search.score_threshold =
                    value.parse().map_err(|_| PaperlensError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as float", value),
                    })?;
            }
            "SEARCH__MAX_FINAL_RESULTS" => {
                self.search.max_final_results =
                    value.parse().map_err(|_| PaperlensError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "TIME__REFERENCE_YEAR" => {
                self.time.reference_year =
                    value.parse().map_err(|_| PaperlensError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as year", value),
                    })?;
            }
            "LLM__MODEL" => {
                self.llm.model = value.to_string();
            }
            "LLM__PROVIDER" => {
                self.llm.provider = value.to_string();
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            PaperlensError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("paperlens").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            search: SearchConfig {
                and_query_size: 100,
                or_query_size: 200,
                rrf_k: 60.0,
                score_threshold: 0.005,
                max_final_results: 15,
            },
            report: ReportConfig {
                excerpt_max_chars: 4000,
                citation_cap: 3,
            },
            time: TimeConfig {
                reference_year: 2025,
            },
            llm: LlmConfig {
                provider: "vertexai".to_string(),
                api_key_env: "VERTEXAI_API_KEY".to_string(),
                model: "gemini-1.5-pro".to_string(),
                temperature: 0.2,
                max_output_tokens: 8192,
            },
        }
    }
}
