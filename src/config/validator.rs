use crate::config::Config;
use crate::error::{PaperlensError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_search(config, &mut errors);
        Self::validate_report(config, &mut errors);
        Self::validate_time(config, &mut errors);
        Self::validate_llm(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PaperlensError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.search.and_query_size == 0 {
            errors.push(ValidationError::new(
                "search.and_query_size",
                "Query size must be greater than 0",
            ));
        }

        if config.search.or_query_size == 0 {
            errors.push(ValidationError::new(
                "search.or_query_size",
                "Query size must be greater than 0",
            ));
        }

        if config.search.rrf_k <= 0.0 {
            errors.push(ValidationError::new(
                "search.rrf_k",
                format!("RRF K must be positive, got {}", config.search.rrf_k),
            ));
        }

        let threshold = config.search.score_threshold;
        if !(0.0..1.0).contains(&threshold) {
            errors.push(ValidationError::new(
                "search.score_threshold",
                format!("Score threshold must be in [0, 1), got {}", threshold),
            ));
        }

        if config.search.max_final_results == 0 {
            errors.push(ValidationError::new(
                "search.max_final_results",
                "Result cap must be greater than 0",
            ));
        }
    }

    fn validate_report(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.report.excerpt_max_chars == 0 {
            errors.push(ValidationError::new(
                "report.excerpt_max_chars",
                "Excerpt cap must be greater than 0",
            ));
        }

        if config.report.citation_cap == 0 {
            errors.push(ValidationError::new(
                "report.citation_cap",
                "Citation cap must be at least 1",
            ));
        }
    }

    fn validate_time(config: &Config, errors: &mut Vec<ValidationError>) {
        let year = config.time.reference_year;
        if !(1900..=2100).contains(&year) {
            errors.push(ValidationError::new(
                "time.reference_year",
                format!("Reference year must be between 1900 and 2100, got {}", year),
            ));
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.llm.model.is_empty() {
            errors.push(ValidationError::new("llm.model", "Model name cannot be empty"));
        }

        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        let provider = &config.llm.provider;
        let valid_providers = ["vertexai", "openai", "anthropic", "ollama"];
        if !valid_providers.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    valid_providers, provider
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_result_cap_rejected() {
        let mut config = Config::default();
        config.search.max_final_results = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_negative_rrf_k_rejected() {
        let mut config = Config::default();
        config.search.rrf_k = -1.0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_out_of_range_reference_year_rejected() {
        let mut config = Config::default();
        config.time.reference_year = 1776;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = Config::default();
        config.llm.provider = "mystery".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
