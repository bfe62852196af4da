//! Configuration validation logic.

use crate::errors::Error;

use super::Config;

/// Validate all configuration values.
///
/// Checks that:
/// - `min_relevance` is finite and between 0.0 and 1.0
/// - Embedding model and LLM model are not empty
/// - Data directory is not empty
/// - LLM endpoint is an http(s) URL
///
/// # Errors
///
/// Returns `Error::Config` naming the first failing setting.
pub fn validate(config: &Config) -> Result<(), Error> {
    validate_min_relevance(config.min_relevance)?;
    validate_non_empty("embedding_model", &config.embedding_model)?;
    validate_non_empty("llm_model", &config.llm_model)?;

    if config.data_dir.as_os_str().is_empty() {
        return Err(Error::Config("data_dir cannot be empty".to_string()));
    }

    validate_endpoint(&config.llm_endpoint)
}

fn validate_min_relevance(value: f64) -> Result<(), Error> {
    if !value.is_finite() {
        return Err(Error::Config(
            "Invalid min_relevance: NaN and infinity are not allowed".into(),
        ));
    }

    if !(0.0..=1.0).contains(&value) {
        return Err(Error::Config(format!(
            "Invalid min_relevance: {value} (must be between 0.0 and 1.0)"
        )));
    }

    Ok(())
}

fn validate_non_empty(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn validate_endpoint(endpoint: &str) -> Result<(), Error> {
    let endpoint = endpoint.trim();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Invalid llm_endpoint: {endpoint:?} (must start with http:// or https://)"
        )));
    }
    Ok(())
}
