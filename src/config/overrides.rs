//! Environment variable overrides for configuration.

use crate::errors::Error;

use super::env_parser;
use super::Config;

/// Apply environment variable overrides to configuration.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), Error> {
    env_parser::apply_path_override("PEOPLEMEM_DATA_DIR", &mut config.data_dir)?;
    env_parser::apply_string_override("PEOPLEMEM_EMBEDDING_MODEL", &mut config.embedding_model)?;
    env_parser::apply_path_override("PEOPLEMEM_MODEL_CACHE", &mut config.model_cache)?;
    env_parser::apply_number_override("PEOPLEMEM_MIN_RELEVANCE", &mut config.min_relevance)?;
    env_parser::apply_number_override(
        "PEOPLEMEM_UPSTREAM_TIMEOUT_SECS",
        &mut config.upstream_timeout_secs,
    )?;
    env_parser::apply_string_override("PEOPLEMEM_LLM_ENDPOINT", &mut config.llm_endpoint)?;
    env_parser::apply_string_override("PEOPLEMEM_LLM_MODEL", &mut config.llm_model)?;
    env_parser::apply_optional_string_override("PEOPLEMEM_LLM_API_KEY", &mut config.llm_api_key)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_utils::{cleanup_env_vars, set_env, ENV_MUTEX};
    use std::path::PathBuf;

    #[test]
    fn test_env_var_overrides_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env("PEOPLEMEM_DATA_DIR", "/custom/indexes");
        set_env("PEOPLEMEM_EMBEDDING_MODEL", "env/model");
        set_env("PEOPLEMEM_MODEL_CACHE", "/custom/cache");
        set_env("PEOPLEMEM_MIN_RELEVANCE", "0.4");
        set_env("PEOPLEMEM_UPSTREAM_TIMEOUT_SECS", "5");
        set_env("PEOPLEMEM_LLM_MODEL", "qwen2.5");
        set_env("PEOPLEMEM_LLM_API_KEY", "sk-test");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/custom/indexes"));
        assert_eq!(config.embedding_model, "env/model");
        assert_eq!(config.model_cache, PathBuf::from("/custom/cache"));
        assert_eq!(config.min_relevance, 0.4);
        assert_eq!(config.upstream_timeout_secs, 5);
        assert_eq!(config.llm_model, "qwen2.5");
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-test"));

        cleanup_env_vars();
    }

    #[test]
    fn test_unset_env_keeps_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();

        let defaults = Config::default();
        assert_eq!(config.data_dir, defaults.data_dir);
        assert_eq!(config.llm_endpoint, defaults.llm_endpoint);
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn test_whitespace_env_var_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env("PEOPLEMEM_EMBEDDING_MODEL", "   ");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }

    #[test]
    fn test_invalid_min_relevance_format() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env("PEOPLEMEM_MIN_RELEVANCE", "invalid");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }
}
