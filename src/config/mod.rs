//! Configuration system for peoplemem.

mod env_parser;
mod loader;
mod overrides;
mod paths;
mod validation;

#[cfg(test)]
mod tests_utils;

use crate::errors::Error;
use std::path::PathBuf;

pub use loader::{config_file_path, ConfigFile};

/// Configuration values with priority: defaults < config file < env vars.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one index file per tenant.
    pub data_dir: PathBuf,

    /// HuggingFace embedding model identifier.
    pub embedding_model: String,

    /// Directory for caching ONNX models.
    pub model_cache: PathBuf,

    /// Minimum similarity a document must reach before `ask` consults the generator.
    pub min_relevance: f64,

    /// Deadline for each embedder or generator call, in seconds. 0 disables it.
    pub upstream_timeout_secs: u64,

    /// Base URL of an OpenAI-compatible chat completions API.
    pub llm_endpoint: String,

    /// Model name sent to the chat completions API.
    pub llm_model: String,

    /// Bearer token for the chat completions API. Only read from the environment.
    pub llm_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let base = paths::peoplemem_home();

        Self {
            data_dir: base.join("indexes"),
            embedding_model: "BAAI/bge-small-en-v1.5".to_string(),
            model_cache: base.join("models"),
            min_relevance: 0.0,
            upstream_timeout_secs: 60,
            llm_endpoint: "http://localhost:11434/v1".to_string(),
            llm_model: "llama3.2".to_string(),
            llm_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration with defaults, file values, and environment overrides.
    pub fn load() -> Result<Self, Error> {
        let mut config = Config::default();

        if let Some(file) = loader::load_from_file()? {
            config.merge_from_file(file);
        }

        overrides::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Merge the keys present in a config file into this config.
    fn merge_from_file(&mut self, file: ConfigFile) {
        if let Some(mut data_dir) = file.data_dir {
            paths::expand_tilde(&mut data_dir);
            self.data_dir = data_dir;
        }
        if let Some(model) = file.embedding_model {
            self.embedding_model = model;
        }
        if let Some(mut model_cache) = file.model_cache {
            paths::expand_tilde(&mut model_cache);
            self.model_cache = model_cache;
        }
        if let Some(min_relevance) = file.min_relevance {
            self.min_relevance = min_relevance;
        }
        if let Some(secs) = file.upstream_timeout_secs {
            self.upstream_timeout_secs = secs;
        }
        if let Some(endpoint) = file.llm_endpoint {
            self.llm_endpoint = endpoint;
        }
        if let Some(model) = file.llm_model {
            self.llm_model = model;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), Error> {
        validation::validate(self)
    }

    /// Create the data and model cache directories if missing.
    pub fn ensure_directories(&self) -> Result<(), Error> {
        for (what, dir) in [("data", &self.data_dir), ("model cache", &self.model_cache)] {
            if dir.as_os_str().is_empty() {
                continue;
            }
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::Config(format!(
                    "Failed to create {what} directory {}: {e}",
                    dir.display()
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tests_utils::{cleanup_env_vars, set_env, ENV_MUTEX};

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.data_dir.ends_with(".peoplemem/indexes"));
        assert_eq!(config.embedding_model, "BAAI/bge-small-en-v1.5");
        assert!(config.model_cache.ends_with(".peoplemem/models"));
        assert_eq!(config.min_relevance, 0.0);
        assert_eq!(config.upstream_timeout_secs, 60);
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn test_config_load_without_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();
        let dir = tempfile::tempdir().unwrap();
        set_env(
            "PEOPLEMEM_CONFIG",
            dir.path().join("missing.toml").to_str().unwrap(),
        );

        let config = Config::load().unwrap();

        assert!(config.data_dir.ends_with(".peoplemem/indexes"));
        assert_eq!(config.llm_model, "llama3.2");

        cleanup_env_vars();
    }

    #[test]
    fn test_file_then_env_precedence() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"/from/file\"\nmin_relevance = 0.3\nllm_model = \"file-model\"\n",
        )
        .unwrap();
        set_env("PEOPLEMEM_CONFIG", path.to_str().unwrap());
        set_env("PEOPLEMEM_LLM_MODEL", "env-model");

        let config = Config::load().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/from/file"));
        assert_eq!(config.min_relevance, 0.3);
        assert_eq!(config.llm_model, "env-model");
        assert_eq!(config.embedding_model, "BAAI/bge-small-en-v1.5");

        cleanup_env_vars();
    }

    #[test]
    fn test_load_rejects_out_of_range_file_value() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "min_relevance = 2.0\n").unwrap();
        set_env("PEOPLEMEM_CONFIG", path.to_str().unwrap());

        assert!(matches!(Config::load(), Err(Error::Config(_))));

        cleanup_env_vars();
    }

    #[test]
    fn test_ensure_directories_creates_both() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().join("a/indexes"),
            model_cache: dir.path().join("b/models"),
            ..Config::default()
        };

        config.ensure_directories().unwrap();

        assert!(config.data_dir.is_dir());
        assert!(config.model_cache.is_dir());
    }
}
