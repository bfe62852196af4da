//! Configuration file loading and parsing.

use crate::errors::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths;

/// Configuration loaded from TOML file. Absent keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub data_dir: Option<PathBuf>,
    pub embedding_model: Option<String>,
    pub model_cache: Option<PathBuf>,
    pub min_relevance: Option<f64>,
    pub upstream_timeout_secs: Option<u64>,
    pub llm_endpoint: Option<String>,
    pub llm_model: Option<String>,
}

/// Path of the config file: `$PEOPLEMEM_CONFIG`, else `<config_dir>/peoplemem/config.toml`.
pub fn config_file_path() -> PathBuf {
    if let Ok(explicit) = std::env::var("PEOPLEMEM_CONFIG") {
        if !explicit.trim().is_empty() {
            return paths::expand_tilde_path(Path::new(explicit.trim()));
        }
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
    config_dir.join("peoplemem/config.toml")
}

/// Load configuration from the TOML file, if one exists.
pub fn load_from_file() -> Result<Option<ConfigFile>, Error> {
    let config_path = config_file_path();

    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {e}",
            config_path.display()
        ))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {e}",
            config_path.display()
        ))
    })?;

    Ok(Some(config))
}
