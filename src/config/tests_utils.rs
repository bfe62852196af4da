//! Shared test utilities for config module tests.

use std::sync::Mutex;

/// Mutex to serialize environment variable tests and prevent race conditions.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Every environment variable the config layer reads.
pub const ENV_VARS: &[&str] = &[
    "PEOPLEMEM_CONFIG",
    "PEOPLEMEM_DATA_DIR",
    "PEOPLEMEM_EMBEDDING_MODEL",
    "PEOPLEMEM_MODEL_CACHE",
    "PEOPLEMEM_MIN_RELEVANCE",
    "PEOPLEMEM_UPSTREAM_TIMEOUT_SECS",
    "PEOPLEMEM_LLM_ENDPOINT",
    "PEOPLEMEM_LLM_MODEL",
    "PEOPLEMEM_LLM_API_KEY",
];

/// Set an environment variable. Callers must hold `ENV_MUTEX`.
pub fn set_env(var: &str, value: &str) {
    // SAFETY: env-mutating tests are serialized by ENV_MUTEX.
    unsafe { std::env::set_var(var, value) }
}

/// Clean up environment variables used by peoplemem config. Callers must hold `ENV_MUTEX`.
pub fn cleanup_env_vars() {
    for var in ENV_VARS {
        // SAFETY: env-mutating tests are serialized by ENV_MUTEX.
        unsafe { std::env::remove_var(var) }
    }
}
