//! Core memory engine struct combining tenant indexes and collaborators.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::errors::Error;
use crate::generation::Generator;
use crate::index::{IndexManager, Storage};
use crate::upstream;

/// Maximum allowed input length (100,000 bytes).
pub const MAX_INPUT_LENGTH: usize = 100_000;
/// Maximum allowed document id length in bytes.
pub const MAX_DOCUMENT_ID_LENGTH: usize = 256;
/// Maximum allowed limit for search and list operations.
pub const MAX_SEARCH_LIMIT: usize = crate::sqlite::MAX_SEARCH_LIMIT;

/// Tunables for query behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// `ask` returns a no-result answer when the question scores below this
    /// against the document. 0.0 disables the check.
    pub min_relevance: f64,
    /// Deadline for each embedding or generation call. None waits forever.
    pub upstream_timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_relevance: 0.0,
            upstream_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_relevance: config.min_relevance,
            upstream_timeout: match config.upstream_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Per-tenant document memory with semantic search and scoped question answering.
///
/// All operations take `&self`; share the engine behind an `Arc`. Embedding
/// and generation run outside every lock, and writes are committed in one
/// transaction after the last upstream call returns, so a cancelled or failed
/// operation never leaves a partial write.
pub struct MemoryEngine {
    pub(crate) indexes: IndexManager,
    pub(crate) embedder: Arc<dyn Embedder>,
    pub(crate) generator: Arc<dyn Generator>,
    pub(crate) options: EngineOptions,
}

impl MemoryEngine {
    /// Build an engine over `storage`, sized to the embedder's dimensionality.
    pub fn new(
        storage: Storage,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        options: EngineOptions,
    ) -> Self {
        let indexes = IndexManager::new(storage, embedder.dimensions());
        MemoryEngine {
            indexes,
            embedder,
            generator,
            options,
        }
    }

    /// Build an engine storing tenant indexes under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if the data or model cache directories cannot be created.
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, Error> {
        config.ensure_directories()?;
        Ok(Self::new(
            Storage::Directory(config.data_dir.clone()),
            embedder,
            generator,
            EngineOptions::from_config(config),
        ))
    }

    /// The tenant index manager.
    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Validate input length (rejects empty and whitespace-only inputs).
    pub(crate) fn validate_input_length(field: &str, text: &str) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(Error::invalid(format!("{field} cannot be empty")));
        }
        if text.len() > MAX_INPUT_LENGTH {
            return Err(Error::invalid(format!(
                "{field} is {} bytes, maximum is {MAX_INPUT_LENGTH}",
                text.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn validate_document_id(document_id: &str) -> Result<(), Error> {
        if document_id.trim().is_empty() {
            return Err(Error::invalid("document id cannot be empty"));
        }
        if document_id.len() > MAX_DOCUMENT_ID_LENGTH {
            return Err(Error::invalid(format!(
                "document id exceeds {MAX_DOCUMENT_ID_LENGTH} bytes"
            )));
        }
        Ok(())
    }

    /// Embed `text`, checking the provider honoured its declared dimensionality.
    pub(crate) async fn embed(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<f32>, Error> {
        let vector = upstream::guarded(
            "embedding",
            cancel,
            self.options.upstream_timeout,
            self.embedder.embed(text),
        )
        .await?;

        let expected = self.indexes.dims();
        if vector.len() != expected {
            return Err(Error::UpstreamUnavailable {
                service: "embedding",
                reason: format!("expected {expected} dimensions, got {}", vector.len()),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(Error::UpstreamUnavailable {
                service: "embedding",
                reason: "vector contains NaN or infinite values".to_string(),
            });
        }
        Ok(vector)
    }
}

/// Validate a caller-supplied limit, reporting violations as `InvalidArgument`.
pub(crate) fn validate_limit(limit: usize) -> Result<(), Error> {
    crate::sqlite::validate_limit(limit).map_err(|e| Error::invalid(e.to_string()))
}

pub(crate) fn tenant_not_found(tenant_id: &str) -> Error {
    Error::NotFound(format!("no index for tenant '{tenant_id}'"))
}

pub(crate) fn document_not_found(tenant_id: &str, document_id: &str) -> Error {
    Error::NotFound(format!(
        "document '{document_id}' not found in index '{tenant_id}'"
    ))
}
