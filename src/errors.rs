//! Error types for peoplemem.

use thiserror::Error;

/// Main error type for peoplemem operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input: empty id, blank text, zero limit and so on.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced tenant index or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Embedding or generation collaborator failed or timed out.
    #[error("Upstream {service} unavailable: {reason}")]
    UpstreamUnavailable {
        service: &'static str,
        reason: String,
    },

    /// Operation aborted through its cancellation token. Nothing was committed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] crate::sqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// ONNX inference error.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Tokenization error.
    #[error("Tokenization error: {0}")]
    Tokenization(#[from] tokenizers::Error),

    /// ONNX session error.
    #[error("ONNX session error: {0}")]
    Onnx(#[from] ort::Error),

    /// HuggingFace Hub error.
    #[error("HuggingFace Hub error: {0}")]
    HfHub(#[from] hf_hub::api::sync::ApiError),
}

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    UpstreamUnavailable,
    Cancelled,
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            Error::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Internal,
        }
    }

    /// Whether a caller may retry the same request with backoff.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamUnavailable
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

/// Failure reported by an external collaborator (embedding or generation).
#[derive(Error, Debug)]
#[error("{message}")]
pub struct UpstreamError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
