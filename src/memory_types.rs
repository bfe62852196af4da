//! Memory engine result types.

use serde::Serialize;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Id of the matching document.
    pub document_id: String,
    /// Cosine similarity to the query (higher = more relevant).
    pub score: f64,
}

/// A document an answer drew from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub document_id: String,
    /// Similarity between the question and the document.
    pub relevance: f64,
    /// Last write time of the cited document (RFC 3339).
    pub last_updated: String,
}

/// Result of `ask`.
///
/// `no_result` distinguishes "the document does not answer this" from a
/// failure; failures are returned as errors instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    pub no_result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_result_reason: Option<String>,
    pub citations: Vec<Citation>,
}

impl Answer {
    pub(crate) fn no_result(question: &str, text: &str, reason: impl Into<String>) -> Self {
        Self {
            question: question.to_string(),
            text: text.to_string(),
            no_result: true,
            no_result_reason: Some(reason.into()),
            citations: Vec::new(),
        }
    }
}
