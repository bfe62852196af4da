//! Semantic search and reference resolution.

use tokio_util::sync::CancellationToken;

use crate::errors::Error;
use crate::index::validate_tenant_id;
use crate::memory_types::SearchHit;

use super::store::{validate_limit, MemoryEngine};

impl MemoryEngine {
    /// Search a tenant's documents by semantic similarity.
    ///
    /// Embeds the query and ranks every document in the tenant's index by
    /// cosine similarity. Equal scores list the most recently written
    /// document first.
    ///
    /// # Returns
    ///
    /// At most `limit` hits, highest score first. A tenant without an index,
    /// or with an empty one, yields an empty list and no upstream call.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Limit is 0 or exceeds `MAX_SEARCH_LIMIT`
    /// - Query is empty or exceeds `MAX_INPUT_LENGTH`
    /// - Embedding fails (`UpstreamUnavailable`) or is cancelled
    pub async fn search(
        &self,
        tenant_id: &str,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchHit>, Error> {
        validate_tenant_id(tenant_id)?;
        validate_limit(limit)?;
        let query = query.trim();
        Self::validate_input_length("query", query)?;

        let Some(index) = self.indexes.get(tenant_id)? else {
            tracing::debug!(tenant = tenant_id, "search on tenant without index");
            return Ok(Vec::new());
        };
        if index.lock().count()? == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embed(query, cancel).await?;
        let ranked = index.lock().search(&embedding, limit)?;

        tracing::debug!(tenant = tenant_id, hits = ranked.len(), "search complete");
        Ok(ranked
            .into_iter()
            .map(|scored| SearchHit {
                document_id: scored.document_id,
                score: scored.score,
            })
            .collect())
    }

    /// Resolve a free-text reference to the best matching document id.
    ///
    /// Returns an empty string when the tenant has no documents. An empty
    /// string is a valid answer ("nobody matched"), not a failure.
    pub async fn resolve(
        &self,
        tenant_id: &str,
        reference: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        let hits = self.search(tenant_id, reference, 1, cancel).await?;
        Ok(hits
            .into_iter()
            .next()
            .map(|hit| hit.document_id)
            .unwrap_or_default())
    }
}
