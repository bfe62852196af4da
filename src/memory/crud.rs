//! CRUD operations for the memory engine.

use tokio_util::sync::CancellationToken;

use crate::errors::Error;
use crate::index::validate_tenant_id;
use crate::sqlite::Document;

use super::store::{document_not_found, tenant_not_found, validate_limit, MemoryEngine};

impl MemoryEngine {
    /// Insert or fully replace a document in the tenant's index.
    ///
    /// Creates the tenant index on first write. The text is embedded before
    /// any lock is taken; content and vector are then committed together in
    /// one transaction. Upserting text identical to the stored content is a
    /// no-op and makes no upstream call.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a malformed tenant id, document id or text
    /// - `UpstreamUnavailable` if embedding fails or times out
    /// - `Cancelled` if `cancel` fires before the commit; nothing is written
    pub async fn upsert(
        &self,
        tenant_id: &str,
        document_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        validate_tenant_id(tenant_id)?;
        Self::validate_document_id(document_id)?;
        Self::validate_input_length("text", text)?;

        if let Some(index) = self.indexes.get(tenant_id)? {
            let unchanged = index
                .lock()
                .get(document_id)?
                .is_some_and(|doc| doc.content == text);
            if unchanged {
                tracing::debug!(tenant = tenant_id, document = document_id, "upsert unchanged");
                return Ok(());
            }
        }

        let embedding = self.embed(text, cancel).await?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let index = self.indexes.get_or_create(tenant_id)?;
        let outcome = index.lock().put(document_id, text, &embedding)?;

        tracing::info!(
            tenant = tenant_id,
            document = document_id,
            ?outcome,
            "document upserted"
        );
        Ok(())
    }

    #[must_use = "handle the error or results may be lost"]
    /// Get a document by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the tenant has no index or the document is absent.
    pub fn get(&self, tenant_id: &str, document_id: &str) -> Result<Document, Error> {
        Self::validate_document_id(document_id)?;
        let index = self
            .indexes
            .get(tenant_id)?
            .ok_or_else(|| tenant_not_found(tenant_id))?;

        let document = index.lock().get(document_id)?;
        document.ok_or_else(|| document_not_found(tenant_id, document_id))
    }

    #[must_use = "handle the error or results may be lost"]
    /// List a tenant's documents, most recently updated first.
    ///
    /// A tenant without an index has no documents.
    pub fn list(&self, tenant_id: &str, limit: usize) -> Result<Vec<Document>, Error> {
        validate_limit(limit)?;
        match self.indexes.get(tenant_id)? {
            Some(index) => Ok(index.lock().list(limit)?),
            None => Ok(Vec::new()),
        }
    }

    /// Delete a document together with its vector.
    ///
    /// # Errors
    ///
    /// `NotFound` if the tenant has no index or the document is absent,
    /// including when it was already deleted. `Cancelled` if `cancel` has
    /// fired before the delete starts.
    pub async fn delete(
        &self,
        tenant_id: &str,
        document_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        validate_tenant_id(tenant_id)?;
        Self::validate_document_id(document_id)?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let index = self
            .indexes
            .get(tenant_id)?
            .ok_or_else(|| tenant_not_found(tenant_id))?;

        let removed = index.lock().remove(document_id)?;
        if !removed {
            return Err(document_not_found(tenant_id, document_id));
        }

        tracing::info!(tenant = tenant_id, document = document_id, "document deleted");
        Ok(())
    }
}
