//! Question answering scoped to a single document.

use tokio_util::sync::CancellationToken;

use crate::errors::Error;
use crate::generation::{ContextPassage, NO_ANSWER};
use crate::index::validate_tenant_id;
use crate::memory_types::{Answer, Citation};
use crate::upstream;

use super::store::{document_not_found, tenant_not_found, MemoryEngine};

impl MemoryEngine {
    /// Answer `question` using only the document `document_id`.
    ///
    /// Retrieval reads exactly one row of the tenant's document store and
    /// vector index, so no other document can reach the generator. Documents
    /// are short records and are passed whole.
    ///
    /// # Returns
    ///
    /// An answer citing the document, or a `no_result` answer when the
    /// question scores below `min_relevance` or the generator reports that the
    /// document does not contain the answer.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the tenant index or the document does not exist
    /// - `UpstreamUnavailable` if embedding or generation fails or times out
    /// - `InvalidArgument` for malformed ids or an empty question
    pub async fn ask(
        &self,
        tenant_id: &str,
        document_id: &str,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Answer, Error> {
        validate_tenant_id(tenant_id)?;
        Self::validate_document_id(document_id)?;
        let question = question.trim();
        Self::validate_input_length("question", question)?;

        let index = self
            .indexes
            .get(tenant_id)?
            .ok_or_else(|| tenant_not_found(tenant_id))?;
        if !index.lock().contains(document_id)? {
            return Err(document_not_found(tenant_id, document_id));
        }

        let embedding = self.embed(question, cancel).await?;

        // Content and score are read under one lock so they describe the same write.
        let (document, relevance) = {
            let db = index.lock();
            match (db.get(document_id)?, db.score(document_id, &embedding)?) {
                (Some(document), Some(relevance)) => (document, relevance),
                _ => return Err(document_not_found(tenant_id, document_id)),
            }
        };

        let min_relevance = self.options.min_relevance;
        if min_relevance > 0.0 && relevance < min_relevance {
            tracing::debug!(
                tenant = tenant_id,
                document = document_id,
                relevance,
                "question below relevance threshold"
            );
            return Ok(Answer::no_result(
                question,
                NO_ANSWER,
                format!("relevance {relevance:.3} is below the minimum {min_relevance:.3}"),
            ));
        }

        let context = [ContextPassage {
            document_id: document.id.clone(),
            text: document.content,
            relevance,
        }];
        let text = upstream::guarded(
            "generation",
            cancel,
            self.options.upstream_timeout,
            self.generator.generate(question, &context),
        )
        .await?;

        let text = text.trim();
        if text.is_empty() || text == NO_ANSWER {
            return Ok(Answer::no_result(
                question,
                NO_ANSWER,
                "the document does not answer the question",
            ));
        }

        tracing::debug!(tenant = tenant_id, document = document_id, "question answered");
        Ok(Answer {
            question: question.to_string(),
            text: text.to_string(),
            no_result: false,
            no_result_reason: None,
            citations: vec![Citation {
                document_id: document.id,
                relevance,
                last_updated: document.updated_at,
            }],
        })
    }
}
