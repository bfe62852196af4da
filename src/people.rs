//! People known to a user, stored as one document per person.
//!
//! `PeopleMemory` binds an engine to a single user's index. Each person is a
//! document whose id is the person id and whose text is everything known
//! about them; updates replace the whole record.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::errors::Error;
use crate::memory::MemoryEngine;
use crate::memory_types::Answer;

/// Memory of the people one user knows.
#[derive(Clone)]
pub struct PeopleMemory {
    engine: Arc<MemoryEngine>,
    user_id: String,
}

impl PeopleMemory {
    /// `user_id` names the index all of this user's people live in.
    pub fn new(engine: Arc<MemoryEngine>, user_id: impl Into<String>) -> Self {
        Self {
            engine,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Resolve a reference such as a name or description to a person id.
    ///
    /// Returns an empty string when no person is known yet.
    pub async fn resolve_person_id(
        &self,
        reference: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.engine.resolve(&self.user_id, reference, cancel).await
    }

    /// Answer a question about one person, using only that person's record.
    pub async fn ask(
        &self,
        person_id: &str,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Answer, Error> {
        self.engine.ask(&self.user_id, person_id, question, cancel).await
    }

    /// Add a person, or replace everything known about them.
    pub async fn add_or_update_person(
        &self,
        person_id: &str,
        text_about_person: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        self.engine
            .upsert(&self.user_id, person_id, text_about_person, cancel)
            .await
    }

    /// Forget a person.
    pub async fn delete_person(
        &self,
        person_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        self.engine.delete(&self.user_id, person_id, cancel).await
    }
}
