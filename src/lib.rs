//! peoplemem - per-tenant semantic memory of documents.
//!
//! Each tenant (typically one user) gets an isolated index holding documents
//! keyed by id. Documents are embedded on write and can be searched by
//! meaning, resolved from a loose reference, or asked questions answered
//! from their text by a language model.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use peoplemem::{ChatCompletionsGenerator, Config, MemoryEngine, OnnxEmbedder, PeopleMemory};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), peoplemem::Error> {
//! let config = Config::load()?;
//! let embedder = Arc::new(OnnxEmbedder::new(&config.embedding_model, &config.model_cache)?);
//! let generator = Arc::new(ChatCompletionsGenerator::new(
//!     &config.llm_endpoint,
//!     &config.llm_model,
//!     config.llm_api_key.clone(),
//! ));
//! let engine = Arc::new(MemoryEngine::from_config(&config, embedder, generator)?);
//!
//! let people = PeopleMemory::new(engine, "user-42");
//! let cancel = CancellationToken::new();
//! people.add_or_update_person("p1", "Alice likes hiking", &cancel).await?;
//!
//! let id = people.resolve_person_id("the hiker", &cancel).await?;
//! let answer = people.ask(&id, "What does she enjoy?", &cancel).await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! `MemoryEngine` is `Send + Sync` and every operation takes `&self`.
//! Operations on different tenants never block each other; writes to one
//! tenant are serialized.

pub mod config;
pub mod embedding;
pub mod errors;
pub mod generation;
pub mod index;
pub mod memory;
pub mod memory_types;
pub mod people;
pub mod sqlite;
mod upstream;

// Re-export public API
pub use config::Config;
pub use embedding::{Embedder, OnnxEmbedder};
pub use errors::{Error, ErrorKind, UpstreamError};
pub use generation::{ChatCompletionsGenerator, ContextPassage, Generator, NO_ANSWER};
pub use index::{IndexHandle, IndexManager, Storage};
pub use memory::store::{MAX_DOCUMENT_ID_LENGTH, MAX_INPUT_LENGTH, MAX_SEARCH_LIMIT};
pub use memory::{EngineOptions, MemoryEngine};
pub use memory_types::{Answer, Citation, SearchHit};
pub use people::PeopleMemory;
pub use sqlite::Document;
