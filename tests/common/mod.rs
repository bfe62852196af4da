//! Deterministic collaborators for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use peoplemem::{
    ContextPassage, Embedder, EngineOptions, Generator, MemoryEngine, Storage, UpstreamError,
};

const VOCABULARY: &[&[&str]] = &[
    &["hik", "trail", "mountain", "outdoor"],
    &["chess", "game", "board", "puzzle"],
    &["cook", "food", "bake", "recipe"],
    &["music", "guitar", "piano", "song"],
];

/// Counts keyword hits per topic; a constant last axis keeps every vector non-zero.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
    pub fail: bool,
}

impl KeywordEmbedder {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(UpstreamError::new("embedding service returned 503"));
        }
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|words| words.iter().filter(|w| text.contains(*w)).count() as f32)
            .collect();
        vector.push(0.1);
        Ok(vector)
    }
}

/// Answers by repeating the passages it was given.
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(
        &self,
        _question: &str,
        context: &[ContextPassage],
    ) -> Result<String, UpstreamError> {
        let facts: Vec<&str> = context.iter().map(|p| p.text.as_str()).collect();
        Ok(format!("From memory: {}", facts.join("; ")))
    }
}

pub fn engine_with(
    storage: Storage,
    embedder: KeywordEmbedder,
) -> (Arc<MemoryEngine>, Arc<KeywordEmbedder>) {
    let embedder = Arc::new(embedder);
    let engine = MemoryEngine::new(
        storage,
        embedder.clone(),
        Arc::new(EchoGenerator),
        EngineOptions::default(),
    );
    (Arc::new(engine), embedder)
}

pub fn in_memory_engine() -> Arc<MemoryEngine> {
    engine_with(Storage::InMemory, KeywordEmbedder::default()).0
}
