//! Text-to-vector embedding providers.
//!
//! `Embedder` is the seam the engine calls through. `OnnxEmbedder` is the
//! bundled implementation: a local sentence-embedding model (bge-small-en-v1.5
//! by default) with mean pooling and L2 normalization, run on tokio's
//! blocking pool. The vector length is read from the model when it loads.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use hf_hub::api::sync::ApiBuilder;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use tokenizers::{Tokenizer, TruncationParams};

use crate::errors::{Error, UpstreamError};

/// Embedded once at load time to learn the model's hidden size.
const SAMPLE_TEXT: &str = "hello world";

/// Converts text into fixed-length vectors.
///
/// Implementations may be slow or remote. The engine drops the returned future
/// when the caller cancels or the deadline passes, so an implementation must
/// not leave shared state half-updated across an `.await`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError>;
}

/// ONNX embedding engine for synchronous text-to-vector conversion.
pub struct EmbeddingEngine {
    session: Session,
    tokenizer: Tokenizer,
    requires_token_type_ids: bool,
    dims: usize,
}

impl EmbeddingEngine {
    /// Load model from cache or download on first use.
    ///
    /// Uses the blocking `hf_hub` API; files are cached under `cache_dir` and
    /// only downloaded once.
    pub fn new(model_id: &str, cache_dir: &Path) -> Result<Self, Error> {
        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .build()?;
        let repo = api.model(model_id.to_string());

        let model_path = repo
            .get("onnx/model.onnx")
            .or_else(|_| repo.get("model.onnx"))?;
        let tokenizer_path = repo.get("tokenizer.json")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: 512,
                ..Default::default()
            }))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(ort::Error::from)?
            .commit_from_file(&model_path)?;

        // Check if model requires token_type_ids input
        let requires_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut engine = EmbeddingEngine {
            session,
            tokenizer,
            requires_token_type_ids,
            dims: 0,
        };
        engine.dims = engine.infer(SAMPLE_TEXT)?.len();
        if engine.dims == 0 {
            return Err(Error::Inference(format!(
                "Model {model_id} produced an empty embedding"
            )));
        }
        Ok(engine)
    }

    /// Length of every vector this model produces.
    pub fn dimensions(&self) -> usize {
        self.dims
    }

    /// Generate embedding for a single text.
    ///
    /// Returns an L2-normalized vector of `dimensions()` values. Empty input
    /// returns a zero vector. Texts exceeding 512 tokens are truncated.
    pub fn embed(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        if text.is_empty() {
            return Ok(vec![0.0f32; self.dims]);
        }

        let embedding = self.infer(text)?;
        if embedding.len() != self.dims {
            return Err(Error::Inference(format!(
                "Model output changed size: expected {}, got {}",
                self.dims,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn infer(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        let encoding = self.tokenizer.encode(text, true)?;
        let input_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();

        if input_ids.is_empty() {
            return Ok(vec![0.0f32; self.dims]);
        }

        let seq_len = input_ids.len();

        let input_ids_vec: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
        let attention_mask_vec: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();

        let input_ids_tensor = Tensor::from_array(([1usize, seq_len], input_ids_vec))?;
        let attention_mask_tensor = Tensor::from_array(([1usize, seq_len], attention_mask_vec))?;

        let outputs = if self.requires_token_type_ids {
            let token_type_ids_vec: Vec<i64> = vec![0i64; seq_len];
            let token_type_ids_tensor =
                Tensor::from_array(([1usize, seq_len], token_type_ids_vec))?;
            self.session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])?
        } else {
            self.session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            ])?
        };

        let last_hidden_state = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .ok_or_else(|| {
                Error::Inference(
                    "Output tensor 'last_hidden_state' or 'token_embeddings' not found".to_string(),
                )
            })?
            .try_extract_tensor::<f32>()?;

        let (shape, data) = last_hidden_state;
        let hidden_dim = hidden_size(shape)?;

        Ok(mean_pool(data, attention_mask, hidden_dim, seq_len))
    }
}

/// Hidden size of a `(batch = 1, seq_len, hidden)` output tensor.
fn hidden_size(shape: &[i64]) -> Result<usize, Error> {
    match shape {
        [1, _, hidden] if *hidden > 0 => Ok(*hidden as usize),
        _ => Err(Error::Inference(format!(
            "Expected output shape (1, seq_len, hidden), got {:?}",
            shape
        ))),
    }
}

/// Attention-masked mean over token embeddings, then L2 normalization.
fn mean_pool(data: &[f32], attention_mask: &[u32], hidden_dim: usize, seq_len: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];

    for (token_idx, chunk) in data.chunks(hidden_dim).take(seq_len).enumerate() {
        let mask_value = attention_mask.get(token_idx).copied().unwrap_or(0) as f32;

        for (dim, pooled_value) in pooled.iter_mut().enumerate() {
            *pooled_value += chunk[dim] * mask_value;
        }
    }

    let mask_sum: f32 = attention_mask
        .iter()
        .take(seq_len)
        .map(|&m| m as f32)
        .sum::<f32>()
        .max(1e-9);

    for value in pooled.iter_mut() {
        *value /= mask_sum;
    }

    l2_normalize(&pooled)
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    let norm = norm.max(1e-9);

    vec.iter().map(|&x| x / norm).collect()
}

/// `Embedder` backed by the local ONNX model.
///
/// The ONNX session needs `&mut` access, so calls are serialized through a
/// mutex and executed on the blocking thread pool.
#[derive(Clone)]
pub struct OnnxEmbedder {
    engine: Arc<Mutex<EmbeddingEngine>>,
    dims: usize,
}

impl OnnxEmbedder {
    /// Load (downloading on first use) the model `model_id` into `cache_dir`.
    pub fn new(model_id: &str, cache_dir: &Path) -> Result<Self, Error> {
        let engine = EmbeddingEngine::new(model_id, cache_dir)?;
        let dims = engine.dimensions();
        tracing::info!(model = model_id, dims, "embedding model loaded");
        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            dims,
        })
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        let engine = Arc::clone(&self.engine);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || engine.lock().embed(&text))
            .await
            .map_err(|e| UpstreamError::with_source("embedding task failed", e))?
            .map_err(|e| UpstreamError::new(format!("embedding inference failed: {e}")))
    }
}
