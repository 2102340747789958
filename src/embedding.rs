//! Embedding providers: the pluggable text-to-vector capability.
//!
//! The store only consumes the [`EmbeddingProvider`] trait. [`OnnxEmbedder`]
//! is the bundled implementation: a synchronous ONNX engine running
//! bge-small-en-v1.5 (384 dimensions) with mean pooling and L2 normalization.

use std::path::Path;

use hf_hub::api::sync::ApiBuilder;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;
use tokenizers::{Tokenizer, TruncationParams};

/// Embedding dimensions for bge-small-en-v1.5 model.
pub const EMBEDDING_DIMS: usize = 384;

/// Default HuggingFace model.
pub const DEFAULT_MODEL_ID: &str = "BAAI/bge-small-en-v1.5";

/// Failure inside an embedding provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Tokenization error.
    #[error("Tokenization error: {0}")]
    Tokenization(#[from] tokenizers::Error),

    /// ONNX session error.
    #[error("ONNX session error: {0}")]
    Onnx(#[from] ort::Error),

    /// HuggingFace Hub error.
    #[error("HuggingFace Hub error: {0}")]
    HfHub(#[from] hf_hub::api::sync::ApiError),

    /// Model output had an unexpected shape or was missing.
    #[error("Inference error: {0}")]
    Inference(String),

    /// The provider returned a vector that disagrees with its declared dimension.
    #[error("Embedding has {actual} dimensions, provider declares {expected}")]
    Dimension { expected: usize, actual: usize },

    /// Batch call returned a different number of vectors than inputs.
    #[error("Provider returned {actual} embeddings for {expected} inputs")]
    BatchSize { expected: usize, actual: usize },

    /// Any other failure (network, timeout, remote API error).
    #[error("{0}")]
    Other(String),
}

/// Turns text into a fixed-dimension vector.
///
/// Calls are blocking; callers wrap them in their own timeout policy. The
/// store never retries a failed call.
///
/// Methods take `&mut self` because inference engines typically mutate
/// internal state (tensor allocations, caches).
pub trait EmbeddingProvider {
    /// Embed a single text.
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Embed several texts. Defaults to one `embed` call per item.
    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Length of every vector this provider produces.
    fn dimension(&self) -> usize;
}

/// Ensure a produced vector is non-empty and matches the provider's declared
/// dimension.
pub(crate) fn check_dimension(expected: usize, embedding: &[f32]) -> Result<(), ProviderError> {
    if embedding.is_empty() || embedding.len() != expected {
        return Err(ProviderError::Dimension {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(())
}

/// ONNX embedding engine for synchronous text-to-vector conversion.
pub struct OnnxEmbedder {
    session: Session,
    tokenizer: Tokenizer,
    requires_token_type_ids: bool,
}

impl OnnxEmbedder {
    /// Load model from cache or download on first use.
    ///
    /// Uses `hf_hub::api::sync` with the ureq backend, so loading is fully
    /// blocking. Files are cached under `cache_dir` and only downloaded once.
    pub fn new(model_id: &str, cache_dir: &Path) -> Result<Self, ProviderError> {
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

        // Some exports take token_type_ids, some do not
        let requires_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        tracing::info!(model = model_id, "embedding model loaded");

        Ok(OnnxEmbedder {
            session,
            tokenizer,
            requires_token_type_ids,
        })
    }
}

impl EmbeddingProvider for OnnxEmbedder {
    /// Returns a 384-dimensional, L2-normalized vector.
    ///
    /// Empty strings return a zero vector. Texts exceeding 512 tokens are
    /// truncated by the tokenizer.
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.is_empty() {
            return Ok(vec![0.0f32; EMBEDDING_DIMS]);
        }

        let encoding = self.tokenizer.encode(text, true)?;
        let input_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();

        if input_ids.is_empty() {
            return Ok(vec![0.0f32; EMBEDDING_DIMS]);
        }

        let seq_len = input_ids.len();

        let input_ids_vec: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
        let attention_mask_vec: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();

        let input_ids_tensor = Tensor::from_array(([1usize, seq_len], input_ids_vec))?;
        let attention_mask_tensor = Tensor::from_array(([1usize, seq_len], attention_mask_vec))?;

        let outputs = if self.requires_token_type_ids {
            let token_type_ids_tensor =
                Tensor::from_array(([1usize, seq_len], vec![0i64; seq_len]))?;
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

        let (shape, data) = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .ok_or_else(|| {
                ProviderError::Inference(
                    "Output tensor 'last_hidden_state' or 'token_embeddings' not found".to_string(),
                )
            })?
            .try_extract_tensor::<f32>()?;

        if shape.len() != 3 {
            return Err(ProviderError::Inference(format!(
                "Expected 3D output (batch, seq_len, hidden), got {:?}",
                shape
            )));
        }

        let batch_size = shape[0] as usize;
        let hidden_dim = shape[2] as usize;

        if batch_size != 1 || hidden_dim != EMBEDDING_DIMS {
            return Err(ProviderError::Inference(format!(
                "Unexpected output shape: {:?}, batch=1, hidden={} expected",
                shape, EMBEDDING_DIMS
            )));
        }

        Ok(l2_normalize(&mean_pool(
            data,
            attention_mask,
            seq_len,
            hidden_dim,
        )))
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMS
    }
}

/// Average token vectors, counting only positions where the mask is set.
fn mean_pool(data: &[f32], attention_mask: &[u32], seq_len: usize, hidden_dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];

    for (token_idx, chunk) in data.chunks(hidden_dim).take(seq_len).enumerate() {
        let mask_value = attention_mask.get(token_idx).copied().unwrap_or(0) as f32;
        for (pooled_value, value) in pooled.iter_mut().zip(chunk) {
            *pooled_value += value * mask_value;
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
    pooled
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    let norm = norm.max(1e-9);

    vec.iter().map(|&x| x / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        calls: usize,
    }

    impl EmbeddingProvider for Counting {
        fn embed(&mut self, text: &str) -> Result<Vec<f32>, ProviderError> {
            self.calls += 1;
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_default_embed_batch_calls_embed_per_item() {
        let mut provider = Counting { calls: 0 };
        let texts = vec!["a".to_string(), "abc".to_string()];
        let vectors = provider.embed_batch(&texts).unwrap();

        assert_eq!(provider.calls, 2);
        assert_eq!(vectors, vec![vec![1.0, 1.0], vec![3.0, 1.0]]);
    }

    #[test]
    fn test_check_dimension() {
        assert!(check_dimension(2, &[0.0, 1.0]).is_ok());
        assert!(matches!(
            check_dimension(384, &[0.0; 3]),
            Err(ProviderError::Dimension {
                expected: 384,
                actual: 3
            })
        ));
        assert!(matches!(
            check_dimension(0, &[]),
            Err(ProviderError::Dimension {
                expected: 0,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_mean_pool_ignores_masked_tokens() {
        // two tokens of width 2, second one masked out
        let data = [1.0, 3.0, 100.0, 100.0];
        let pooled = mean_pool(&data, &[1, 0], 2, 2);
        assert_eq!(pooled, vec![1.0, 3.0]);
    }

    #[test]
    fn test_l2_normalize_unit_vector() {
        let normalized = l2_normalize(&[1.0, 0.0, 0.0]);
        let norm: f32 = normalized.iter().map(|&x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        assert_eq!(l2_normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_l2_normalize_magnitude() {
        let normalized = l2_normalize(&[3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[ignore]
    #[test]
    fn test_integration_simple_text() {
        let cache = tempfile::TempDir::new().unwrap();
        let mut engine = OnnxEmbedder::new(DEFAULT_MODEL_ID, cache.path()).expect("load model");
        let embedding = engine.embed("hello world").expect("embed text");

        assert_eq!(embedding.len(), EMBEDDING_DIMS);
        let norm: f32 = embedding.iter().map(|&x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01, "Embedding should be L2-normalized");
    }

    #[ignore]
    #[test]
    fn test_integration_empty_string() {
        let cache = tempfile::TempDir::new().unwrap();
        let mut engine = OnnxEmbedder::new(DEFAULT_MODEL_ID, cache.path()).expect("load model");
        let embedding = engine.embed("").expect("embed empty text");
        assert_eq!(embedding, vec![0.0f32; EMBEDDING_DIMS]);
    }
}
