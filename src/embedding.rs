//! Sentence embeddings for the semantic ranking mode.
//!
//! [`MiniLmEmbedder`] runs `all-MiniLM-L6-v2` (384-dim) through ONNX
//! Runtime. The model is downloaded from HuggingFace Hub on first use and
//! cached by `hf-hub`.
//!
//! # Pipeline
//!
//! ```text
//! text → tokenizer → ONNX model → mean-pool → L2-normalize → 384-dim f32
//! ```

use crate::error::{RankError, Result};
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::Tensor;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// HuggingFace repo for the all-MiniLM-L6-v2 ONNX model.
const REPO_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// ONNX model filename inside the repo.
const MODEL_FILE: &str = "onnx/model.onnx";

/// Tokenizer filename inside the repo.
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Output embedding dimensions.
pub const EMBEDDING_DIM: usize = 384;

/// Maximum token sequence length for the model.
const MAX_TOKENS: usize = 256;

/// Text → vector encoder used by the semantic strategy.
///
/// Implementations are shared read-only across ranking calls.
pub trait Embedder: Send + Sync {
    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Embedding`] if encoding fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per input in order.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Embedding`] if encoding any text fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

struct Inner {
    session: Session,
    tokenizer: tokenizers::Tokenizer,
}

/// Embedder backed by `all-MiniLM-L6-v2`.
///
/// The ONNX session and tokenizer need exclusive access while encoding, so
/// they sit behind a `Mutex`; the embedder itself is `Sync`.
pub struct MiniLmEmbedder {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for MiniLmEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniLmEmbedder")
            .field("dim", &EMBEDDING_DIM)
            .finish_non_exhaustive()
    }
}

fn embed_err(context: &str, e: impl std::fmt::Display) -> RankError {
    RankError::Embedding(format!("{context}: {e}"))
}

impl MiniLmEmbedder {
    /// Load from pre-downloaded model files.
    ///
    /// # Errors
    ///
    /// Returns an error if the ONNX model or tokenizer cannot be loaded.
    pub fn new(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        info!("loading embedding ONNX model: {}", model_path.display());
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| embed_err("embedding model load failed", e))?;

        info!("loading embedding tokenizer: {}", tokenizer_path.display());
        let mut tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path)
            .map_err(|e| embed_err("embedding tokenizer load failed", e))?;

        let truncation = tokenizers::TruncationParams {
            max_length: MAX_TOKENS,
            ..Default::default()
        };
        tokenizer
            .with_truncation(Some(truncation))
            .map_err(|e| embed_err("tokenizer truncation config failed", e))?;
        tokenizer.with_padding(None);

        info!("embedding engine ready (dim={EMBEDDING_DIM})");
        Ok(Self {
            inner: Mutex::new(Inner { session, tokenizer }),
        })
    }

    /// Download the model files from HuggingFace Hub.
    ///
    /// Returns `(model_path, tokenizer_path)`. Files are cached by `hf-hub`
    /// and only downloaded on first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails.
    pub fn download_model() -> Result<(PathBuf, PathBuf)> {
        info!("downloading embedding model: {REPO_ID}");
        let api =
            hf_hub::api::sync::Api::new().map_err(|e| embed_err("HF Hub API init failed", e))?;
        let repo = api.model(REPO_ID.to_owned());

        let model_path = repo
            .get(MODEL_FILE)
            .map_err(|e| embed_err(&format!("failed to download {MODEL_FILE}"), e))?;
        let tokenizer_path = repo
            .get(TOKENIZER_FILE)
            .map_err(|e| embed_err(&format!("failed to download {TOKENIZER_FILE}"), e))?;

        Ok((model_path, tokenizer_path))
    }

    /// Download the model and load it.
    ///
    /// # Errors
    ///
    /// Returns an error if download or loading fails.
    pub fn download_and_load() -> Result<Self> {
        let (model_path, tokenizer_path) = Self::download_model()?;
        Self::new(&model_path, &tokenizer_path)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| RankError::Embedding("embedding session lock poisoned".into()))
    }
}

impl Inner {
    /// Run the model over a padded batch and pool each row.
    fn run(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings: Vec<tokenizers::Encoding> = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(*t, true)
                    .map_err(|e| embed_err("tokenization failed", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        let batch_size = texts.len();
        if batch_size == 0 || max_len == 0 {
            return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch_size]);
        }

        let mut all_ids = vec![0i64; batch_size * max_len];
        let mut all_mask = vec![0i64; batch_size * max_len];
        let mut all_types = vec![0i64; batch_size * max_len];
        for (i, enc) in encodings.iter().enumerate() {
            let offset = i * max_len;
            for (j, &id) in enc.get_ids().iter().enumerate() {
                all_ids[offset + j] = i64::from(id);
            }
            for (j, &m) in enc.get_attention_mask().iter().enumerate() {
                all_mask[offset + j] = i64::from(m);
            }
            for (j, &t) in enc.get_type_ids().iter().enumerate() {
                all_types[offset + j] = i64::from(t);
            }
        }

        let ids_tensor = Tensor::from_array(([batch_size, max_len], all_ids))
            .map_err(|e| embed_err("input_ids tensor failed", e))?;
        let mask_tensor = Tensor::from_array(([batch_size, max_len], all_mask.clone()))
            .map_err(|e| embed_err("attention_mask tensor failed", e))?;
        let type_tensor = Tensor::from_array(([batch_size, max_len], all_types))
            .map_err(|e| embed_err("token_type_ids tensor failed", e))?;

        let mut feed: HashMap<String, SessionInputValue> = HashMap::new();
        feed.insert("input_ids".to_owned(), ids_tensor.into());
        feed.insert("attention_mask".to_owned(), mask_tensor.into());
        feed.insert("token_type_ids".to_owned(), type_tensor.into());

        let outputs = self
            .session
            .run(SessionInputs::from(feed))
            .map_err(|e| embed_err("ONNX inference failed", e))?;

        // Output shape: [batch, max_len, 384].
        let (_shape, data) = outputs[0_usize]
            .try_extract_tensor::<f32>()
            .map_err(|e| embed_err("output extraction failed", e))?;

        let row = max_len * EMBEDDING_DIM;
        if data.len() < batch_size * row {
            return Err(RankError::Embedding(format!(
                "unexpected output size {} for batch {batch_size}x{max_len}",
                data.len()
            )));
        }

        Ok((0..batch_size)
            .map(|i| {
                let tokens = &data[i * row..(i + 1) * row];
                let mask = &all_mask[i * max_len..(i + 1) * max_len];
                l2_normalize(&mean_pool(tokens, mask, EMBEDDING_DIM))
            })
            .collect())
    }
}

impl Embedder for MiniLmEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut inner = self.lock()?;
        inner
            .run(&[text])?
            .pop()
            .ok_or_else(|| RankError::Embedding("model returned no embedding".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.lock()?.run(texts)
    }
}

/// Mean-pool token embeddings using the attention mask.
///
/// `flat` is shape `[mask.len(), dim]` stored row-major.
fn mean_pool(flat: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut count = 0.0f32;

    for (t, &m) in mask.iter().enumerate() {
        if m != 0 {
            let offset = t * dim;
            for (p, &f) in pooled.iter_mut().zip(&flat[offset..offset + dim]) {
                *p += f;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for p in &mut pooled {
            *p /= count;
        }
    }

    pooled
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < 1e-12 {
        return vec.to_vec();
    }
    vec.iter().map(|x| x / norm).collect()
}

/// Cosine similarity in `[-1.0, 1.0]`; `0.0` when either vector is zero or
/// the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom < 1e-12 {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn l2_normalize_unit_length() {
        let n = l2_normalize(&[3.0, 4.0]);
        let norm: f32 = n.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let n = l2_normalize(&[0.0; EMBEDDING_DIM]);
        assert_eq!(n.len(), EMBEDDING_DIM);
        assert!(n.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn mean_pool_with_padding() {
        // 3 tokens, dim=2, last one padding.
        let flat = [1.0, 2.0, 3.0, 4.0, 99.0, 99.0];
        let pooled = mean_pool(&flat, &[1, 1, 0], 2);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn mean_pool_all_masked() {
        let pooled = mean_pool(&[1.0, 2.0, 3.0, 4.0], &[0, 0], 2);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }

    #[test]
    fn cosine_similarity_cases() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0; 3]), 0.0);
        assert_eq!(cosine_similarity(&a, &[1.0]), 0.0);
    }

    #[test]
    fn default_batch_embeds_each_text() {
        struct Length;
        impl Embedder for Length {
            fn embed(&self, text: &str) -> Result<Vec<f32>> {
                Ok(vec![text.len() as f32])
            }
        }
        let out = Length.embed_batch(&["a", "abc"]).unwrap();
        assert_eq!(out, vec![vec![1.0], vec![3.0]]);
    }

    #[test]
    #[ignore] // Downloads ~90 MB from HuggingFace Hub
    fn minilm_ranks_related_text_higher() {
        let embedder = MiniLmEmbedder::download_and_load().unwrap();
        let query = embedder.embed("neural networks for image recognition").unwrap();
        let batch = embedder
            .embed_batch(&[
                "convolutional networks classify photographs",
                "medieval tax records of northern France",
            ])
            .unwrap();
        assert_eq!(query.len(), EMBEDDING_DIM);
        assert!(cosine_similarity(&query, &batch[0]) > cosine_similarity(&query, &batch[1]));
    }
}
