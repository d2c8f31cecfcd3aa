//! Local sentence embeddings via `fastembed`.
//!
//! [`FastEmbedProvider`] runs an ONNX sentence-transformer on the CPU. The
//! default model is `all-MiniLM-L6-v2` (384 dimensions), downloaded into the
//! cache directory on first use. Inference is synchronous, so every call runs
//! on tokio's blocking pool.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The model used by [`FastEmbedProvider::new`].
pub const DEFAULT_LOCAL_MODEL: EmbeddingModel = EmbeddingModel::AllMiniLML6V2;

/// An [`EmbeddingProvider`] backed by a local `fastembed` model.
///
/// Cloning is cheap; clones share the loaded model.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::FastEmbedProvider;
///
/// let provider = FastEmbedProvider::new().await?;
/// let embedding = provider.embed("phone number").await?;
/// assert_eq!(embedding.len(), 384);
/// ```
#[derive(Clone)]
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_code: String,
    dimensions: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model_code", &self.model_code)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl FastEmbedProvider {
    /// Load [`DEFAULT_LOCAL_MODEL`] from fastembed's default cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the model cannot be downloaded or
    /// initialised.
    pub async fn new() -> Result<Self> {
        Self::with_model(DEFAULT_LOCAL_MODEL, None).await
    }

    /// Load `model`, caching its files under `cache_dir` when given.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the model cannot be downloaded or
    /// initialised.
    pub async fn with_model(model: EmbeddingModel, cache_dir: Option<PathBuf>) -> Result<Self> {
        let (model_code, dimensions) = model_details(&model)?;
        info!(model = %model_code, dimensions, "loading local embedding model");

        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let loaded = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
            .await
            .map_err(|e| RagError::ConfigError(format!("embedding model task failed: {e}")))?
            .map_err(|e| {
                RagError::ConfigError(format!("failed to load local embedding model: {e}"))
            })?;

        Ok(Self { model: Arc::new(Mutex::new(loaded)), model_code, dimensions })
    }

    /// The model identifier, e.g. `sentence-transformers/all-MiniLM-L6-v2`.
    pub fn model_code(&self) -> &str {
        &self.model_code
    }
}

/// Model code and output dimensions of `model`, without loading it.
pub fn model_details(model: &EmbeddingModel) -> Result<(String, usize)> {
    let info = TextEmbedding::get_model_info(model)
        .map_err(|e| RagError::ConfigError(format!("unknown embedding model {model:?}: {e}")))?;
    Ok((info.model_code.clone(), info.dim))
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| RagError::embedding(self.name(), "model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let expected = owned.len();
        let model = Arc::clone(&self.model);
        let name = self.model_code.clone();

        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| RagError::embedding(&name, "model lock poisoned"))?;
            model.embed(owned, None).map_err(|e| RagError::embedding(&name, e.to_string()))
        })
        .await
        .map_err(|e| RagError::embedding(self.name(), format!("embedding task failed: {e}")))??;

        if embeddings.len() != expected {
            return Err(RagError::embedding(
                self.name(),
                format!("expected {expected} embeddings, got {}", embeddings.len()),
            ));
        }
        debug!(model = %self.model_code, count = expected, "embedded batch");
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model_code
    }
}
