//! In-memory retrieval index using cosine similarity.
//!
//! [`RetrievalIndex`] is built once from a list of chunks and then only read.
//! It owns every [`IndexEntry`] and the [`EmbeddingProvider`] used to build
//! it, so query vectors always come from the same model as stored vectors.
//! Queries take `&self`; share the index between tasks with an `Arc`.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, error, info};

use crate::document::{Chunk, IndexEntry, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// How chunk embeddings are computed during [`RetrievalIndex::build_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Number of chunk texts sent to the provider per call.
    pub batch_size: usize,
    /// Maximum number of batches in flight at once.
    pub concurrency: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { batch_size: 32, concurrency: 4 }
    }
}

/// A build-once, query-many vector index with brute-force cosine search.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use pdfchat_rag::{HashingEmbeddingProvider, RetrievalIndex};
///
/// let index = RetrievalIndex::build(chunks, Arc::new(HashingEmbeddingProvider::default())).await?;
/// let results = index.query("phone number", 3).await?;
/// ```
pub struct RetrievalIndex {
    provider: Arc<dyn EmbeddingProvider>,
    entries: Vec<IndexEntry>,
}

impl std::fmt::Debug for RetrievalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalIndex")
            .field("provider", &self.provider.name())
            .field("dimensions", &self.provider.dimensions())
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl RetrievalIndex {
    /// Embed every chunk with `provider` and store the results.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`RagError::EmbeddingError`] if any batch fails,
    /// or an `EmbeddingError` if the provider returns the wrong number of
    /// vectors or vectors of the wrong length. No partial index is returned.
    pub async fn build(chunks: Vec<Chunk>, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Self::build_with(chunks, provider, BuildOptions::default()).await
    }

    /// Like [`build`](Self::build) with explicit batching options.
    ///
    /// Batches run concurrently but results keep chunk order, so insertion
    /// order (used for tie-breaking) always matches the input order.
    pub async fn build_with(
        chunks: Vec<Chunk>,
        provider: Arc<dyn EmbeddingProvider>,
        options: BuildOptions,
    ) -> Result<Self> {
        let batch_size = options.batch_size.max(1);
        let concurrency = options.concurrency.max(1);

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(chunks.chunks(batch_size))
            .map(|batch| {
                let provider = &provider;
                async move {
                    let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
                    debug!(provider = provider.name(), batch_size = texts.len(), "embedding batch");
                    let embeddings = provider.embed_batch(&texts).await?;
                    if embeddings.len() != texts.len() {
                        return Err(RagError::embedding(
                            provider.name(),
                            format!(
                                "expected {} embeddings, provider returned {}",
                                texts.len(),
                                embeddings.len()
                            ),
                        ));
                    }
                    Ok(embeddings)
                }
            })
            .buffered(concurrency)
            .try_collect()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding failed during index build");
                e
            })?;

        let entries = chunks
            .into_iter()
            .zip(batches.into_iter().flatten())
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        let index = Self::from_entries(entries, provider)?;

        info!(entry_count = index.len(), dimensions = index.dimensions(), "built retrieval index");
        Ok(index)
    }

    /// Create an index from entries whose embeddings were computed elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if any embedding length differs
    /// from `provider.dimensions()`.
    pub fn from_entries(
        entries: Vec<IndexEntry>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let dimensions = provider.dimensions();
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimensions) {
            return Err(RagError::embedding(
                provider.name(),
                format!(
                    "chunk '{}' has {} dimensions, expected {dimensions}",
                    bad.chunk.id,
                    bad.embedding.len()
                ),
            ));
        }
        Ok(Self { provider, entries })
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality of every stored embedding.
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// The stored entries, in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// The embedding provider this index was built with.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embed `text` and return the `k` most similar chunks.
    ///
    /// An empty index returns an empty result for any `k` without calling
    /// the provider. If `k` exceeds the number of entries, every entry is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `k == 0` on a non-empty index, or
    /// the provider's error if embedding the query fails.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() {
            debug!("query against empty index");
            return Ok(Vec::new());
        }
        check_k(k)?;

        let embedding = self.provider.embed(text).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;
        self.search_embedding(&embedding, k)
    }

    /// Rank stored entries against a precomputed query vector.
    ///
    /// Results are ordered by descending cosine similarity; equal scores keep
    /// insertion order.
    pub fn search_embedding(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        check_k(k)?;
        if embedding.len() != self.dimensions() {
            return Err(RagError::embedding(
                self.provider.name(),
                format!(
                    "query has {} dimensions, index expects {}",
                    embedding.len(),
                    self.dimensions()
                ),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&entry.embedding, embedding)))
            .collect();

        // `sort_by` is stable, which gives the insertion-order tie-break.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }
}

fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(RagError::ConfigError("k must be at least 1".to_string()));
    }
    Ok(())
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a * norm_b);
    if score.is_finite() { score } else { 0.0 }
}
