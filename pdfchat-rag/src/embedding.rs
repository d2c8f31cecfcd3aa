//! Embedding provider trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates fixed-length vector embeddings from text.
///
/// A [`RetrievalIndex`](crate::RetrievalIndex) keeps the provider it was built
/// with and reuses it for every query, so stored and query vectors always come
/// from the same model. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// calls [`embed`](EmbeddingProvider::embed) sequentially; backends that
/// support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::{EmbeddingProvider, HashingEmbeddingProvider};
///
/// let provider = HashingEmbeddingProvider::default();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str {
        "custom"
    }
}
