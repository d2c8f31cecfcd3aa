//! Local feature-hashing embedding provider.
//!
//! [`HashingEmbeddingProvider`] needs no model download and no network: it
//! hashes lower-cased words and their character trigrams into a fixed number
//! of buckets and L2-normalises the result. Texts that share vocabulary land
//! close together under cosine similarity, which is enough for retrieval over
//! a handful of PDFs.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;

/// Default number of dimensions, the same as common small sentence-embedding models.
pub const DEFAULT_DIMENSIONS: usize = 384;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// A deterministic, offline [`EmbeddingProvider`].
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::HashingEmbeddingProvider;
///
/// let provider = HashingEmbeddingProvider::new(256);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing vectors of `dimensions` components.
    ///
    /// A dimension of zero is bumped to one.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    /// Embed synchronously. Used by the async trait methods.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();

        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            self.add_feature(&mut embedding, token.as_bytes(), WORD_WEIGHT);

            let padded: Vec<char> = std::iter::once('#')
                .chain(token.chars())
                .chain(std::iter::once('#'))
                .collect();
            let mut buf = String::new();
            for gram in padded.windows(3) {
                buf.clear();
                buf.extend(gram);
                self.add_feature(&mut embedding, buf.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }

    fn add_feature(&self, embedding: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |acc, b| (acc ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "local-hashing"
    }
}
