//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Separators tried in priority order when no explicit separator is configured.
pub const DEFAULT_SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Preferred split boundaries, highest priority first.
    pub separators: Vec<String>,
    /// Number of top results to retrieve for each question.
    pub top_k: usize,
    /// Optional minimum similarity score. When unset every top-k result is kept.
    pub similarity_threshold: Option<f32>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            top_k: 3,
            similarity_threshold: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - any separator is empty
    /// - `similarity_threshold` is NaN
    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunk_size, self.chunk_overlap)?;
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.separators.iter().any(|s| s.is_empty()) {
            return Err(RagError::ConfigError("separators must not be empty strings".to_string()));
        }
        if self.similarity_threshold.is_some_and(f32::is_nan) {
            return Err(RagError::ConfigError("similarity_threshold must be a number".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::ConfigError(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Use a single preferred separator instead of the default list.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separators = vec![separator.into()];
        self
    }

    /// Set the separators, highest priority first.
    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of top results to retrieve.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Drop retrieved results scoring below `threshold`.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] under the conditions listed on
    /// [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.separators, vec!["\n\n", "\n", " "]);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = RagConfig::builder().chunk_size(10).chunk_overlap(10).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(msg) if msg.contains("chunk_overlap (10)")));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }

    #[test]
    fn empty_separator_is_rejected() {
        assert!(RagConfig::builder().separator("").build().is_err());
    }

    #[test]
    fn builder_sets_every_field() {
        let config = RagConfig::builder()
            .chunk_size(1000)
            .chunk_overlap(64)
            .separator(" ")
            .top_k(4)
            .similarity_threshold(0.25)
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 64);
        assert_eq!(config.separators, vec![" "]);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.similarity_threshold, Some(0.25));
    }

    #[test]
    fn threshold_is_off_by_default() {
        assert_eq!(RagConfig::default().similarity_threshold, None);
    }

    #[test]
    fn nan_threshold_is_rejected() {
        assert!(RagConfig::builder().similarity_threshold(f32::NAN).build().is_err());
    }
}
