//! Error types for the `pdfchat-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Missing or invalid configuration, such as an empty data directory or
    /// a chunk overlap that is not smaller than the chunk size.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A source file could not be read or parsed.
    #[error("Ingestion error ({source_name}): {message}")]
    IngestionError {
        /// The file that failed.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The remote generation call failed or timed out.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A query was rejected before any backend was called.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl RagError {
    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into() }
    }

    pub(crate) fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationError { provider: provider.into(), message: message.into() }
    }

    pub(crate) fn ingestion(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IngestionError { source_name: source_name.into(), message: message.into() }
    }

    /// Whether this error only affects the request that produced it.
    ///
    /// Configuration and ingestion errors are fatal at startup; everything
    /// else can be reported for a single query while the caller keeps going.
    pub fn is_per_request(&self) -> bool {
        matches!(
            self,
            Self::GenerationError { .. } | Self::EmbeddingError { .. } | Self::InvalidQuery(_)
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_provider_and_message() {
        let err = RagError::generation("OpenAI", "request timed out");
        assert_eq!(err.to_string(), "Generation error (OpenAI): request timed out");
    }

    #[test]
    fn startup_errors_are_not_per_request() {
        assert!(!RagError::ConfigError("x".into()).is_per_request());
        assert!(!RagError::ingestion("a.pdf", "bad xref").is_per_request());
        assert!(RagError::embedding("local", "down").is_per_request());
        assert!(RagError::InvalidQuery("blank".into()).is_per_request());
    }
}
