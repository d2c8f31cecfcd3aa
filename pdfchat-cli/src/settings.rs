//! Validated runtime settings derived from the command line and environment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pdfchat_rag::{
    ContextFormat, EmbeddingProvider, FastEmbedProvider, Generator, HashingEmbeddingProvider,
    OpenAIChatConfig, OpenAIChatGenerator, OpenAIEmbeddingProvider, RagConfig, RagError, Result,
};
use pdfchat_rag::local::DEFAULT_LOCAL_MODEL;

use crate::cli::{EmbeddingBackend, GlobalOptions};

/// Everything the commands need, checked before any document is loaded.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    pub rag: RagConfig,
    pub context_format: ContextFormat,
    pub embeddings: EmbeddingBackend,
    pub embedding_model: Option<String>,
    pub model_cache: Option<PathBuf>,
    pub api_key: Option<String>,
    pub chat: OpenAIChatConfig,
}

impl Settings {
    /// Validate `options` into library configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for inconsistent chunking or
    /// retrieval parameters, or a non-positive timeout.
    pub fn from_options(options: &GlobalOptions) -> Result<Self> {
        let mut builder = RagConfig::builder();
        if let Some(size) = options.chunk_size {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = options.chunk_overlap {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(separator) = &options.separator {
            builder = builder.separator(separator.clone());
        }
        if let Some(k) = options.top_k {
            builder = builder.top_k(k);
        }
        if let Some(threshold) = options.threshold {
            builder = builder.similarity_threshold(threshold);
        }
        let rag = builder.build()?;

        if options.timeout_secs == 0 {
            return Err(RagError::ConfigError("timeout must be at least one second".into()));
        }

        let api_key = options.api_key.clone().filter(|key| !key.trim().is_empty());
        let mut chat = OpenAIChatConfig::compatible(
            api_key.clone().unwrap_or_default(),
            options.base_url.clone(),
            options.model.clone(),
        )
        .with_temperature(options.temperature)
        .with_timeout(Duration::from_secs(options.timeout_secs));
        if let Some(system_prompt) = &options.system_prompt {
            chat = chat.with_system_prompt(system_prompt.clone());
        }
        if let Some(referer) = &options.referer {
            chat = chat.with_header("HTTP-Referer", referer.clone());
        }
        if let Some(title) = &options.title {
            chat = chat.with_header("X-Title", title.clone());
        }

        Ok(Self {
            data_path: options.data.clone(),
            rag,
            context_format: ContextFormat::with_attribution(options.attribution),
            embeddings: options.embeddings,
            embedding_model: options.embedding_model.clone(),
            model_cache: options.model_cache.clone(),
            api_key,
            chat,
        })
    }

    fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            RagError::ConfigError(
                "no API key configured; set OPENROUTER_API_KEY or pass --api-key".into(),
            )
        })
    }

    /// Build the chat generator.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if no API key is configured.
    pub fn generator(&self) -> Result<Arc<dyn Generator>> {
        self.require_api_key()?;
        Ok(Arc::new(OpenAIChatGenerator::new(self.chat.clone())?))
    }

    /// Build the embedding provider for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the local model cannot be loaded
    /// or the `openai` backend is selected without an API key.
    pub async fn embedding_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match self.embeddings {
            EmbeddingBackend::Local => Ok(Arc::new(
                FastEmbedProvider::with_model(DEFAULT_LOCAL_MODEL, self.model_cache.clone())
                    .await?,
            )),
            EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbeddingProvider::default())),
            EmbeddingBackend::Openai => {
                let mut provider = OpenAIEmbeddingProvider::new(self.require_api_key()?)?
                    .with_base_url(self.chat.base_url.clone())
                    .with_timeout(self.chat.timeout)?;
                if let Some(model) = &self.embedding_model {
                    provider = provider.with_model(model.clone());
                }
                Ok(Arc::new(provider))
            }
        }
    }
}
