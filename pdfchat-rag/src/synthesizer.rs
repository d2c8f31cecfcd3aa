//! Answer synthesizer.
//!
//! The [`AnswerSynthesizer`] runs the query side of the pipeline: retrieve
//! the top-k chunks from a [`RetrievalIndex`], join them into a context
//! block, fill a [`PromptTemplate`] and hand the prompt to a [`Generator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfchat_rag::{AnswerSynthesizer, RagConfig};
//!
//! let synthesizer = AnswerSynthesizer::builder()
//!     .config(RagConfig::default())
//!     .index(Arc::new(index))
//!     .generator(Arc::new(generator))
//!     .build()?;
//!
//! let answer = synthesizer.answer("what is the phone number mentioned in the CV?").await?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::index::RetrievalIndex;
use crate::prompt::{ContextFormat, PromptTemplate};

/// The result of answering one question.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The generator's output, unmodified.
    pub text: String,
    /// Chunks used as context, in descending score order.
    pub sources: Vec<SearchResult>,
    /// The filled prompt that was sent to the generator.
    pub prompt: String,
}

/// Retrieves context for a question and asks a [`Generator`] to answer it.
///
/// The synthesizer only reads the index, so one instance (behind an `Arc`)
/// can serve concurrent questions. A failed generation affects only the
/// question that caused it.
pub struct AnswerSynthesizer {
    config: RagConfig,
    index: Arc<RetrievalIndex>,
    template: PromptTemplate,
    context_format: ContextFormat,
    generator: Arc<dyn Generator>,
}

impl AnswerSynthesizer {
    /// Create a new [`AnswerSynthesizerBuilder`].
    pub fn builder() -> AnswerSynthesizerBuilder {
        AnswerSynthesizerBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retrieval index.
    pub fn index(&self) -> &Arc<RetrievalIndex> {
        &self.index
    }

    /// Return a reference to the prompt template.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Retrieve the top-k chunks for `question`. Results below the similarity
    /// threshold are dropped only when one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] for a blank question, or the
    /// index's error if embedding the question fails.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidQuery("question must not be empty".to_string()));
        }

        let mut results = self.index.query(question, self.config.top_k).await?;
        if let Some(threshold) = self.config.similarity_threshold {
            results.retain(|r| r.score >= threshold);
        }

        debug!(
            result_count = results.len(),
            threshold = ?self.config.similarity_threshold,
            "retrieved context"
        );
        Ok(results)
    }

    /// Fill the template with the given results as context.
    pub fn render_prompt(&self, question: &str, results: &[SearchResult]) -> String {
        let context = self.context_format.format(results);
        self.template.render(&context, question)
    }

    /// Answer `question`: retrieve → build context → fill template → generate.
    ///
    /// When nothing is retrieved the context is empty and the template is
    /// responsible for telling the model so. The generated text is returned
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] for a blank question, an
    /// embedding error if the question cannot be embedded, or the
    /// generator's [`RagError::GenerationError`].
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let sources = self.retrieve(question).await?;
        let prompt = self.render_prompt(question, &sources);

        let text = self.generator.generate(&prompt).await.map_err(|e| {
            error!(generator = self.generator.name(), error = %e, "generation failed");
            match e {
                RagError::GenerationError { .. } => e,
                other => RagError::generation(self.generator.name(), other.to_string()),
            }
        })?;

        info!(source_count = sources.len(), answer_len = text.len(), "answered question");
        Ok(Answer { text, sources, prompt })
    }
}

/// Builder for constructing an [`AnswerSynthesizer`].
///
/// `index` and `generator` are required. `config`, `template` and
/// `context_format` fall back to their defaults.
///
/// # Example
///
/// ```rust,ignore
/// let synthesizer = AnswerSynthesizer::builder()
///     .index(Arc::new(index))
///     .generator(Arc::new(generator))
///     .template(PromptTemplate::new("Context:\n{context}\n\nQuestion:\n{question}")?)
///     .context_format(ContextFormat::with_attribution(true))
///     .build()?;
/// ```
#[derive(Default)]
pub struct AnswerSynthesizerBuilder {
    config: Option<RagConfig>,
    index: Option<Arc<RetrievalIndex>>,
    template: Option<PromptTemplate>,
    context_format: Option<ContextFormat>,
    generator: Option<Arc<dyn Generator>>,
}

impl AnswerSynthesizerBuilder {
    /// Set the configuration (`top_k` and `similarity_threshold` are used here).
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the retrieval index.
    pub fn index(mut self, index: Arc<RetrievalIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the prompt template.
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Set how retrieved chunks are joined into the context.
    pub fn context_format(mut self, format: ContextFormat) -> Self {
        self.context_format = Some(format);
        self
    }

    /// Set the text generator.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`AnswerSynthesizer`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<AnswerSynthesizer> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let index =
            self.index.ok_or_else(|| RagError::ConfigError("index is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;

        Ok(AnswerSynthesizer {
            config,
            index,
            template: self.template.unwrap_or_default(),
            context_format: self.context_format.unwrap_or_default(),
            generator,
        })
    }
}
