//! Text generation trait for the answer step.

use async_trait::async_trait;

use crate::error::Result;

/// A backend that turns a filled prompt into an answer.
///
/// Timeouts, retries and rate limits belong to the implementation; callers
/// only see the final text or a [`RagError::GenerationError`](crate::RagError::GenerationError).
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::Generator;
///
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl Generator for Echo {
///     async fn generate(&self, prompt: &str) -> pdfchat_rag::Result<String> {
///         Ok(prompt.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str {
        "custom"
    }
}
