//! Prompt templates and context assembly.

use serde::{Deserialize, Serialize};

use crate::document::SearchResult;
use crate::error::{RagError, Result};

const CONTEXT: &str = "{context}";
const QUESTION: &str = "{question}";

/// The default question-answering prompt.
///
/// It tells the model what to say when the context is empty or unrelated.
pub const DEFAULT_TEMPLATE: &str = "\
Based on the following context from a PDF document, answer the question clearly and concisely.
If the context is empty or does not contain the answer, say that no relevant information was found in the document.

Context:
{context}

Question: {question}

Answer:";

/// A prompt with `{context}` and `{question}` placeholders.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::PromptTemplate;
///
/// let template = PromptTemplate::new("Context:\n{context}\n\nQuestion:\n{question}")?;
/// let prompt = template.render("the CV lists +358 40 123", "what is the phone number?");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template, checking that both placeholders are present.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `{context}` or `{question}` is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT, QUESTION] {
            if !template.contains(placeholder) {
                return Err(RagError::ConfigError(format!(
                    "prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `context` and `question` in a single pass.
    ///
    /// Placeholder-looking text inside the substituted values is left alone.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(CONTEXT) {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUESTION) {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

/// How retrieved chunks are joined into the `{context}` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFormat {
    /// Prefix each chunk with `[source p.N]`.
    pub attribution: bool,
    /// Text placed between chunks.
    pub separator: String,
}

impl Default for ContextFormat {
    fn default() -> Self {
        Self { attribution: false, separator: "\n\n".to_string() }
    }
}

impl ContextFormat {
    /// Default format with source attribution switched on or off.
    pub fn with_attribution(attribution: bool) -> Self {
        Self { attribution, ..Self::default() }
    }

    /// Join results in the order given. Empty results give an empty string.
    pub fn format(&self, results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|result| {
                let chunk = &result.chunk;
                if self.attribution {
                    format!("[{} p.{}]\n{}", chunk.source, chunk.page, chunk.text)
                } else {
                    chunk.text.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;

    fn result(source: &str, page: u32, text: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: format!("{source}#p{page}_0"),
                document_id: format!("{source}#p{page}"),
                source: source.to_string(),
                page,
                ordinal: 0,
                text: text.to_string(),
                char_start: 0,
                char_end: text.chars().count(),
            },
            score,
        }
    }

    #[test]
    fn render_substitutes_both_placeholders() {
        let template = PromptTemplate::new("C: {context} | Q: {question}").unwrap();
        assert_eq!(template.render("ctx", "why?"), "C: ctx | Q: why?");
    }

    #[test]
    fn render_does_not_rescan_substituted_values() {
        let template = PromptTemplate::new("{context}/{question}").unwrap();
        assert_eq!(template.render("{question}", "q"), "{question}/q");
    }

    #[test]
    fn render_keeps_unknown_braces() {
        let template = PromptTemplate::new("{x} {context} {question} {").unwrap();
        assert_eq!(template.render("c", "q"), "{x} c q {");
    }

    #[test]
    fn missing_placeholder_is_a_config_error() {
        assert!(matches!(PromptTemplate::new("only {question}"), Err(RagError::ConfigError(_))));
        assert!(PromptTemplate::new("only {context}").is_err());
    }

    #[test]
    fn default_template_is_valid() {
        let template = PromptTemplate::default();
        assert!(PromptTemplate::new(template.as_str()).is_ok());
        assert!(template.render("", "q").contains("no relevant information"));
    }

    #[test]
    fn context_joins_chunks_with_blank_line() {
        let results = vec![result("cv.pdf", 1, "first", 0.9), result("cv.pdf", 2, "second", 0.5)];
        assert_eq!(ContextFormat::default().format(&results), "first\n\nsecond");
    }

    #[test]
    fn context_with_attribution_names_source_and_page() {
        let results = vec![result("cv.pdf", 3, "phone: 123", 0.9)];
        assert_eq!(
            ContextFormat::with_attribution(true).format(&results),
            "[cv.pdf p.3]\nphone: 123"
        );
    }

    #[test]
    fn empty_results_give_empty_context() {
        assert_eq!(ContextFormat::default().format(&[]), "");
    }
}
