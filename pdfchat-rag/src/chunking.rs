//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`TextChunker`], which cuts
//! a page into windows of at most `chunk_size` characters, preferring to break
//! at a separator, with `chunk_overlap` characters shared between neighbours.
//!
//! With a single separator (for example `" "`) it behaves like a character
//! splitter; with the default list `["\n\n", "\n", " "]` it prefers paragraph
//! breaks, then line breaks, then word breaks.

use crate::config::{DEFAULT_SEPARATORS, RagConfig, validate_chunking};
use crate::document::{Chunk, SourceDocument};
use crate::error::Result;

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and position metadata.
/// Embeddings are computed later by the retrieval index.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &SourceDocument) -> Vec<Chunk>;

    /// Split many documents, preserving document order and the order of
    /// chunks within each document.
    fn chunk_all(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        documents.iter().flat_map(|document| self.chunk(document)).collect()
    }
}

/// Splits text into bounded, overlapping chunks that prefer separator boundaries.
///
/// Chunk IDs are generated as `{document_id}_{ordinal}`.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::{Chunker, TextChunker};
///
/// let chunker = TextChunker::new(500, 50)?.with_separator(" ");
/// let chunks = chunker.chunk(&page);
/// ```
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextChunker {
    /// Create a new `TextChunker` using the default separators.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Ok(Self::new(config.chunk_size, config.chunk_overlap)?
            .with_separators(config.separators.iter().cloned()))
    }

    /// Break only at `separator`.
    pub fn with_separator(self, separator: impl Into<String>) -> Self {
        self.with_separators([separator.into()])
    }

    /// Set the separators, highest priority first. Empty strings are ignored.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators =
            separators.into_iter().map(Into::<String>::into).filter(|s| !s.is_empty()).collect();
        self
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared between consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_spans(text)
            .into_iter()
            .map(|(start, end)| text[start..end].to_string())
            .collect()
    }

    /// Split text into byte ranges, each at most `chunk_size` characters long.
    fn split_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let rest = &text[start..];
            let Some(limit) = byte_offset_of_char(rest, self.chunk_size) else {
                spans.push((start, text.len()));
                break;
            };

            let window = &rest[..limit];
            let cut = self.separators.iter().find_map(|separator| {
                window
                    .rfind(separator.as_str())
                    .filter(|&pos| pos > 0)
                    .map(|pos| (start + pos, separator.as_str()))
            });
            let (end, separator) = match cut {
                Some((end, separator)) => (end, Some(separator)),
                None => (start + limit, None),
            };

            spans.push((start, end));
            start = self.next_start(text, start, end, separator);
        }

        spans
    }

    /// Where the chunk after `start..end` begins.
    fn next_start(&self, text: &str, start: usize, end: usize, separator: Option<&str>) -> usize {
        let backed = back_off_chars(text, end, self.chunk_overlap);
        if self.chunk_overlap > 0 && backed > start {
            if self.is_boundary(text, backed) {
                return backed;
            }
            // Move off a partial token when the overlap region contains a break.
            let region = &text[backed..end];
            let aligned = self
                .separators
                .iter()
                .filter_map(|s| region.find(s.as_str()).map(|pos| backed + pos + s.len()))
                .min();
            match aligned {
                Some(aligned) if aligned < end => return aligned,
                Some(_) => {}
                None => return backed,
            }
        }

        match separator {
            Some(separator) if text[end..].starts_with(separator) => end + separator.len(),
            _ => end,
        }
    }

    fn is_boundary(&self, text: &str, pos: usize) -> bool {
        pos == 0 || self.separators.iter().any(|s| text[..pos].ends_with(s.as_str()))
    }
}

impl Chunker for TextChunker {
    fn chunk(&self, document: &SourceDocument) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let text = &document.text;
        let document_id = document.id();
        let mut chunks = Vec::new();
        // Spans are produced in increasing order, so character offsets can be
        // counted incrementally.
        let mut cursor = (0usize, 0usize);

        for (ordinal, (start, end)) in self.split_spans(text).into_iter().enumerate() {
            let char_start = advance_chars(text, &mut cursor, start);
            let char_end = char_start + text[start..end].chars().count();

            chunks.push(Chunk {
                id: format!("{document_id}_{ordinal}"),
                document_id: document_id.clone(),
                source: document.source.clone(),
                page: document.page,
                ordinal,
                text: text[start..end].to_string(),
                char_start,
                char_end,
            });
        }

        chunks
    }
}

/// Byte offset of the `n`th character of `s`, or `None` if `s` has at most `n` characters.
fn byte_offset_of_char(s: &str, n: usize) -> Option<usize> {
    s.char_indices().nth(n).map(|(i, _)| i)
}

/// Byte offset `n` characters before `end`, clamped at zero.
fn back_off_chars(text: &str, end: usize, n: usize) -> usize {
    if n == 0 {
        return end;
    }
    text[..end].char_indices().rev().nth(n - 1).map_or(0, |(i, _)| i)
}

/// Move `cursor` (byte, char) forward to byte `target` and return its character offset.
fn advance_chars(text: &str, cursor: &mut (usize, usize), target: usize) -> usize {
    let (byte, chars) = *cursor;
    let chars = chars + text[byte..target].chars().count();
    *cursor = (target, chars);
    chars
}
