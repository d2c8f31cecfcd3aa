//! Data types for pages, chunks, index entries and search results.

use serde::{Deserialize, Serialize};

/// One page of text extracted from a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDocument {
    /// File name the page came from.
    pub source: String,
    /// 1-based page number within the file.
    pub page: u32,
    /// The extracted plain text of the page.
    pub text: String,
    /// Optional full path or URI of the original file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl SourceDocument {
    /// Create a page record without a source URI.
    pub fn new(source: impl Into<String>, page: u32, text: impl Into<String>) -> Self {
        Self { source: source.into(), page, text: text.into(), source_uri: None }
    }

    /// Identifier of this page, `{source}#p{page}`.
    pub fn id(&self) -> String {
        format!("{}#p{}", self.source, self.page)
    }
}

/// A bounded segment of a [`SourceDocument`].
///
/// `char_start..char_end` are offsets in characters (not bytes) into the
/// parent page's text, and `text` is exactly that range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Unique identifier for the chunk, `{document_id}_{ordinal}`.
    pub id: String,
    /// The ID of the parent [`SourceDocument`].
    pub document_id: String,
    /// File name of the parent document.
    pub source: String,
    /// Page number of the parent document.
    pub page: u32,
    /// Position of this chunk within its parent document.
    pub ordinal: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Character offset where the chunk starts in the parent text.
    pub char_start: usize,
    /// Character offset one past the end of the chunk in the parent text.
    pub char_end: usize,
}

impl Chunk {
    /// Number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// A [`Chunk`] paired with its embedding, owned by the retrieval index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// The stored chunk.
    pub chunk: Chunk,
    /// The embedding of the chunk's text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
