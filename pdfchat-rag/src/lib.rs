//! # pdfchat-rag
//!
//! Retrieval-augmented question answering over PDF documents.
//!
//! ## Overview
//!
//! The crate is a four-stage pipeline, each stage a plain type you can use on
//! its own:
//!
//! - [`PdfLoader`] - reads PDF files into page-level [`SourceDocument`]s
//! - [`TextChunker`] - splits pages into overlapping [`Chunk`]s
//! - [`RetrievalIndex`] - embeds chunks once and ranks them by cosine similarity
//! - [`AnswerSynthesizer`] - retrieves context, fills a [`PromptTemplate`] and
//!   calls a [`Generator`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdfchat_rag::{
//!     AnswerSynthesizer, Chunker, HashingEmbeddingProvider, PdfLoader, RagConfig,
//!     RetrievalIndex, TextChunker,
//! };
//!
//! let config = RagConfig::builder().chunk_size(500).chunk_overlap(50).top_k(3).build()?;
//! let documents = PdfLoader::new("./data").load().await?;
//! let chunks = TextChunker::from_config(&config)?.chunk_all(&documents);
//! let index = RetrievalIndex::build(chunks, Arc::new(HashingEmbeddingProvider::default())).await?;
//!
//! let synthesizer = AnswerSynthesizer::builder()
//!     .config(config)
//!     .index(Arc::new(index))
//!     .generator(Arc::new(my_generator))
//!     .build()?;
//! let answer = synthesizer.answer("What is the phone number in the CV?").await?;
//! println!("{}", answer.text);
//! ```
//!
//! ## Features
//!
//! - `openai` - OpenAI-compatible embedding and chat clients (OpenRouter, OpenAI, vLLM, ...)
//! - `pdf` - PDF page extraction backed by `lopdf`
//! - `local` - local sentence embeddings (`all-MiniLM-L6-v2`) backed by `fastembed`

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod hashing;
pub mod index;
pub mod loader;
#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "openai")]
pub mod openai;
pub mod prompt;
pub mod synthesizer;

pub use chunking::{Chunker, TextChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, IndexEntry, SearchResult, SourceDocument};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::Generator;
pub use hashing::HashingEmbeddingProvider;
pub use index::{BuildOptions, RetrievalIndex};
#[cfg(feature = "pdf")]
pub use loader::LopdfExtractor;
pub use loader::{PageExtractor, PdfLoader};
#[cfg(feature = "local")]
pub use local::FastEmbedProvider;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatConfig, OpenAIChatGenerator, OpenAIEmbeddingProvider};
pub use prompt::{ContextFormat, PromptTemplate};
pub use synthesizer::{Answer, AnswerSynthesizer, AnswerSynthesizerBuilder};
