use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Ask questions about the PDF documents in a directory.
#[derive(Parser, Debug)]
#[command(name = "pdfchat", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer questions interactively until an empty line is entered (default).
    Chat,

    /// Answer a single question and exit.
    Ask {
        /// The question to ask.
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Print a preview of every retrieved chunk after the answer.
        #[arg(long)]
        show_sources: bool,
    },

    /// Load and chunk the documents without calling any model.
    Chunks {
        /// Number of chunks to print.
        #[arg(long, default_value_t = 2)]
        limit: usize,
    },
}

/// Which embedding backend builds the index.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingBackend {
    /// Local `all-MiniLM-L6-v2` sentence embeddings, downloaded on first use.
    #[default]
    Local,
    /// Offline feature-hashing embeddings; no model download.
    Hashing,
    /// An OpenAI-compatible `/embeddings` endpoint.
    Openai,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// A PDF file or a directory of PDF files.
    #[arg(long, env = "PDFCHAT_DATA", default_value = "./data", global = true)]
    pub data: PathBuf,

    /// Maximum chunk size in characters.
    #[arg(long, env = "PDFCHAT_CHUNK_SIZE", global = true)]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks.
    #[arg(long, env = "PDFCHAT_CHUNK_OVERLAP", global = true)]
    pub chunk_overlap: Option<usize>,

    /// Split only on this separator instead of paragraphs, lines and spaces.
    #[arg(long, env = "PDFCHAT_SEPARATOR", global = true)]
    pub separator: Option<String>,

    /// Number of chunks retrieved per question.
    #[arg(short = 'k', long, env = "PDFCHAT_TOP_K", global = true)]
    pub top_k: Option<usize>,

    /// Drop retrieved chunks scoring below this cosine similarity.
    #[arg(long, env = "PDFCHAT_THRESHOLD", global = true)]
    pub threshold: Option<f32>,

    /// Label each context chunk with its source file and page.
    #[arg(long, global = true)]
    pub attribution: bool,

    /// API key for the chat endpoint.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(
        long,
        env = "OPENROUTER_BASE_URL",
        default_value = pdfchat_rag::openai::OPENROUTER_API_BASE,
        global = true
    )]
    pub base_url: String,

    /// Chat model identifier.
    #[arg(long, env = "PDFCHAT_MODEL", default_value = "openai/gpt-4o-mini", global = true)]
    pub model: String,

    /// Sampling temperature.
    #[arg(long, env = "PDFCHAT_TEMPERATURE", default_value_t = 0.7, global = true)]
    pub temperature: f32,

    /// Seconds to wait for a model response.
    #[arg(long = "timeout", env = "PDFCHAT_TIMEOUT_SECS", default_value_t = 60, global = true)]
    pub timeout_secs: u64,

    /// Optional system message sent before every prompt.
    #[arg(long, env = "PDFCHAT_SYSTEM_PROMPT", global = true)]
    pub system_prompt: Option<String>,

    /// Embedding backend used to build the index.
    #[arg(long, env = "PDFCHAT_EMBEDDINGS", value_enum, default_value_t, global = true)]
    pub embeddings: EmbeddingBackend,

    /// Model for the `openai` embedding backend.
    #[arg(long, env = "PDFCHAT_EMBEDDING_MODEL", global = true)]
    pub embedding_model: Option<String>,

    /// Directory for downloaded local embedding models.
    #[arg(long, env = "PDFCHAT_MODEL_CACHE", global = true)]
    pub model_cache: Option<PathBuf>,

    /// `HTTP-Referer` header sent to OpenRouter.
    #[arg(long, env = "PDFCHAT_REFERER", global = true)]
    pub referer: Option<String>,

    /// `X-Title` header sent to OpenRouter.
    #[arg(long, env = "PDFCHAT_TITLE", global = true)]
    pub title: Option<String>,

    /// Increase log verbosity (-v debug for pdfchat crates, -vv everything).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}
