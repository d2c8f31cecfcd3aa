//! # pdfchat-cli
//!
//! Command-line front end for [`pdfchat_rag`]: loads a folder of PDFs once,
//! builds an in-memory index and answers questions about it.
//!
//! Commands:
//! - `chat` (default): interactive loop, empty line to quit.
//! - `ask <QUESTION>`: one answer, then exit.
//! - `chunks`: load and chunk only; no API key needed.

pub mod app;
pub mod cli;
pub mod console;
pub mod logging;
pub mod settings;

use std::io::Write;
use std::sync::Arc;

use pdfchat_rag::{LopdfExtractor, PageExtractor};

use crate::app::Corpus;
use crate::cli::{Cli, Command};
use crate::console::RustylineReader;
use crate::settings::Settings;

/// Run the parsed command line to completion.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_options(&cli.options)?;
    let extractor: Arc<dyn PageExtractor> = Arc::new(LopdfExtractor);
    let mut stdout = std::io::stdout();

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chunks { limit } => {
            let corpus = app::load_corpus(&settings, extractor).await?;
            print_chunks(&mut stdout, &corpus, limit)?;
        }
        Command::Ask { question, show_sources } => {
            let generator = settings.generator()?;
            let corpus = app::load_corpus(&settings, extractor).await?;
            let synthesizer = app::build_synthesizer(&settings, corpus, generator).await?;
            let answer = synthesizer.answer(&question.join(" ")).await?;
            console::write_answer(&mut stdout, &answer, show_sources)?;
        }
        Command::Chat => {
            let generator = settings.generator()?;
            let corpus = app::load_corpus(&settings, extractor).await?;
            let synthesizer = app::build_synthesizer(&settings, corpus, generator).await?;
            let mut reader = RustylineReader::new()?;
            console::run_chat(&synthesizer, &mut reader, &mut stdout, console::ctrl_c).await?;
        }
    }

    Ok(())
}

/// Print page and chunk counts followed by the first `limit` chunks.
pub fn print_chunks<W: Write>(out: &mut W, corpus: &Corpus, limit: usize) -> std::io::Result<()> {
    writeln!(out, "Loaded {} pages", corpus.documents.len())?;
    writeln!(out, "Split into {} chunks", corpus.chunks.len())?;

    for chunk in corpus.chunks.iter().take(limit) {
        writeln!(
            out,
            "\n--- {} (page {}, chars {}..{}) ---\n{}",
            chunk.id, chunk.page, chunk.char_start, chunk.char_end, chunk.text
        )?;
    }
    Ok(())
}
