//! Interactive question loop and answer rendering.

use std::future::Future;
use std::io::Write;

use pdfchat_rag::{Answer, AnswerSynthesizer, SearchResult};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

/// Characters of each source chunk shown after an answer.
pub const PREVIEW_CHARS: usize = 200;

const PROMPT: &str = "\nAsk a question (empty line to quit): ";

/// One read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Interrupted,
    Eof,
}

/// Source of user input for [`run_chat`].
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input>;
}

/// A [`LineReader`] over a rustyline editor with in-memory history.
pub struct RustylineReader {
    editor: DefaultEditor,
}

impl RustylineReader {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { editor: DefaultEditor::new()? })
    }
}

impl LineReader for RustylineReader {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input> {
        // readline blocks; keep the runtime's other workers free.
        match tokio::task::block_in_place(|| self.editor.readline(prompt)) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(e) => Err(e.into()),
        }
    }
}

/// Answer questions until the user enters an empty line, presses Ctrl-D or
/// presses Ctrl-C at the prompt.
///
/// A failed question is reported and the loop continues. `interrupt` is
/// called once per question; if its future resolves before the answer, only
/// that question is abandoned. The binary passes a Ctrl-C listener.
pub async fn run_chat<R, W, I, F>(
    synthesizer: &AnswerSynthesizer,
    reader: &mut R,
    out: &mut W,
    mut interrupt: I,
) -> anyhow::Result<()>
where
    R: LineReader,
    W: Write,
    I: FnMut() -> F,
    F: Future<Output = ()>,
{
    writeln!(
        out,
        "Ready. {} chunks indexed. Ask about your documents.",
        synthesizer.index().len()
    )?;

    loop {
        let line = match reader.read_line(PROMPT)? {
            Input::Line(line) => line,
            Input::Interrupted | Input::Eof => {
                writeln!(out, "Goodbye!")?;
                return Ok(());
            }
        };

        let question = line.trim();
        if question.is_empty() {
            writeln!(out, "Goodbye!")?;
            return Ok(());
        }

        writeln!(out, "\nSearching for relevant information...")?;
        tokio::select! {
            result = synthesizer.answer(question) => match result {
                Ok(answer) => write_answer(out, &answer, true)?,
                Err(e) => {
                    warn!(error = %e, "question failed");
                    writeln!(out, "\nError: {e}")?;
                }
            },
            () = interrupt() => {
                writeln!(out, "\nCancelled.")?;
            }
        }
    }
}

/// Print the answer and, when `show_sources` is set, a preview of each
/// retrieved chunk in score order.
pub fn write_answer<W: Write>(
    out: &mut W,
    answer: &Answer,
    show_sources: bool,
) -> std::io::Result<()> {
    writeln!(out, "\nAnswer: {}", answer.text)?;
    if !show_sources {
        return Ok(());
    }

    if answer.sources.is_empty() {
        writeln!(out, "\nNo relevant chunks were found.")?;
        return Ok(());
    }

    writeln!(out, "\nSources:")?;
    for (i, result) in answer.sources.iter().enumerate() {
        write_source(out, i + 1, result)?;
    }
    Ok(())
}

fn write_source<W: Write>(out: &mut W, rank: usize, result: &SearchResult) -> std::io::Result<()> {
    let chunk = &result.chunk;
    writeln!(
        out,
        "\n{rank}. {} p.{} (score {:.3}): {}",
        chunk.source,
        chunk.page,
        result.score,
        preview(&chunk.text, PREVIEW_CHARS)
    )
}

/// Resolves when the user presses Ctrl-C.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// The first `max_chars` characters of `text`, with `...` appended if cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
