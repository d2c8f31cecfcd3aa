//! Startup: load the documents, chunk them and build the answer synthesizer.

use std::sync::Arc;

use pdfchat_rag::{
    AnswerSynthesizer, Chunk, Chunker, Generator, PageExtractor, PdfLoader, Result,
    RetrievalIndex, SourceDocument, TextChunker,
};
use tracing::{info, warn};

use crate::settings::Settings;

/// Loaded pages and the chunks cut from them.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub documents: Vec<SourceDocument>,
    pub chunks: Vec<Chunk>,
}

/// Load every page under the configured data path and chunk it.
///
/// # Errors
///
/// Returns a `ConfigError` for a missing or PDF-less data path and an
/// `IngestionError` for an unreadable file.
pub async fn load_corpus(settings: &Settings, extractor: Arc<dyn PageExtractor>) -> Result<Corpus> {
    let documents = PdfLoader::with_extractor(&settings.data_path, extractor).load().await?;
    let chunker = TextChunker::from_config(&settings.rag)?;
    let chunks = chunker.chunk_all(&documents);

    if chunks.is_empty() {
        warn!(path = %settings.data_path.display(), "documents contain no extractable text");
    }
    info!(page_count = documents.len(), chunk_count = chunks.len(), "chunked documents");
    Ok(Corpus { documents, chunks })
}

/// Embed the corpus and wire the index to `generator`.
///
/// # Errors
///
/// Returns an `EmbeddingError` if the index cannot be built, or a
/// `ConfigError` for an unusable embedding backend or a local model that
/// fails to load.
pub async fn build_synthesizer(
    settings: &Settings,
    corpus: Corpus,
    generator: Arc<dyn Generator>,
) -> Result<AnswerSynthesizer> {
    let provider = settings.embedding_provider().await?;
    let index = RetrievalIndex::build(corpus.chunks, provider).await?;

    AnswerSynthesizer::builder()
        .config(settings.rag.clone())
        .index(Arc::new(index))
        .context_format(settings.context_format.clone())
        .generator(generator)
        .build()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use clap::Parser;
    use pdfchat_rag::RagError;

    use super::*;
    use crate::cli::Cli;

    /// One page per line of a UTF-8 file.
    struct TextPages;

    impl PageExtractor for TextPages {
        fn extract_pages(&self, path: &Path) -> Result<Vec<(u32, String)>> {
            let text = std::fs::read_to_string(path)
                .map_err(|e| RagError::ConfigError(e.to_string()))?;
            Ok(text.lines().enumerate().map(|(i, l)| (i as u32 + 1, l.to_string())).collect())
        }
    }

    struct Echo;

    #[async_trait]
    impl Generator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo: {}", prompt.len()))
        }
    }

    fn settings(data: &Path, extra: &[&str]) -> Settings {
        let data = data.to_string_lossy().into_owned();
        let mut argv = vec!["pdfchat", "--data", data.as_str(), "--embeddings", "hashing"];
        argv.extend_from_slice(extra);
        Settings::from_options(&Cli::try_parse_from(argv).unwrap().options).unwrap()
    }

    #[tokio::test]
    async fn loads_and_chunks_every_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cv.pdf"), "AAAA BBBB CCCC DDDD\nshort page").unwrap();

        let settings = settings(
            dir.path(),
            &["--chunk-size", "10", "--chunk-overlap", "4", "--separator", " "],
        );
        let corpus = load_corpus(&settings, Arc::new(TextPages)).await.unwrap();

        assert_eq!(corpus.documents.len(), 2);
        let texts: Vec<&str> = corpus.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["AAAA BBBB", "BBBB CCCC", "CCCC DDDD", "short page"]);
    }

    #[tokio::test]
    async fn empty_directory_fails_before_indexing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_corpus(&settings(dir.path(), &[]), Arc::new(TextPages)).await.unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[tokio::test]
    async fn built_synthesizer_answers_from_the_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cv.pdf"),
            "Contact: phone +358 40 123 4567\nHobbies: hiking and baking",
        )
        .unwrap();

        let settings = settings(dir.path(), &["-k", "1"]);
        let corpus = load_corpus(&settings, Arc::new(TextPages)).await.unwrap();
        let synthesizer = build_synthesizer(&settings, corpus, Arc::new(Echo)).await.unwrap();

        let answer = synthesizer.answer("phone number").await.unwrap();
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].chunk.page, 1);
        assert!(answer.text.starts_with("echo: "));
    }
}
