//! PDF ingestion.
//!
//! [`PdfLoader`] turns a file or a directory of PDFs into page-level
//! [`SourceDocument`]s. Text extraction sits behind [`PageExtractor`]; with
//! the `pdf` feature the default extractor is [`LopdfExtractor`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::document::SourceDocument;
use crate::error::{RagError, Result};

/// Extracts per-page plain text from a file.
///
/// Extraction is blocking; [`PdfLoader`] runs it on tokio's blocking pool.
pub trait PageExtractor: Send + Sync {
    /// Return `(page_number, text)` pairs in page order. Page numbers are 1-based.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IngestionError`] if the file is unreadable or unparsable.
    fn extract_pages(&self, path: &Path) -> Result<Vec<(u32, String)>>;
}

/// A [`PageExtractor`] backed by `lopdf`.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

#[cfg(feature = "pdf")]
impl PageExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<(u32, String)>> {
        let source = file_name(path);
        let document = lopdf::Document::load(path)
            .map_err(|e| RagError::ingestion(&source, format!("failed to parse PDF: {e}")))?;

        document
            .get_pages()
            .keys()
            .map(|&page| {
                document.extract_text(&[page]).map(|text| (page, text)).map_err(|e| {
                    RagError::ingestion(&source, format!("failed to extract page {page}: {e}"))
                })
            })
            .collect()
    }
}

/// Loads PDF pages from a single file or from every `.pdf` file in a directory.
///
/// Directory entries are read in file-name order so that page order, and
/// therefore index insertion order, is stable across runs.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::PdfLoader;
///
/// let pages = PdfLoader::new("./data").load().await?;
/// println!("Loaded {} pages", pages.len());
/// ```
pub struct PdfLoader {
    path: PathBuf,
    extractor: Arc<dyn PageExtractor>,
}

impl PdfLoader {
    /// Create a loader for `path` using [`LopdfExtractor`].
    #[cfg(feature = "pdf")]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_extractor(path, Arc::new(LopdfExtractor))
    }

    /// Create a loader for `path` with a custom extractor.
    pub fn with_extractor(path: impl Into<PathBuf>, extractor: Arc<dyn PageExtractor>) -> Self {
        Self { path: path.into(), extractor }
    }

    /// The configured file or directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List the PDF files that [`load`](Self::load) will read.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the path does not exist, is a
    /// non-PDF file, or is a directory without PDF files.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let path = &self.path;
        if !path.exists() {
            return Err(RagError::ConfigError(format!(
                "data path '{}' does not exist",
                path.display()
            )));
        }

        if path.is_file() {
            if !is_pdf(path) {
                return Err(RagError::ConfigError(format!(
                    "'{}' is not a PDF file",
                    path.display()
                )));
            }
            return Ok(vec![path.clone()]);
        }

        let entries = std::fs::read_dir(path).map_err(|e| {
            RagError::ConfigError(format!("cannot read directory '{}': {e}", path.display()))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_pdf(p))
            .collect();
        files.sort_by_key(|p| file_name(p));

        if files.is_empty() {
            return Err(RagError::ConfigError(format!(
                "no PDF files found in '{}'",
                path.display()
            )));
        }

        debug!(path = %path.display(), file_count = files.len(), "discovered PDF files");
        Ok(files)
    }

    /// Extract every page of every discovered file.
    ///
    /// Files are processed one after another; pages keep file order, then
    /// page order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] from [`discover`](Self::discover)
    /// before any extraction, or [`RagError::IngestionError`] for the first
    /// file that cannot be read.
    pub async fn load(&self) -> Result<Vec<SourceDocument>> {
        let files = self.discover()?;
        let mut documents = Vec::new();

        for file in files {
            let source = file_name(&file);
            let extractor = Arc::clone(&self.extractor);
            let task_path = file.clone();

            let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&task_path))
                .await
                .map_err(|e| {
                    RagError::ingestion(&source, format!("extraction task failed: {e}"))
                })??;

            if pages.is_empty() {
                warn!(source = %source, "PDF has no pages");
            }
            info!(source = %source, page_count = pages.len(), "loaded PDF");

            let uri = file.display().to_string();
            documents.extend(pages.into_iter().map(|(page, text)| SourceDocument {
                source: source.clone(),
                page,
                text,
                source_uri: Some(uri.clone()),
            }));
        }

        Ok(documents)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads the file as UTF-8 and treats each line as one page.
    struct LinePages;

    impl PageExtractor for LinePages {
        fn extract_pages(&self, path: &Path) -> Result<Vec<(u32, String)>> {
            let text = std::fs::read_to_string(path)
                .map_err(|e| RagError::ingestion(file_name(path), e.to_string()))?;
            if text.starts_with("%broken") {
                return Err(RagError::ingestion(file_name(path), "bad xref table"));
            }
            Ok(text.lines().enumerate().map(|(i, line)| (i as u32 + 1, line.to_string())).collect())
        }
    }

    fn loader(path: &Path) -> PdfLoader {
        PdfLoader::with_extractor(path, Arc::new(LinePages))
    }

    #[tokio::test]
    async fn loads_pdf_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), "b one\nb two").unwrap();
        std::fs::write(dir.path().join("a.PDF"), "a one").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let documents = loader(dir.path()).load().await.unwrap();
        let ids: Vec<String> = documents.iter().map(SourceDocument::id).collect();
        assert_eq!(ids, vec!["a.PDF#p1", "b.pdf#p1", "b.pdf#p2"]);
        assert_eq!(documents[2].text, "b two");
        assert!(documents[0].source_uri.as_deref().unwrap().ends_with("a.PDF"));
    }

    #[tokio::test]
    async fn loads_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cv.pdf");
        std::fs::write(&file, "page one").unwrap();

        let documents = loader(&file).load().await.unwrap();
        assert_eq!(documents, vec![SourceDocument {
            source: "cv.pdf".into(),
            page: 1,
            text: "page one".into(),
            source_uri: Some(file.display().to_string()),
        }]);
    }

    #[test]
    fn missing_path_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader(&dir.path().join("nope")).discover().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(msg) if msg.contains("does not exist")));
    }

    #[test]
    fn directory_without_pdfs_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "hi").unwrap();
        let err = loader(dir.path()).discover().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(msg) if msg.contains("no PDF files")));
    }

    #[test]
    fn non_pdf_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hi").unwrap();
        assert!(matches!(loader(&file).discover(), Err(RagError::ConfigError(_))));
    }

    #[tokio::test]
    async fn unreadable_file_is_an_ingestion_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.pdf"), "%broken").unwrap();
        let err = loader(dir.path()).load().await.unwrap_err();
        assert!(
            matches!(err, RagError::IngestionError { ref source_name, .. } if source_name == "bad.pdf")
        );
    }
}
