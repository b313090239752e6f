//! Content extraction: turn a file reference into raw text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::ExtractError;
use crate::utils::file::{extension_of, has_suffix, is_binary_extension, normalize_extensions, read_text_lossless};

/// Reader for page-structured documents such as PDF.
pub trait PageReader: Send + Sync {
    /// Text of each page, in page order.
    fn read_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError>;
}

/// A contiguous part of an extracted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub text: String,
    /// 0-based page index for paged formats.
    pub page: Option<usize>,
}

/// Text extracted from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub path: PathBuf,
    pub sections: Vec<Section>,
}

impl ExtractedDocument {
    /// All sections joined with blank lines.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A file skipped during a directory walk.
#[derive(Debug, Clone)]
pub struct ExtractFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Result of extracting a directory tree.
#[derive(Debug, Clone, Default)]
pub struct BatchExtraction {
    pub documents: Vec<ExtractedDocument>,
    pub failures: Vec<ExtractFailure>,
}

impl BatchExtraction {
    pub fn files_scanned(&self) -> usize {
        self.documents.len() + self.failures.len()
    }
}

/// Extractor dispatching on file extension.
#[derive(Clone, Default)]
pub struct ContentExtractor {
    page_reader: Option<Arc<dyn PageReader>>,
}

impl std::fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentExtractor")
            .field("page_reader", &self.page_reader.is_some())
            .finish()
    }
}

impl ContentExtractor {
    /// Extractor without a page reader; PDFs are rejected as unsupported.
    pub fn text_only() -> Self {
        Self { page_reader: None }
    }

    pub fn with_page_reader(page_reader: Arc<dyn PageReader>) -> Self {
        Self {
            page_reader: Some(page_reader),
        }
    }

    /// Extractor with the built-in PDF reader when the `pdf` feature is enabled.
    pub fn with_default_readers() -> Self {
        #[cfg(feature = "pdf")]
        {
            Self::with_page_reader(Arc::new(LopdfPageReader))
        }
        #[cfg(not(feature = "pdf"))]
        {
            Self::text_only()
        }
    }

    pub fn supports_pages(&self) -> bool {
        self.page_reader.is_some()
    }

    /// Extract the full text of `path`.
    pub fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        self.extract_document(path).map(|doc| doc.text())
    }

    /// Extract `path`, keeping page boundaries for paged formats.
    pub fn extract_document(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            return Err(ExtractError::UnsupportedFormat(format!(
                "{} is a directory",
                path.display()
            )));
        }

        let sections = match extension_of(path).as_deref() {
            Some("pdf") => self.read_paged(path)?,
            Some(ext) if is_binary_extension(ext) => {
                return Err(ExtractError::UnsupportedFormat(format!(
                    "'.{ext}' files cannot be read as text"
                )));
            }
            _ => vec![Section {
                text: read_text_lossless(path)?,
                page: None,
            }],
        };

        debug!(path = %path.display(), sections = sections.len(), "extracted file");

        Ok(ExtractedDocument {
            path: path.to_path_buf(),
            sections,
        })
    }

    fn read_paged(&self, path: &Path) -> Result<Vec<Section>, ExtractError> {
        let reader = self.page_reader.as_ref().ok_or_else(|| {
            ExtractError::UnsupportedFormat(
                "PDF support is not available (no page reader configured)".to_string(),
            )
        })?;

        let pages = reader.read_pages(path)?;
        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(page, text)| Section {
                text,
                page: Some(page),
            })
            .collect())
    }

    /// Extract every file under `dir` whose name ends with one of `extensions`.
    ///
    /// A file that fails to extract is logged and skipped; only a missing
    /// `dir` is an error.
    pub fn extract_all<S: AsRef<str>>(
        &self,
        dir: &Path,
        extensions: &[S],
    ) -> Result<BatchExtraction, ExtractError> {
        if !dir.exists() {
            return Err(ExtractError::FileNotFound(dir.to_path_buf()));
        }

        let suffixes = normalize_extensions(extensions);
        let mut batch = BatchExtraction::default();

        for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !has_suffix(entry.path(), &suffixes) {
                continue;
            }

            match self.extract_document(entry.path()) {
                Ok(document) => batch.documents.push(document),
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping file");
                    batch.failures.push(ExtractFailure {
                        path: entry.path().to_path_buf(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }
}

/// PDF page reader backed by `lopdf`.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfPageReader;

#[cfg(feature = "pdf")]
impl PageReader for LopdfPageReader {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let document = lopdf::Document::load(path).map_err(|e| ExtractError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let pages = document
            .get_pages()
            .keys()
            .map(|&number| match document.extract_text(&[number]) {
                Ok(text) => text,
                Err(e) => {
                    // Pages with undecodable content streams contribute no text
                    debug!(path = %path.display(), page = number, error = %e, "page text unavailable");
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct FixedPages(Vec<&'static str>);

    impl PageReader for FixedPages {
        fn read_pages(&self, _path: &Path) -> Result<Vec<String>, ExtractError> {
            Ok(self.0.iter().map(ToString::to_string).collect())
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ContentExtractor::text_only()
            .extract(Path::new("/definitely/not/here.txt"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }

    #[test]
    fn test_plain_text_and_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "# Title\n\nBody text").unwrap();

        let extractor = ContentExtractor::text_only();
        let first = extractor.extract(&path).unwrap();
        let second = extractor.extract(&path).unwrap();

        assert_eq!(first, "# Title\n\nBody text");
        assert_eq!(first, second);
    }

    #[test]
    fn test_latin1_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.txt");
        fs::write(&path, [b'n', 0xE4, b'h', b'e']).unwrap();

        let text = ContentExtractor::text_only().extract(&path).unwrap();
        assert_eq!(text, "nähe");
    }

    #[test]
    fn test_pdf_without_reader_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let err = ContentExtractor::text_only().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_pdf_pages_become_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Report.PDF");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let extractor = ContentExtractor::with_page_reader(Arc::new(FixedPages(vec!["one", "two"])));
        let document = extractor.extract_document(&path).unwrap();

        assert_eq!(document.sections.len(), 2);
        assert_eq!(document.sections[1].page, Some(1));
        assert_eq!(document.text(), "one\n\ntwo");
    }

    #[test]
    fn test_binary_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        fs::write(&path, [0u8, 1, 2]).unwrap();

        let err = ContentExtractor::text_only().extract(&path).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_extract_all_filters_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("sub").join("b.md"), "beta").unwrap();
        fs::write(dir.path().join("c.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("d.pdf"), b"%PDF").unwrap();

        let batch = ContentExtractor::text_only()
            .extract_all(dir.path(), &[".txt", ".md", ".pdf"])
            .unwrap();

        let names: Vec<String> = batch
            .documents
            .iter()
            .map(|d| d.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.md"]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.files_scanned(), 3);
    }

    #[test]
    fn test_extract_all_missing_dir() {
        let err = ContentExtractor::text_only()
            .extract_all(Path::new("/no/such/dir"), &[".txt"])
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }
}
