use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::config::ExtractionConfig;

/// The only content type accepted for upload.
pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("No text could be extracted from the PDF")]
    NoText,

    #[error("{0}")]
    Parse(String),

    #[error("Failed to stage PDF for extraction: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction timed out after {0}s")]
    TimedOut(u64),
}

/// Text of a single page, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    use_pdftotext: bool,
    timeout: Duration,
}

impl DocumentExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            use_pdftotext: config.use_pdftotext,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Extract per-page text from PDF bytes.
    ///
    /// The bytes are staged in a temp file owned by this call, so it is gone
    /// by the time the call returns, whether extraction succeeded, failed or
    /// timed out.
    pub async fn extract(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<Vec<PageText>, ExtractionError> {
        self.extract_in(&std::env::temp_dir(), bytes, filename).await
    }

    async fn extract_in(
        &self,
        dir: &Path,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<Vec<PageText>, ExtractionError> {
        tracing::info!("extract: starting extraction for '{filename}' ({} bytes)", bytes.len());

        let tmp: NamedTempFile = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(dir)?;
        tokio::fs::write(tmp.path(), &bytes).await?;
        drop(bytes);

        // On timeout the extraction future is dropped, which kills a running
        // pdftotext child; `tmp` is removed when it drops at the end of scope.
        let result = match tokio::time::timeout(self.timeout, self.extract_staged(tmp.path())).await {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::TimedOut(self.timeout.as_secs())),
        };

        match &result {
            Ok(pages) => tracing::info!("extract: '{filename}' yielded {} pages", pages.len()),
            Err(e) => tracing::warn!("extract: '{filename}' failed: {e}"),
        }
        result
    }

    async fn extract_staged(&self, path: &Path) -> Result<Vec<PageText>, ExtractionError> {
        let raw_pages = if self.use_pdftotext {
            match pages_via_pdftotext(path).await {
                Ok(pages) if has_text(&pages) => {
                    tracing::debug!("PDF extracted via pdftotext ({} pages)", pages.len());
                    pages
                }
                Ok(_) => {
                    tracing::warn!("pdftotext returned empty text, falling back to pdf_extract");
                    pages_via_pdf_extract(path).await?
                }
                Err(e) => {
                    tracing::warn!("pdftotext failed ({e:#}), falling back to pdf_extract");
                    pages_via_pdf_extract(path).await?
                }
            }
        } else {
            pages_via_pdf_extract(path).await?
        };

        if !has_text(&raw_pages) {
            return Err(ExtractionError::NoText);
        }

        Ok(raw_pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageText { number: i + 1, text })
            .collect())
    }
}

/// Join page texts into the document body handed to the chunker.
pub fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|p| p.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn has_text(pages: &[String]) -> bool {
    pages.iter().any(|p| !p.trim().is_empty())
}

async fn pages_via_pdftotext(path: &Path) -> anyhow::Result<Vec<String>> {
    use anyhow::Context;

    let output = Command::new("pdftotext")
        .arg(path)
        .arg("-") // output to stdout
        .kill_on_drop(true)
        .output()
        .await
        .context("Failed to run pdftotext, is poppler-utils installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("pdftotext exited with {}: {stderr}", output.status);
    }

    let text = String::from_utf8(output.stdout).context("pdftotext output is not valid UTF-8")?;

    // Pages are separated by form feeds, with one trailing after the last page.
    let mut pages: Vec<String> = text.split('\u{c}').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    Ok(pages)
}

/// Parsing is CPU-bound, so it runs on the blocking pool. A panic in the
/// parser is reported as a failed extraction.
async fn pages_via_pdf_extract(path: &Path) -> Result<Vec<String>, ExtractionError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&path))
        .await
        .map_err(|e| ExtractionError::Parse(format!("extraction task aborted: {e}")))?
        .map_err(|e| ExtractionError::Parse(format!("Failed to read PDF: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_pdf;

    fn extractor(use_pdftotext: bool) -> DocumentExtractor {
        DocumentExtractor {
            use_pdftotext,
            timeout: Duration::from_secs(30),
        }
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_extracts_pages_in_order() {
        let pdf = build_pdf(&["Hello world.", "This is page two."]);
        let pages = extractor(true).extract(pdf, "two-pages.pdf").await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[1].number, 2);
        assert!(pages[0].text.contains("Hello world."));
        assert!(pages[1].text.contains("This is page two."));
    }

    #[tokio::test]
    async fn test_pdf_extract_fallback_only() {
        let pdf = build_pdf(&["Only page"]);
        let pages = extractor(false).extract(pdf, "one.pdf").await.unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].text.contains("Only page"));
    }

    #[tokio::test]
    async fn test_blank_pdf_is_no_text() {
        let pdf = build_pdf(&["", ""]);
        let err = extractor(true).extract(pdf, "blank.pdf").await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoText), "got {err:?}");
    }

    #[tokio::test]
    async fn test_garbage_is_parse_failure() {
        let err = extractor(true)
            .extract(b"definitely not a pdf".to_vec(), "junk.pdf")
            .await
            .unwrap_err();
        assert!(
            matches!(err, ExtractionError::Parse(_) | ExtractionError::NoText),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_temp_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();

        let fallback = extractor(false);
        let preferred = extractor(true);

        let garbage = fallback.extract_in(dir.path(), b"not a pdf".to_vec(), "a.pdf").await;
        assert!(garbage.is_err());
        let blank = fallback.extract_in(dir.path(), build_pdf(&[""]), "b.pdf").await;
        assert!(blank.is_err());
        let ok = preferred.extract_in(dir.path(), build_pdf(&["Some text"]), "c.pdf").await;
        assert!(ok.is_ok());

        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_temp_file_is_removed_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let pages: Vec<String> = (0..3000).map(|i| format!("Page number {i}")).collect();
        let pages: Vec<&str> = pages.iter().map(String::as_str).collect();

        for use_pdftotext in [false, true] {
            let slow = DocumentExtractor {
                use_pdftotext,
                timeout: Duration::from_millis(1),
            };
            let err = slow
                .extract_in(dir.path(), build_pdf(&pages), "huge.pdf")
                .await
                .unwrap_err();

            assert!(matches!(err, ExtractionError::TimedOut(_)), "got {err:?}");
            assert_eq!(files_in(dir.path()), 0);
        }
    }

    #[test]
    fn test_join_pages_skips_blank_pages() {
        let pages = vec![
            PageText { number: 1, text: "Hello world.\n".into() },
            PageText { number: 2, text: "   ".into() },
            PageText { number: 3, text: "This is page two.".into() },
        ];
        assert_eq!(join_pages(&pages), "Hello world.\n\nThis is page two.");
    }
}
