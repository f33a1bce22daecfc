//! On-disk layout derived from the input PDF path.
//!
//! ```text
//! scans/book.pdf            input
//! scans/book/pages/         page-N.png       (rasterizer cache)
//! scans/book/text/          page-NNN.txt     (one file per page, resume signal)
//! scans/book/state.json     job-state manifest
//! scans/book/book.md        assembled document (single-document mode)
//! scans/book/book.pdf|epub  rendered output
//! ```

use crate::config::OutputFormat;
use crate::error::Ocr2MdError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File-name prefix of per-page text files.
pub const PAGE_TEXT_PREFIX: &str = "page";

/// Paths owned by one document run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLayout {
    pub pdf: PathBuf,
    pub base_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub text_dir: PathBuf,
    pub state_path: PathBuf,
    stem: String,
}

impl DocumentLayout {
    /// Derive the working directory (`X/` for `X.pdf`) and its children.
    pub fn for_pdf(pdf: impl AsRef<Path>) -> Self {
        let pdf = pdf.as_ref().to_path_buf();
        let base_dir = pdf.with_extension("");
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Self {
            pages_dir: base_dir.join("pages"),
            text_dir: base_dir.join("text"),
            state_path: base_dir.join("state.json"),
            base_dir,
            pdf,
            stem,
        }
    }

    /// `text/page-NNN.txt` for a 1-indexed page.
    pub fn page_text_path(&self, page: usize) -> PathBuf {
        self.text_dir.join(page_text_name(page))
    }

    /// The assembled single-document Markdown file.
    pub fn assembled_markdown_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}.md", self.stem))
    }

    /// The rendered document for `format`, inside the working directory so it
    /// never collides with the source PDF.
    pub fn rendered_output_path(&self, format: OutputFormat) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", self.stem, format.extension()))
    }
}

/// `page-NNN.txt`, zero-padded to three digits.
pub fn page_text_name(page: usize) -> String {
    format!("{}-{:03}.txt", PAGE_TEXT_PREFIX, page)
}

/// Write `contents` to `path` via a sibling temp file and a rename.
///
/// A page file's existence marks the page as done, so a half-written file
/// left behind by a killed process must never appear under the final name.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), Ocr2MdError> {
    let write_err = |source| Ocr2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}
