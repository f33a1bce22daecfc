//! PDF rasterisation: one PNG per page via `pdftoppm`.
//!
//! ## Cache semantics
//!
//! Rasterising a 300-page scan at 300 DPI takes minutes, so the output
//! directory doubles as a cache: if it already holds at least one
//! `page-<digits>.png`, rasterisation is skipped. Other files such as
//! `page-cover.png` are ignored both for this check and for the page list. The page count is not checked
//! against the PDF; a partial directory is treated as complete. Delete the
//! `pages/` directory to force a fresh render.

use crate::error::Ocr2MdError;
use crate::pipeline::process::{failure_detail, run_captured};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// File-name prefix of rasterised pages (`page-1.png`, `page-001.png`, …).
pub const PAGE_IMAGE_PREFIX: &str = "page";

/// One rasterised page, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub index: usize,
    pub path: PathBuf,
}

/// Turns a PDF into an ordered list of page images.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Rasterise `pdf` into `out_dir`, returning the pages in order.
    ///
    /// Any failure is fatal for the document.
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PageImage>, Ocr2MdError>;
}

/// [`Rasterizer`] backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: String,
    dpi: u32,
}

impl Pdftoppm {
    pub fn new(binary: impl Into<String>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
        }
    }
}

#[async_trait]
impl Rasterizer for Pdftoppm {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PageImage>, Ocr2MdError> {
        let existing = list_page_images(out_dir).await?;
        if !existing.is_empty() {
            info!(
                "Reusing {} existing page images in {}",
                existing.len(),
                out_dir.display()
            );
            return Ok(existing);
        }

        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| Ocr2MdError::OutputWriteFailed {
                path: out_dir.to_path_buf(),
                source: e,
            })?;

        info!("Rasterising {} at {} DPI", pdf.display(), self.dpi);
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(out_dir.join(PAGE_IMAGE_PREFIX));

        let output = run_captured(cmd, None)
            .await
            .map_err(|e| Ocr2MdError::RasterizeFailed {
                path: pdf.to_path_buf(),
                detail: format!("could not run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(Ocr2MdError::RasterizeFailed {
                path: pdf.to_path_buf(),
                detail: failure_detail(&output),
            });
        }

        list_page_images(out_dir).await
    }
}

/// List `page-N.png` files in `dir`, ordered by page number.
///
/// pdftoppm pads the number to the width of the page count (`page-7.png`,
/// `page-07.png`, `page-007.png`), so ordering is numeric. A missing
/// directory yields an empty list.
pub async fn list_page_images(dir: &Path) -> Result<Vec<PageImage>, Ocr2MdError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(Ocr2MdError::ReadFailed {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let mut pages = Vec::new();
    loop {
        let entry = entries
            .next_entry()
            .await
            .map_err(|e| Ocr2MdError::ReadFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
        let Some(entry) = entry else { break };
        let path = entry.path();
        if let Some(number) = page_number(&path, "png") {
            pages.push((number, path));
        }
    }

    pages.sort();
    debug!("Found {} page images in {}", pages.len(), dir.display());
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, (_, path))| PageImage { index: i + 1, path })
        .collect())
}

/// Parse the number out of `page-<digits>.<ext>`.
pub(crate) fn page_number(path: &Path, ext: &str) -> Option<usize> {
    if path.extension().and_then(|e| e.to_str()) != Some(ext) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(PAGE_IMAGE_PREFIX)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_parses_padded_names() {
        assert_eq!(page_number(Path::new("x/page-7.png"), "png"), Some(7));
        assert_eq!(page_number(Path::new("x/page-012.png"), "png"), Some(12));
        assert_eq!(page_number(Path::new("x/page-012.txt"), "txt"), Some(12));
        assert_eq!(page_number(Path::new("x/page-012.txt"), "png"), None);
        assert_eq!(page_number(Path::new("x/page-.png"), "png"), None);
        assert_eq!(page_number(Path::new("x/page-1a.png"), "png"), None);
        assert_eq!(page_number(Path::new("x/cover.png"), "png"), None);
    }

    #[tokio::test]
    async fn list_orders_numerically_and_reindexes() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-09.png", "page-1.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let pages = list_page_images(dir.path()).await.unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["page-1.png", "page-09.png", "page-10.png"]);
        assert_eq!(
            pages.iter().map(|p| p.index).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[tokio::test]
    async fn missing_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pages = list_page_images(&dir.path().join("absent")).await.unwrap();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn existing_images_skip_the_rasterizer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-1.png"), b"").unwrap();
        // A binary that cannot exist: reaching it would fail the call.
        let r = Pdftoppm::new("definitely-not-pdftoppm-ocr2md", 300);
        let pages = r
            .rasterize(Path::new("missing.pdf"), dir.path())
            .await
            .expect("cache hit must not invoke the binary");
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn non_numeric_page_images_do_not_count_as_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-cover.png"), b"").unwrap();
        let r = Pdftoppm::new("definitely-not-pdftoppm-ocr2md", 300);
        let err = r
            .rasterize(Path::new("doc.pdf"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Ocr2MdError::RasterizeFailed { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_fatal_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pages");
        let r = Pdftoppm::new("definitely-not-pdftoppm-ocr2md", 300);
        let err = r.rasterize(Path::new("doc.pdf"), &out).await.unwrap_err();
        assert!(matches!(err, Ocr2MdError::RasterizeFailed { .. }));
        assert!(out.is_dir());
    }
}
