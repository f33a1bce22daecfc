//! Page pipeline driver: PDF → page images → OCR text → assembled output.
//!
//! ## Resumability
//!
//! The filesystem is the only coordination mechanism. Every page's text is
//! written atomically to `text/page-NNN.txt` as soon as it is known, and an
//! existing file is never re-derived. Killing the process mid-run and
//! starting it again therefore continues from the first page without a file.
//! The job-state manifest ([`JobState`]) rides along to remember which of
//! those files are placeholders.

use crate::config::{OutputMode, PageSeparator, PipelineConfig};
use crate::error::Ocr2MdError;
use crate::layout::{write_atomic, DocumentLayout};
use crate::output::{placeholder_for, ConversionOutput, ConversionStats, PageOutcome, PageResult};
use crate::pipeline::compose::{Compositor, Pandoc};
use crate::pipeline::normalize::{fix_citations, normalize_text};
use crate::pipeline::ocr::{OcrBackend, OllamaOcr};
use crate::pipeline::rasterize::{page_number, PageImage, Pdftoppm, Rasterizer};
use crate::pipeline::state::{JobState, PageState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a scanned PDF into per-page Markdown text (and optionally one
/// assembled document and a rendered PDF/EPUB).
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` once every page reached a terminal state, even if
/// some pages only hold placeholder text (check `output.stats`).
///
/// # Errors
/// Returns `Err(Ocr2MdError)` only for fatal errors:
/// - Input missing or not a `.pdf`
/// - Rasterizer failure, or no page images produced
/// - I/O errors writing page files or the manifest
/// - Compositor failure, or nothing to compose
pub async fn convert(
    pdf: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    let total_start = Instant::now();
    let pdf = validate_pdf(pdf.as_ref())?;
    let layout = DocumentLayout::for_pdf(&pdf);
    info!("Processing PDF: {}", pdf.display());

    // ── Step 1: Rasterise ────────────────────────────────────────────────
    let rasterizer = resolve_rasterizer(config);
    let images = rasterizer.rasterize(&pdf, &layout.pages_dir).await?;
    if images.is_empty() {
        return Err(Ocr2MdError::NoPageImages {
            dir: layout.pages_dir.clone(),
        });
    }
    info!("{} page images ready", images.len());

    // ── Step 2: OCR every page ───────────────────────────────────────────
    tokio::fs::create_dir_all(&layout.text_dir)
        .await
        .map_err(|e| Ocr2MdError::OutputWriteFailed {
            path: layout.text_dir.clone(),
            source: e,
        })?;

    let mut state = JobState::load(&layout.state_path).await?;
    let ocr = resolve_ocr_backend(config);
    let pages = process_pages(&images, &layout, ocr.as_ref(), &mut state, config).await?;
    info!("OCR complete → {}", layout.text_dir.display());

    // ── Step 3: Citation post-pass ───────────────────────────────────────
    let citation_fixes = if config.citation_post_pass {
        let n = rewrite_citations_in_dir(&layout.text_dir).await?;
        if n > 0 {
            info!("Citations corrected in {} files", n);
        } else {
            debug!("No citation corrections needed");
        }
        n
    } else {
        0
    };

    // ── Step 4: Assemble ─────────────────────────────────────────────────
    let markdown = match config.output_mode {
        OutputMode::PageFiles => None,
        OutputMode::SingleDocument => {
            let md = assemble_document(&pages, &config.page_separator).await?;
            let path = layout.assembled_markdown_path();
            write_atomic(&path, &md).await?;
            info!("Assembled document → {}", path.display());
            Some(md)
        }
    };

    // ── Step 5: Compose ──────────────────────────────────────────────────
    let mut composed = false;
    let rendered = match config.output_format {
        None => None,
        Some(format) => {
            let output_path = layout.rendered_output_path(format);
            if config.block_on_placeholders && !output_path.exists() {
                let placeholders: Vec<usize> = pages
                    .iter()
                    .filter(|p| p.is_placeholder())
                    .map(|p| p.page_num)
                    .collect();
                if !placeholders.is_empty() {
                    return Err(Ocr2MdError::PlaceholderPages {
                        pages: placeholders,
                    });
                }
            }

            let inputs = match config.output_mode {
                OutputMode::PageFiles => list_page_texts(&layout.text_dir).await?,
                OutputMode::SingleDocument => vec![layout.assembled_markdown_path()],
            };
            let compositor = resolve_compositor(config);
            composed = compose_document(
                &inputs,
                &layout.text_dir,
                &output_path,
                compositor.as_ref(),
            )
            .await?;
            Some(output_path)
        }
    };

    // ── Step 6: Stats ────────────────────────────────────────────────────
    let mut stats = ConversionStats {
        total_pages: pages.len(),
        citation_fixes,
        composed,
        ..Default::default()
    };
    for page in &pages {
        match &page.outcome {
            PageOutcome::Converted => stats.converted_pages += 1,
            PageOutcome::Skipped { .. } => stats.skipped_pages += 1,
            PageOutcome::Failed(e) if e.is_timeout() => stats.timed_out_pages += 1,
            PageOutcome::Failed(_) => stats.failed_pages += 1,
        }
    }
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Run complete: {} converted, {} skipped, {} timed out, {} failed, {}ms",
        stats.converted_pages,
        stats.skipped_pages,
        stats.timed_out_pages,
        stats.failed_pages,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        layout,
        pages,
        markdown,
        rendered,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    pdf: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Ocr2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(pdf, config))
}

/// Run OCR over `images` in page order, writing one text file per page.
///
/// Pages whose text file already exists are skipped (unless
/// `config.retry_failed` is set and the page is a recorded failure). OCR
/// failures never escape: the page gets a placeholder and the loop moves on.
/// Only I/O errors on the page files or the manifest are fatal.
pub async fn process_pages(
    images: &[PageImage],
    layout: &DocumentLayout,
    ocr: &dyn OcrBackend,
    state: &mut JobState,
    config: &PipelineConfig,
) -> Result<Vec<PageResult>, Ocr2MdError> {
    let total = images.len();
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_run_start(total);
    }

    let mut results = Vec::with_capacity(total);

    for image in images {
        let page_num = image.index;
        let text_path = layout.page_text_path(page_num);

        if let Some(existing) = read_if_exists(&text_path).await? {
            let known = state.reconcile_existing(page_num, &existing);
            if !(config.retry_failed && known.is_failed()) {
                info!("Page {}/{}: text exists, skipping", page_num, total);
                if let Some(cb) = cb {
                    cb.on_page_skipped(page_num, total);
                }
                results.push(PageResult {
                    page_num,
                    text_path,
                    outcome: PageOutcome::Skipped {
                        placeholder: known.is_failed(),
                    },
                });
                continue;
            }
            info!("Page {}/{}: retrying earlier failure", page_num, total);
        }

        info!(
            "Page {}/{}: OCR {}",
            page_num,
            total,
            image.path.display()
        );
        if let Some(cb) = cb {
            cb.on_page_start(page_num, total);
        }

        let outcome = match ocr.recognize(image).await {
            Ok(raw) => {
                let text = normalize_text(&raw);
                write_atomic(&text_path, &text).await?;
                state.set(page_num, PageState::Done);
                if let Some(cb) = cb {
                    cb.on_page_complete(page_num, total, text.len());
                }
                PageOutcome::Converted
            }
            Err(e) => {
                warn!("{}", e);
                write_atomic(&text_path, placeholder_for(&e)).await?;
                state.set(
                    page_num,
                    PageState::Failed {
                        error: Some(e.clone()),
                    },
                );
                if let Some(cb) = cb {
                    cb.on_page_error(page_num, total, &e.to_string());
                }
                PageOutcome::Failed(e)
            }
        };

        // Persist after every page so an interrupted run keeps what it learned.
        state.save(&layout.state_path).await?;

        results.push(PageResult {
            page_num,
            text_path,
            outcome,
        });
    }

    state.save(&layout.state_path).await?;

    if let Some(cb) = cb {
        let placeholders = results.iter().filter(|r| r.is_placeholder()).count();
        cb.on_run_complete(total, placeholders);
    }

    Ok(results)
}

/// Re-apply the citation rewrite to every `page-*.txt` in `text_dir`.
///
/// Returns the number of files whose content changed.
pub async fn rewrite_citations_in_dir(text_dir: &Path) -> Result<usize, Ocr2MdError> {
    let mut changed = 0;
    for path in list_page_texts(text_dir).await? {
        let content = read_to_string(&path).await?;
        let fixed = fix_citations(&content);
        if fixed != content {
            debug!("Citations rewritten in {}", path.display());
            write_atomic(&path, &fixed).await?;
            changed += 1;
        }
    }
    Ok(changed)
}

/// Concatenate the page texts of `pages` (in page order) into one document.
pub async fn assemble_document(
    pages: &[PageResult],
    separator: &PageSeparator,
) -> Result<String, Ocr2MdError> {
    let mut ordered: Vec<&PageResult> = pages.iter().collect();
    ordered.sort_by_key(|p| p.page_num);

    let mut parts: Vec<String> = Vec::with_capacity(ordered.len() * 2);
    for (i, page) in ordered.iter().enumerate() {
        if i > 0 {
            parts.push(separator.render(page.page_num));
        }
        parts.push(read_to_string(&page.text_path).await?.trim().to_string());
    }

    let mut doc = parts.join("");
    doc.push('\n');
    Ok(doc)
}

/// Hand `files` to the compositor unless `output` already exists.
///
/// Returns whether the compositor ran.
pub async fn compose_document(
    files: &[PathBuf],
    text_dir: &Path,
    output: &Path,
    compositor: &dyn Compositor,
) -> Result<bool, Ocr2MdError> {
    if output.exists() {
        info!("{} already exists, skipping composition", output.display());
        return Ok(false);
    }
    if files.is_empty() {
        return Err(Ocr2MdError::NoTextFiles {
            dir: text_dir.to_path_buf(),
        });
    }
    compositor.compose(files, output).await?;
    info!("Rendered → {}", output.display());
    Ok(true)
}

/// `page-*.txt` files in `dir`, ordered by page number.
pub async fn list_page_texts(dir: &Path) -> Result<Vec<PathBuf>, Ocr2MdError> {
    let read_err = |source| Ocr2MdError::ReadFailed {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_err(e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        if let Some(n) = page_number(&path, "txt") {
            files.push((n, path));
        }
    }
    files.sort();
    Ok(files.into_iter().map(|(_, p)| p).collect())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Check the input exists and carries a `.pdf` extension (any case).
fn validate_pdf(path: &Path) -> Result<PathBuf, Ocr2MdError> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(Ocr2MdError::InvalidInput {
            path: path.to_path_buf(),
            expected: "pdf",
        });
    }
    if !path.is_file() {
        return Err(Ocr2MdError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(path.to_path_buf())
}

async fn read_if_exists(path: &Path) -> Result<Option<String>, Ocr2MdError> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Ocr2MdError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

async fn read_to_string(path: &Path) -> Result<String, Ocr2MdError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Ocr2MdError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Pre-built backends win over the configured executables.
fn resolve_rasterizer(config: &PipelineConfig) -> Arc<dyn Rasterizer> {
    match config.rasterizer {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(Pdftoppm::new(&config.rasterizer_bin, config.dpi)),
    }
}

fn resolve_ocr_backend(config: &PipelineConfig) -> Arc<dyn OcrBackend> {
    match config.ocr_backend {
        Some(ref b) => Arc::clone(b),
        None => Arc::new(
            OllamaOcr::new(&config.ollama_bin, &config.ocr_model, config.ocr_timeout)
                .with_directive(config.ocr_directive.clone()),
        ),
    }
}

fn resolve_compositor(config: &PipelineConfig) -> Arc<dyn Compositor> {
    match config.compositor {
        Some(ref c) => Arc::clone(c),
        None => Arc::new(Pandoc::new(
            &config.compositor_bin,
            &config.compositor_engine,
            &config.compositor_font,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_wrong_extension() {
        let err = validate_pdf(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Ocr2MdError::InvalidInput { expected: "pdf", .. }));
    }

    #[test]
    fn validate_rejects_missing_file() {
        let err = validate_pdf(Path::new("/definitely/not/here.PDF")).unwrap_err();
        assert!(matches!(err, Ocr2MdError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn post_pass_counts_changed_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-001.txt"), "see (^{4})").unwrap();
        std::fs::write(dir.path().join("page-002.txt"), "see [^5]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "(^9)").unwrap();

        assert_eq!(rewrite_citations_in_dir(dir.path()).await.unwrap(), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("page-001.txt")).unwrap(),
            "see [^4]"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "(^9)"
        );
        assert_eq!(rewrite_citations_in_dir(dir.path()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn assemble_orders_pages_and_inserts_markers() {
        let dir = tempfile::tempdir().unwrap();
        let mut pages = Vec::new();
        for (n, text) in [(2, "second\n"), (1, "first"), (3, "third")] {
            let path = dir.path().join(format!("page-00{n}.txt"));
            std::fs::write(&path, text).unwrap();
            pages.push(PageResult {
                page_num: n,
                text_path: path,
                outcome: PageOutcome::Converted,
            });
        }
        let doc = assemble_document(&pages, &PageSeparator::Comment).await.unwrap();
        assert_eq!(
            doc,
            "first\n\n<!-- page 2 -->\n\nsecond\n\n<!-- page 3 -->\n\nthird\n"
        );
    }

    #[tokio::test]
    async fn list_page_texts_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-010.txt", "page-002.txt", "page-1000.txt", "page-002.txt.tmp"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let files = list_page_texts(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["page-002.txt", "page-010.txt", "page-1000.txt"]);
    }
}
