//! Error types for the ocr2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Ocr2MdError`] — **Fatal**: the run cannot proceed at all (bad input
//!   file, rasterizer crashed, compositor failed). Returned as
//!   `Err(Ocr2MdError)` from the top-level entry points.
//!
//! * [`OcrError`] — **Non-fatal**: the OCR backend failed or timed out on a
//!   single page. The driver writes a placeholder for that page, records the
//!   error in [`crate::output::PageResult`] and the job-state manifest, and
//!   moves on to the next page.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ocr2md library.
///
/// Page-level OCR failures use [`OcrError`] and never propagate here.
#[derive(Debug, Error)]
pub enum Ocr2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Input file has the wrong extension for this entry point.
    #[error("Invalid input file '{path}': expected a .{expected} file")]
    InvalidInput { path: PathBuf, expected: &'static str },

    /// Output format token is not one of the supported values.
    #[error("Invalid output format '{0}' (use pdf or epub)")]
    InvalidFormat(String),

    // ── Rasterizer errors ─────────────────────────────────────────────────
    /// The external rasterizer could not be started or exited nonzero.
    #[error("Rasterizing '{path}' failed: {detail}")]
    RasterizeFailed { path: PathBuf, detail: String },

    /// Rasterization finished but produced no page images.
    #[error("No page images found in '{dir}'")]
    NoPageImages { dir: PathBuf },

    // ── Compositor errors ─────────────────────────────────────────────────
    /// Composition was requested but there are no page texts to feed it.
    #[error("No text files to compose in '{dir}'")]
    NoTextFiles { dir: PathBuf },

    /// The external compositor could not be started or exited nonzero.
    #[error("Composing '{output}' failed: {detail}")]
    ComposeFailed { output: PathBuf, detail: String },

    /// Composition refused because some pages only hold placeholder text.
    #[error("{} page(s) hold placeholder text, refusing to compose: {pages:?}", pages.len())]
    PlaceholderPages { pages: Vec<usize> },

    // ── Translation errors ────────────────────────────────────────────────
    /// The translation backend could not be started or exited nonzero.
    #[error("Translation failed: {detail}")]
    TranslationFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read an input or intermediate file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file or directory.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The job-state manifest could not be serialised.
    #[error("Failed to serialise job state '{path}': {detail}")]
    StateSerializeFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal failure (e.g. runtime creation).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal OCR error for a single page.
///
/// The driver substitutes a placeholder and continues with the next page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum OcrError {
    /// The backend did not answer within the configured timeout.
    #[error("Page {page}: OCR timed out after {timeout_ms}ms")]
    Timeout { page: usize, timeout_ms: u64 },

    /// The backend exited with a nonzero status.
    #[error("Page {page}: OCR backend exited with {status}: {stderr}")]
    BackendFailure {
        page: usize,
        status: String,
        stderr: String,
    },

    /// The backend process could not be started or its pipes failed.
    #[error("Page {page}: could not run OCR backend: {detail}")]
    Spawn { page: usize, detail: String },
}

impl OcrError {
    /// The 1-indexed page this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            OcrError::Timeout { page, .. }
            | OcrError::BackendFailure { page, .. }
            | OcrError::Spawn { page, .. } => *page,
        }
    }

    /// Whether this is the timeout outcome (as opposed to any other failure).
    pub fn is_timeout(&self) -> bool {
        matches!(self, OcrError::Timeout { .. })
    }
}
