//! Results returned by a pipeline run.

use crate::error::OcrError;
use crate::layout::DocumentLayout;
use serde::Serialize;
use std::path::PathBuf;

/// Page text written when the OCR call exceeded its timeout.
pub const TIMEOUT_PLACEHOLDER: &str = "[Page skipped: OCR timed out]";

/// Page text written when the OCR call failed for any other reason.
pub const ERROR_PLACEHOLDER: &str = "[OCR error on this page]";

/// Whether `text` is exactly one of the placeholder strings.
pub fn is_placeholder(text: &str) -> bool {
    let t = text.trim();
    t == TIMEOUT_PLACEHOLDER || t == ERROR_PLACEHOLDER
}

/// The placeholder substituted for a given OCR failure.
pub fn placeholder_for(error: &OcrError) -> &'static str {
    if error.is_timeout() {
        TIMEOUT_PLACEHOLDER
    } else {
        ERROR_PLACEHOLDER
    }
}

/// What happened to one page during this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PageOutcome {
    /// OCR succeeded; normalised text was written.
    Converted,
    /// The page file already existed and was left alone.
    Skipped {
        /// Whether the existing file is a placeholder from an earlier failure.
        placeholder: bool,
    },
    /// OCR failed; a placeholder was written.
    Failed(OcrError),
}

/// Per-page result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// The page's text file.
    pub text_path: PathBuf,
    pub outcome: PageOutcome,
}

impl PageResult {
    /// Whether the page's text on disk is a placeholder after this run.
    pub fn is_placeholder(&self) -> bool {
        match self.outcome {
            PageOutcome::Converted => false,
            PageOutcome::Skipped { placeholder } => placeholder,
            PageOutcome::Failed(_) => true,
        }
    }
}

/// Summary counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub converted_pages: usize,
    pub skipped_pages: usize,
    pub timed_out_pages: usize,
    pub failed_pages: usize,
    /// Page files rewritten by the citation post-pass.
    pub citation_fixes: usize,
    /// Whether the compositor ran (false when skipped or not requested).
    pub composed: bool,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    pub layout: DocumentLayout,
    /// Pages in increasing page order.
    pub pages: Vec<PageResult>,
    /// The assembled document (single-document mode only).
    pub markdown: Option<String>,
    /// Path of the rendered document, when one was requested.
    pub rendered: Option<PathBuf>,
    pub stats: ConversionStats,
}
