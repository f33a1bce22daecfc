//! Progress-callback trait for per-page pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the driver walks the pages. The library itself prints nothing;
//! the `ocr2md` binary turns these events into a progress bar.
//!
//! # Example
//!
//! ```rust
//! use ocr2md::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     skipped: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_page_skipped(&self, page_num: usize, total_pages: usize) {
//!         self.skipped.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} already done", page_num, total_pages);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { skipped: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the page driver as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed sequentially, so events arrive
/// in page order.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once after rasterisation, before the first page.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page already has a text file and is left alone.
    fn on_page_skipped(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called just before the OCR backend is invoked for a page.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's OCR text was normalised and written.
    ///
    /// `text_len` is the byte length of the written text.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when OCR failed and a placeholder was written instead.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page reached a terminal state.
    ///
    /// `placeholder_count` counts pages whose file is a placeholder,
    /// including skipped pages left over from earlier runs.
    fn on_run_complete(&self, total_pages: usize, placeholder_count: usize) {
        let _ = (total_pages, placeholder_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
