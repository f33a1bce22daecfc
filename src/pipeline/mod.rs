//! Pipeline stages for scanned-PDF-to-Markdown conversion.
//!
//! Each submodule wraps exactly one external tool or one text transformation.
//! The tools sit behind small async traits so the driver in
//! [`crate::convert`] can run against fakes in tests.
//!
//! ## Data Flow
//!
//! ```text
//! rasterize ──▶ ocr ──▶ normalize ──▶ (state) ──▶ compose
//! (pdftoppm)  (ollama)  (markers,      (resume)    (pandoc)
//!                        citations)
//! ```
//!
//! 1. [`rasterize`] — one PNG per page via `pdftoppm`
//! 2. [`ocr`]       — `ollama run deepseek-ocr` per page, bounded by a timeout
//! 3. [`normalize`] — drop `<|…` control lines, rewrite `(^n)` citations
//! 4. [`state`]     — per-page manifest that survives restarts
//! 5. [`compose`]   — hand the page texts to `pandoc` for PDF/EPUB output
//!
//! [`translate`] is the backend for the standalone translation utility and
//! [`process`] holds the child-process plumbing they all share.

pub mod compose;
pub mod normalize;
pub mod ocr;
pub mod process;
pub mod rasterize;
pub mod state;
pub mod translate;
