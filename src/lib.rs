//! # ocr2md
//!
//! Turn scanned PDFs into Markdown with a local OCR model.
//!
//! Scanned books have no text layer, so text extraction tools return nothing.
//! This crate rasterises each page with `pdftoppm`, sends every image through
//! `ollama run deepseek-ocr`, cleans the result up (model control markers,
//! footnote citations) and writes one Markdown text file per page. The page
//! files double as a checkpoint: an interrupted run picks up where it stopped.
//!
//! ## Pipeline Overview
//!
//! ```text
//! X.pdf
//!  │
//!  ├─ 1. Rasterise  X/pages/page-N.png          (pdftoppm, cached)
//!  ├─ 2. OCR        one bounded call per page   (ollama, timeout → placeholder)
//!  ├─ 3. Normalise  strip `<|` lines, (^n) → [^n]
//!  ├─ 4. Persist    X/text/page-NNN.txt + X/state.json
//!  ├─ 5. Post-pass  re-apply citation fixes to every page file
//!  ├─ 6. Assemble   X/X.md with page markers    (single-document mode)
//!  └─ 7. Compose    X/X.pdf | X/X.epub          (pandoc, optional)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2md::{convert, OutputFormat, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .output_format(OutputFormat::Epub)
//!         .build()?;
//!     let output = convert("scans/book.pdf", &config).await?;
//!     eprintln!(
//!         "{} pages, {} timed out",
//!         output.stats.total_pages, output.stats.timed_out_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! Translation is a separate step on a finished Markdown file, see
//! [`translate_file`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` and `md-translate` binaries |
//!
//! ```toml
//! ocr2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Language, OutputFormat, OutputMode, PageSeparator, PipelineConfig, PipelineConfigBuilder,
    TranslationConfig,
};
pub use convert::{convert, convert_sync, process_pages, rewrite_citations_in_dir};
pub use error::{Ocr2MdError, OcrError};
pub use layout::DocumentLayout;
pub use output::{ConversionOutput, ConversionStats, PageOutcome, PageResult};
pub use pipeline::compose::{Compositor, Pandoc};
pub use pipeline::normalize::{fix_citations, normalize_text};
pub use pipeline::ocr::{OcrBackend, OllamaOcr};
pub use pipeline::rasterize::{PageImage, Pdftoppm, Rasterizer};
pub use pipeline::state::{JobState, PageState};
pub use pipeline::translate::{OllamaTranslator, Translator};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use translate::translate_file;
