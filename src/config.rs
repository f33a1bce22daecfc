//! Configuration types for the OCR pipeline and the translation utility.
//!
//! All run behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Languages, model identifiers, timeouts and
//! compositor settings all live here and are passed to the entry points
//! explicitly; nothing is read from global constants at run time.

use crate::error::Ocr2MdError;
use crate::pipeline::compose::Compositor;
use crate::pipeline::ocr::OcrBackend;
use crate::pipeline::rasterize::Rasterizer;
use crate::pipeline::translate::Translator;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for one OCR pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use ocr2md::{OutputFormat, OutputMode, PipelineConfig};
/// use std::time::Duration;
///
/// let config = PipelineConfig::builder()
///     .ocr_timeout(Duration::from_secs(30))
///     .output_mode(OutputMode::SingleDocument)
///     .output_format(OutputFormat::Epub)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Rasterization resolution handed to `pdftoppm -r`. Default: 300.
    pub dpi: u32,

    /// Upper bound on a single OCR call. Default: 15 s.
    ///
    /// The only timed external call in the pipeline. A page that exceeds it
    /// gets the timeout placeholder; the run continues.
    pub ocr_timeout: Duration,

    /// OCR model passed to `ollama run`. Default: `deepseek-ocr`.
    pub ocr_model: String,

    /// Directive appended to the image reference in the OCR prompt.
    /// If None, uses [`crate::prompts::DEFAULT_OCR_DIRECTIVE`].
    pub ocr_directive: Option<String>,

    /// Shape of the pipeline's product. Default: [`OutputMode::PageFiles`].
    pub output_mode: OutputMode,

    /// Page boundary marker used in [`OutputMode::SingleDocument`].
    /// Default: [`PageSeparator::Comment`].
    pub page_separator: PageSeparator,

    /// Rendered document to produce after OCR, if any. Default: None.
    pub output_format: Option<OutputFormat>,

    /// Re-apply the citation rewrite to every page file after the page loop.
    /// Default: true.
    ///
    /// Page files written by an earlier run with an older normalisation rule
    /// are brought up to date without re-running OCR.
    pub citation_post_pass: bool,

    /// Re-run OCR for pages whose previous attempt left a placeholder.
    /// Default: false (any existing page file is final).
    pub retry_failed: bool,

    /// Refuse to compose a rendered document while placeholder pages remain.
    /// Default: false (placeholders are included as-is).
    pub block_on_placeholders: bool,

    /// LaTeX engine requested from the compositor for PDF output. Default: `xelatex`.
    pub compositor_engine: String,

    /// Main font requested from the compositor for PDF output. Default: `Libertinus Serif`.
    pub compositor_font: String,

    /// External executables. Defaults: `pdftoppm`, `ollama`, `pandoc`.
    pub rasterizer_bin: String,
    pub ollama_bin: String,
    pub compositor_bin: String,

    /// Pre-constructed backends. Each takes precedence over the matching
    /// external executable; tests use these to inject fakes.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,
    pub ocr_backend: Option<Arc<dyn OcrBackend>>,
    pub compositor: Option<Arc<dyn Compositor>>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            ocr_timeout: Duration::from_secs(15),
            ocr_model: "deepseek-ocr".to_string(),
            ocr_directive: None,
            output_mode: OutputMode::default(),
            page_separator: PageSeparator::Comment,
            output_format: None,
            citation_post_pass: true,
            retry_failed: false,
            block_on_placeholders: false,
            compositor_engine: "xelatex".to_string(),
            compositor_font: "Libertinus Serif".to_string(),
            rasterizer_bin: "pdftoppm".to_string(),
            ollama_bin: "ollama".to_string(),
            compositor_bin: "pandoc".to_string(),
            rasterizer: None,
            ocr_backend: None,
            compositor: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("dpi", &self.dpi)
            .field("ocr_timeout", &self.ocr_timeout)
            .field("ocr_model", &self.ocr_model)
            .field("output_mode", &self.output_mode)
            .field("page_separator", &self.page_separator)
            .field("output_format", &self.output_format)
            .field("citation_post_pass", &self.citation_post_pass)
            .field("retry_failed", &self.retry_failed)
            .field("block_on_placeholders", &self.block_on_placeholders)
            .field("compositor_engine", &self.compositor_engine)
            .field("compositor_font", &self.compositor_font)
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn Rasterizer>"))
            .field("ocr_backend", &self.ocr_backend.as_ref().map(|_| "<dyn OcrBackend>"))
            .field("compositor", &self.compositor.as_ref().map(|_| "<dyn Compositor>"))
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn ocr_timeout(mut self, timeout: Duration) -> Self {
        self.config.ocr_timeout = timeout;
        self
    }

    pub fn ocr_timeout_ms(self, ms: u64) -> Self {
        self.ocr_timeout(Duration::from_millis(ms))
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = model.into();
        self
    }

    pub fn ocr_directive(mut self, directive: impl Into<String>) -> Self {
        self.config.ocr_directive = Some(directive.into());
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = Some(format);
        self
    }

    pub fn citation_post_pass(mut self, v: bool) -> Self {
        self.config.citation_post_pass = v;
        self
    }

    pub fn retry_failed(mut self, v: bool) -> Self {
        self.config.retry_failed = v;
        self
    }

    pub fn block_on_placeholders(mut self, v: bool) -> Self {
        self.config.block_on_placeholders = v;
        self
    }

    pub fn compositor_engine(mut self, engine: impl Into<String>) -> Self {
        self.config.compositor_engine = engine.into();
        self
    }

    pub fn compositor_font(mut self, font: impl Into<String>) -> Self {
        self.config.compositor_font = font.into();
        self
    }

    pub fn rasterizer_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.rasterizer_bin = bin.into();
        self
    }

    pub fn ollama_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.ollama_bin = bin.into();
        self
    }

    pub fn compositor_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.compositor_bin = bin.into();
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn ocr_backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.config.ocr_backend = Some(backend);
        self
    }

    pub fn compositor(mut self, compositor: Arc<dyn Compositor>) -> Self {
        self.config.compositor = Some(compositor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Ocr2MdError> {
        let c = &self.config;
        if !(72..=600).contains(&c.dpi) {
            return Err(Ocr2MdError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.ocr_timeout.is_zero() {
            return Err(Ocr2MdError::InvalidConfig(
                "OCR timeout must be greater than zero".into(),
            ));
        }
        if c.ocr_model.trim().is_empty() {
            return Err(Ocr2MdError::InvalidConfig("OCR model must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// Configuration for the standalone translation utility.
#[derive(Clone)]
pub struct TranslationConfig {
    /// Language of the input document. Default: English (en).
    pub source_language: Language,
    /// Language to translate into; its code suffixes the output file. Default: Spanish (es).
    pub target_language: Language,
    /// Text-generation model passed to `ollama run`. Default: `translategemma`.
    pub model: String,
    /// Executable used for the translation backend. Default: `ollama`.
    pub ollama_bin: String,
    /// Pre-constructed translator; takes precedence over `ollama_bin`.
    pub translator: Option<Arc<dyn Translator>>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_language: Language::new("English", "en"),
            target_language: Language::new("Spanish", "es"),
            model: "translategemma".to_string(),
            ollama_bin: "ollama".to_string(),
            translator: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("source_language", &self.source_language)
            .field("target_language", &self.target_language)
            .field("model", &self.model)
            .field("ollama_bin", &self.ollama_bin)
            .field("translator", &self.translator.as_ref().map(|_| "<dyn Translator>"))
            .finish()
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// A human-readable language name plus its short code, e.g. `Spanish` / `es`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub code: String,
}

impl Language {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Rendered document formats the compositor can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Epub,
}

impl OutputFormat {
    /// File extension (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Epub => "epub",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Ocr2MdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "epub" => Ok(OutputFormat::Epub),
            other => Err(Ocr2MdError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What the page pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// A directory of per-page text files (default).
    #[default]
    PageFiles,
    /// Per-page files plus one concatenated Markdown document with page
    /// boundary markers.
    SingleDocument,
}

/// How to separate pages in the assembled Markdown output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n".
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string for the given page number (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}
