//! CLI binary for ocr2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use ocr2md::{
    convert, OutputFormat, OutputMode, PageSeparator, PipelineConfig, PipelineProgressCallback,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the whole document plus a log line
/// per page. Pages arrive strictly in order, so a single start time suffices.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Rasterising pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
    }

    fn page_elapsed(&self) -> String {
        let secs = self
            .page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running OCR on {total_pages} pages…"))
        ));
    }

    fn on_page_skipped(&self, page_num: usize, total: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            dim("↷"),
            page_num,
            total,
            dim("already done"),
        ));
        self.bar.inc(1);
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            self.page_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            self.page_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, placeholder_count: usize) {
        self.bar.finish_and_clear();

        if placeholder_count == 0 {
            eprintln!(
                "{} {} pages transcribed",
                green("✔"),
                bold(&total_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages transcribed  ({} placeholders, {} failed this run)",
                yellow("⚠"),
                bold(&(total_pages - placeholder_count).to_string()),
                total_pages,
                yellow(&placeholder_count.to_string()),
                self.errors.load(Ordering::SeqCst),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR every page into scans/book/text/page-NNN.txt
  ocr2md scans/book.pdf

  # ... and render an EPUB at scans/book/book.epub
  ocr2md scans/book.pdf epub

  # One Markdown file with page markers, rendered to PDF
  ocr2md --single-document scans/book.pdf pdf

  # Give slow pages more time, and retry pages that timed out last run
  ocr2md --timeout 60 --retry-failed scans/book.pdf

RESUMING:
  Re-running on the same PDF skips every page that already has a text file.
  Pages that failed are kept as placeholders and only re-OCRed with
  --retry-failed.

REQUIRED TOOLS:
  pdftoppm   (poppler-utils)   rasterisation
  ollama     with deepseek-ocr  OCR
  pandoc     + xelatex          only for pdf/epub output
"#;

/// OCR scanned PDFs into Markdown with a local model.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2md",
    version,
    about = "OCR scanned PDFs into Markdown with a local model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Scanned PDF to convert.
    input: PathBuf,

    /// Also render the result: pdf or epub.
    #[arg(value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Rasterisation DPI (72–600).
    #[arg(long, env = "OCR2MD_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Per-page OCR timeout in seconds.
    #[arg(long, env = "OCR2MD_TIMEOUT", default_value_t = 15)]
    timeout: u64,

    /// OCR model passed to `ollama run`.
    #[arg(long, env = "OCR2MD_MODEL", default_value = "deepseek-ocr")]
    model: String,

    /// Write one assembled X/X.md instead of composing from page files.
    #[arg(long, env = "OCR2MD_SINGLE_DOCUMENT")]
    single_document: bool,

    /// Page separator in single-document mode: none, hr, comment, or custom string.
    #[arg(long, env = "OCR2MD_SEPARATOR", default_value = "comment")]
    separator: String,

    /// Skip the citation post-pass over existing page files.
    #[arg(long, env = "OCR2MD_NO_CITATION_PASS")]
    no_citation_pass: bool,

    /// Re-OCR pages that hold a placeholder from an earlier run.
    #[arg(long, env = "OCR2MD_RETRY_FAILED")]
    retry_failed: bool,

    /// Refuse to render while any page is a placeholder.
    #[arg(long, env = "OCR2MD_STRICT")]
    strict: bool,

    /// pandoc PDF engine.
    #[arg(long, env = "OCR2MD_PDF_ENGINE", default_value = "xelatex")]
    pdf_engine: String,

    /// Main font for PDF output.
    #[arg(long, env = "OCR2MD_FONT", default_value = "Libertinus Serif")]
    font: String,

    /// pdftoppm executable.
    #[arg(long, env = "OCR2MD_PDFTOPPM", default_value = "pdftoppm")]
    pdftoppm_bin: String,

    /// ollama executable.
    #[arg(long, env = "OCR2MD_OLLAMA", default_value = "ollama")]
    ollama_bin: String,

    /// pandoc executable.
    #[arg(long, env = "OCR2MD_PANDOC", default_value = "pandoc")]
    pandoc_bin: String,

    /// Print the run result as JSON on stdout.
    #[arg(long, env = "OCR2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "OCR2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCR2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    let output = convert(&cli.input, &config)
        .await
        .with_context(|| format!("Conversion of {} failed", cli.input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        let stats = &output.stats;
        let degraded = stats.timed_out_pages + stats.failed_pages;
        eprintln!(
            "{}  {} new, {} resumed, {} timed out, {} failed  {}ms  →  {}",
            if degraded == 0 { green("✔") } else { yellow("⚠") },
            stats.converted_pages,
            stats.skipped_pages,
            stats.timed_out_pages,
            stats.failed_pages,
            stats.total_duration_ms,
            bold(&output.layout.text_dir.display().to_string()),
        );
        if stats.citation_fixes > 0 {
            eprintln!(
                "   {}",
                dim(&format!("citations corrected in {} files", stats.citation_fixes))
            );
        }
        if let Some(ref rendered) = output.rendered {
            let verb = if stats.composed { "rendered" } else { "exists" };
            eprintln!("   {} {}", dim(verb), bold(&rendered.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mode = if cli.single_document {
        OutputMode::SingleDocument
    } else {
        OutputMode::PageFiles
    };

    let mut builder = PipelineConfig::builder()
        .dpi(cli.dpi)
        .ocr_timeout(Duration::from_secs(cli.timeout))
        .ocr_model(&cli.model)
        .output_mode(mode)
        .page_separator(parse_separator(&cli.separator))
        .citation_post_pass(!cli.no_citation_pass)
        .retry_failed(cli.retry_failed)
        .block_on_placeholders(cli.strict)
        .compositor_engine(&cli.pdf_engine)
        .compositor_font(&cli.font)
        .rasterizer_bin(&cli.pdftoppm_bin)
        .ollama_bin(&cli.ollama_bin)
        .compositor_bin(&cli.pandoc_bin);

    if let Some(format) = cli.format {
        builder = builder.output_format(format);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "none" => PageSeparator::None,
        "hr" | "---" => PageSeparator::HorizontalRule,
        "comment" => PageSeparator::Comment,
        _ => PageSeparator::Custom(s.to_string()),
    }
}
