//! CLI binary for the standalone Markdown translator.
//!
//! `md-translate book.md` writes `book.es.md` next to the input.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr2md::{translate_file, Language, TranslationConfig};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Translate a Markdown file with a local model.
#[derive(Parser, Debug)]
#[command(
    name = "md-translate",
    version,
    about = "Translate a Markdown file with a local model",
    arg_required_else_help = true
)]
struct Cli {
    /// Markdown file to translate (must end in .md).
    input: PathBuf,

    /// Source language name.
    #[arg(long, env = "MD_TRANSLATE_SOURCE", default_value = "English")]
    source: String,

    /// Source language code.
    #[arg(long, env = "MD_TRANSLATE_SOURCE_CODE", default_value = "en")]
    source_code: String,

    /// Target language name.
    #[arg(long, env = "MD_TRANSLATE_TARGET", default_value = "Spanish")]
    target: String,

    /// Target language code; also the suffix of the output file.
    #[arg(long, env = "MD_TRANSLATE_TARGET_CODE", default_value = "es")]
    target_code: String,

    /// Model passed to `ollama run`.
    #[arg(long, env = "MD_TRANSLATE_MODEL", default_value = "translategemma")]
    model: String,

    /// ollama executable.
    #[arg(long, env = "MD_TRANSLATE_OLLAMA", default_value = "ollama")]
    ollama_bin: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    let config = TranslationConfig {
        source_language: Language::new(&cli.source, &cli.source_code),
        target_language: Language::new(&cli.target, &cli.target_code),
        model: cli.model.clone(),
        ollama_bin: cli.ollama_bin.clone(),
        translator: None,
    };

    let spinner = (!cli.quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("Translating into {}…", config.target_language));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = translate_file(&cli.input, &config).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let out = result.with_context(|| format!("Translation of {} failed", cli.input.display()))?;

    if !cli.quiet {
        eprintln!("Translation saved to {}", out.display());
    }
    Ok(())
}
