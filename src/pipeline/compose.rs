//! Document composition: page texts → PDF/EPUB via `pandoc`.

use crate::error::Ocr2MdError;
use crate::pipeline::process::{failure_detail, run_captured};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// Binds an ordered list of text files into one rendered document.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Render `files` (in order) into `output`. Any failure is fatal.
    async fn compose(&self, files: &[PathBuf], output: &Path) -> Result<(), Ocr2MdError>;
}

/// [`Compositor`] backed by `pandoc`.
///
/// PDF output goes through a LaTeX engine; the engine and main font are
/// passed explicitly so Unicode-heavy scans typeset without font fallbacks.
#[derive(Debug, Clone)]
pub struct Pandoc {
    binary: String,
    engine: String,
    font: String,
}

impl Pandoc {
    pub fn new(
        binary: impl Into<String>,
        engine: impl Into<String>,
        font: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            engine: engine.into(),
            font: font.into(),
        }
    }

    /// Build the argument list for one invocation.
    pub fn args(&self, files: &[PathBuf], output: &Path) -> Vec<String> {
        let mut args: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        args.push("-o".into());
        args.push(output.display().to_string());
        if is_pdf(output) {
            args.push(format!("--pdf-engine={}", self.engine));
            args.push("-V".into());
            args.push(format!("mainfont={}", self.font));
        }
        args
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("pdf")
}

#[async_trait]
impl Compositor for Pandoc {
    async fn compose(&self, files: &[PathBuf], output: &Path) -> Result<(), Ocr2MdError> {
        if files.is_empty() {
            return Err(Ocr2MdError::NoTextFiles {
                dir: output.parent().map(Path::to_path_buf).unwrap_or_default(),
            });
        }

        info!("Composing {} from {} files", output.display(), files.len());
        let mut cmd = Command::new(&self.binary);
        cmd.args(self.args(files, output));

        let result = run_captured(cmd, None)
            .await
            .map_err(|e| Ocr2MdError::ComposeFailed {
                output: output.to_path_buf(),
                detail: format!("could not run {}: {}", self.binary, e),
            })?;

        if !result.status.success() {
            return Err(Ocr2MdError::ComposeFailed {
                output: output.to_path_buf(),
                detail: failure_detail(&result),
            });
        }
        Ok(())
    }
}
