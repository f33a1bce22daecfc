//! OCR invocation: one bounded backend call per page image.
//!
//! This module turns a page image into raw OCR text. Prompt wording lives in
//! [`crate::prompts`] and cleanup in [`crate::pipeline::normalize`].
//!
//! ## Failure policy
//!
//! A call either returns text or a typed [`OcrError`]; it never aborts the
//! document. There are no retries: a hung model is killed when the timeout
//! fires and the page gets a placeholder for this run.

use crate::error::OcrError;
use crate::pipeline::process::run_captured;
use crate::pipeline::rasterize::PageImage;
use crate::prompts::ocr_prompt;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Produces raw (un-normalised) text for one page image.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    async fn recognize(&self, page: &PageImage) -> Result<String, OcrError>;
}

/// [`OcrBackend`] that pipes a prompt into `ollama run <model>`.
#[derive(Debug, Clone)]
pub struct OllamaOcr {
    binary: String,
    model: String,
    directive: Option<String>,
    timeout: Duration,
}

impl OllamaOcr {
    pub fn new(binary: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            directive: None,
            timeout,
        }
    }

    /// Replace the default "convert to markdown" directive.
    pub fn with_directive(mut self, directive: Option<String>) -> Self {
        self.directive = directive;
        self
    }
}

#[async_trait]
impl OcrBackend for OllamaOcr {
    async fn recognize(&self, page: &PageImage) -> Result<String, OcrError> {
        let start = Instant::now();
        let prompt = ocr_prompt(&page.path, self.directive.as_deref());

        let mut cmd = Command::new(&self.binary);
        cmd.arg("run").arg(&self.model);

        let output = match tokio::time::timeout(self.timeout, run_captured(cmd, Some(&prompt))).await
        {
            Err(_elapsed) => {
                warn!(
                    "Page {}: OCR timed out after {:?} ({})",
                    page.index,
                    self.timeout,
                    page.path.display()
                );
                return Err(OcrError::Timeout {
                    page: page.index,
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                return Err(OcrError::Spawn {
                    page: page.index,
                    detail: format!("{}: {}", self.binary, e),
                })
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(OcrError::BackendFailure {
                page: page.index,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "Page {}: {} bytes of OCR output in {:?}",
            page.index,
            text.len(),
            start.elapsed()
        );
        Ok(text)
    }
}
