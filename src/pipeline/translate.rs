//! Translation backend: whole-document text in, translated text out.

use crate::config::Language;
use crate::error::Ocr2MdError;
use crate::pipeline::process::{failure_detail, run_captured};
use crate::prompts::translation_prompt;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Translates a complete document in one call.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &Language,
        target: &Language,
    ) -> Result<String, Ocr2MdError>;
}

/// [`Translator`] that pipes the translation prompt into `ollama run <model>`.
///
/// No timeout: a long book legitimately takes minutes.
#[derive(Debug, Clone)]
pub struct OllamaTranslator {
    binary: String,
    model: String,
}

impl OllamaTranslator {
    pub fn new(binary: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &Language,
        target: &Language,
    ) -> Result<String, Ocr2MdError> {
        let prompt = translation_prompt(source, target, text);
        debug!("Translation prompt: {} bytes", prompt.len());

        let mut cmd = Command::new(&self.binary);
        cmd.arg("run").arg(&self.model);

        let output = run_captured(cmd, Some(&prompt))
            .await
            .map_err(|e| Ocr2MdError::TranslationFailed {
                detail: format!("could not run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(Ocr2MdError::TranslationFailed {
                detail: failure_detail(&output),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
