//! Prompts sent to the OCR and translation backends.
//!
//! Both backends read a single free-text prompt on standard input, so every
//! prompt lives here as a plain string builder that unit tests can inspect
//! without starting a model.

use crate::config::Language;
use std::path::Path;

/// Default directive following the image reference in the OCR prompt.
///
/// The `<|grounding|>` token switches deepseek-ocr into layout-aware mode;
/// its output then carries `<|ref|>`/`<|det|>` lines that the normaliser
/// strips.
pub const DEFAULT_OCR_DIRECTIVE: &str = "<|grounding|>Convert the document to markdown.";

/// Build the OCR prompt for one page image.
pub fn ocr_prompt(image: &Path, directive: Option<&str>) -> String {
    format!(
        "{}\n{}",
        image.display(),
        directive.unwrap_or(DEFAULT_OCR_DIRECTIVE)
    )
}

/// Build the translation prompt embedding both languages and the full text.
pub fn translation_prompt(source: &Language, target: &Language, text: &str) -> String {
    format!(
        "You are a professional {src} ({src_code}) to {tgt} ({tgt_code}) translator. \
Your goal is to accurately convey the meaning and nuances of the original {src} text \
while adhering to {tgt} grammar, vocabulary, and cultural sensitivities.\n\
Produce only the {tgt} translation, without any additional explanations or commentary. \
Please translate the following {src} text into {tgt}:\n\n\n{text}\n",
        src = source.name,
        src_code = source.code,
        tgt = target.name,
        tgt_code = target.code,
        text = text,
    )
}
