//! Whole-document translation of a Markdown file.
//!
//! Independent of the page pipeline: one file in, one sibling file out
//! (`book.md` → `book.es.md`), translated in a single backend call.

use crate::config::TranslationConfig;
use crate::error::Ocr2MdError;
use crate::layout::write_atomic;
use crate::pipeline::translate::{OllamaTranslator, Translator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Translate the Markdown file at `path` and write `<stem>.<code>.md` beside it.
///
/// Returns the path of the translated file.
///
/// # Errors
/// - `InvalidInput` if the path does not end in `.md`; nothing is written.
/// - `FileNotFound` if it does not exist.
/// - `TranslationFailed` if the backend fails.
pub async fn translate_file(
    path: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<PathBuf, Ocr2MdError> {
    let path = validate_markdown(path.as_ref())?;
    let start = Instant::now();

    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| Ocr2MdError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;

    info!(
        "Translating {} from {} to {}",
        path.display(),
        config.source_language,
        config.target_language
    );

    let translator: Arc<dyn Translator> = match config.translator {
        Some(ref t) => Arc::clone(t),
        None => Arc::new(OllamaTranslator::new(&config.ollama_bin, &config.model)),
    };
    let translated = translator
        .translate(&text, &config.source_language, &config.target_language)
        .await?;

    let out_path = translated_path(&path, &config.target_language.code);
    write_atomic(&out_path, &translated).await?;

    info!(
        "Translation saved → {} ({}ms)",
        out_path.display(),
        start.elapsed().as_millis()
    );
    Ok(out_path)
}

/// `dir/book.md` → `dir/book.<code>.md`.
pub fn translated_path(path: &Path, code: &str) -> PathBuf {
    path.with_extension(format!("{code}.md"))
}

fn validate_markdown(path: &Path) -> Result<PathBuf, Ocr2MdError> {
    let is_md = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"));
    if !is_md {
        return Err(Ocr2MdError::InvalidInput {
            path: path.to_path_buf(),
            expected: "md",
        });
    }
    if !path.is_file() {
        return Err(Ocr2MdError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Upper-cases the text and remembers the languages it was asked for.
    #[derive(Default)]
    struct ShoutingTranslator {
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Translator for ShoutingTranslator {
        async fn translate(
            &self,
            text: &str,
            source: &Language,
            target: &Language,
        ) -> Result<String, Ocr2MdError> {
            self.seen
                .lock()
                .unwrap()
                .push((source.code.clone(), target.code.clone()));
            Ok(text.to_uppercase())
        }
    }

    struct BrokenTranslator;

    #[async_trait]
    impl Translator for BrokenTranslator {
        async fn translate(
            &self,
            _text: &str,
            _source: &Language,
            _target: &Language,
        ) -> Result<String, Ocr2MdError> {
            Err(Ocr2MdError::TranslationFailed {
                detail: "model not found".into(),
            })
        }
    }

    #[test]
    fn translated_path_inserts_code() {
        assert_eq!(
            translated_path(Path::new("/b/book.md"), "es"),
            Path::new("/b/book.es.md")
        );
        assert_eq!(
            translated_path(Path::new("notes.MD"), "fr"),
            Path::new("notes.fr.md")
        );
    }

    #[tokio::test]
    async fn writes_sibling_file_with_target_code() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.md");
        std::fs::write(&input, "hello [^1]").unwrap();

        let translator = Arc::new(ShoutingTranslator::default());
        let config = TranslationConfig {
            target_language: Language::new("German", "de"),
            translator: Some(translator.clone()),
            ..Default::default()
        };

        let out = translate_file(&input, &config).await.unwrap();
        assert_eq!(out, dir.path().join("book.de.md"));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "HELLO [^1]");
        assert_eq!(
            *translator.seen.lock().unwrap(),
            vec![("en".to_string(), "de".to_string())]
        );
    }

    #[tokio::test]
    async fn rejects_non_markdown_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.txt");
        std::fs::write(&input, "hello").unwrap();

        let config = TranslationConfig {
            translator: Some(Arc::new(ShoutingTranslator::default())),
            ..Default::default()
        };
        let err = translate_file(&input, &config).await.unwrap_err();
        assert!(matches!(err, Ocr2MdError::InvalidInput { expected: "md", .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = translate_file(dir.path().join("gone.md"), &TranslationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Ocr2MdError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn backend_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.md");
        std::fs::write(&input, "hello").unwrap();

        let config = TranslationConfig {
            translator: Some(Arc::new(BrokenTranslator)),
            ..Default::default()
        };
        let err = translate_file(&input, &config).await.unwrap_err();
        assert!(matches!(err, Ocr2MdError::TranslationFailed { .. }));
        assert!(!dir.path().join("book.es.md").exists());
    }
}
