//! Tests that drive the built binaries.
//!
//! External tools are replaced by small shell scripts passed through the
//! `--*-bin` flags, so these need a unix shell but no OCR model.

#![cfg(feature = "cli")]

use std::path::{Path, PathBuf};
use std::process::Command;

fn ocr2md() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ocr2md"))
}

fn md_translate() -> Command {
    Command::new(env!("CARGO_BIN_EXE_md-translate"))
}

#[cfg(unix)]
fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn ocr2md_rejects_non_pdf_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("book.txt");
    std::fs::write(&input, "x").unwrap();

    let out = ocr2md().arg(&input).arg("--no-progress").output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("pdf"));
    assert!(!dir.path().join("book").exists());
}

#[test]
fn ocr2md_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = ocr2md()
        .arg(dir.path().join("nope.pdf"))
        .arg("--no-progress")
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn ocr2md_rejects_unknown_format_token() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("book.pdf");
    std::fs::write(&pdf, b"%PDF").unwrap();

    let out = ocr2md().arg(&pdf).arg("docx").output().unwrap();
    assert!(!out.status.success());
    assert!(!dir.path().join("book").exists());
}

#[cfg(unix)]
#[test]
fn ocr2md_runs_against_stand_in_tools() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("book.pdf");
    std::fs::write(&pdf, b"%PDF").unwrap();

    // pdftoppm -png -r DPI PDF PREFIX
    let pdftoppm = script(dir.path(), "pdftoppm", r#": > "$5-1.png"; : > "$5-2.png""#);
    let ollama = script(
        dir.path(),
        "ollama",
        "cat > /dev/null\nprintf '<|det|>box\\nHello (^1)\\n'",
    );

    let out = ocr2md()
        .arg(&pdf)
        .args(["--no-progress", "--quiet"])
        .arg("--pdftoppm-bin")
        .arg(&pdftoppm)
        .arg("--ollama-bin")
        .arg(&ollama)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let text = dir.path().join("book/text");
    for page in ["page-001.txt", "page-002.txt"] {
        assert_eq!(
            std::fs::read_to_string(text.join(page)).unwrap(),
            "Hello [^1]"
        );
    }
    assert!(dir.path().join("book/state.json").exists());
}

#[test]
fn md_translate_rejects_non_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, "hello").unwrap();

    let out = md_translate().arg(&input).arg("--quiet").output().unwrap();
    assert!(!out.status.success());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[cfg(unix)]
#[test]
fn md_translate_writes_sibling_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("book.md");
    std::fs::write(&input, "hello").unwrap();
    let ollama = script(dir.path(), "ollama", "cat > /dev/null\necho '  hola  '");

    let out = md_translate()
        .arg(&input)
        .args(["--quiet", "--target", "French", "--target-code", "fr"])
        .arg("--ollama-bin")
        .arg(&ollama)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("book.fr.md")).unwrap(),
        "hola"
    );
}
