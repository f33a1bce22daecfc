//! Text normalisation: deterministic cleanup of raw OCR output.
//!
//! deepseek-ocr interleaves its transcription with grounding lines such as
//! `<|ref|>title<|/ref|><|det|>[[61, 40, 930, 88]]<|/det|>` and renders
//! footnote references in a handful of broken LaTeX-ish shapes:
//! `(^26)`, `(^{26})`, `\(^26\)`, `( ^ { 26 } )`. This module removes the
//! former and rewrites the latter into Markdown footnote references
//! (`[^26]`).
//!
//! Every rule is a pure `&str → String` function and the composition is
//! idempotent: normalising already-normalised text changes nothing.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Prefix of the backend's control-marker lines.
pub const CONTROL_MARKER: &str = "<|";

/// Apply all normalisation rules to raw OCR output.
///
/// Rules (applied in order):
/// 1. Trim trailing whitespace per line
/// 2. Drop lines starting with [`CONTROL_MARKER`] (blank lines are kept)
/// 3. Trim the whole text, also dropping control lines the trim left-aligns
/// 4. Rewrite citation markers to `[^id]`
pub fn normalize_text(raw: &str) -> String {
    let s = strip_control_lines(raw);
    fix_citations(trim_leading_control_lines(s.trim()))
}

// ── Rules 1–2: per-line cleanup ──────────────────────────────────────────────

fn strip_control_lines(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.starts_with(CONTROL_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 3: Whole-text trim ──────────────────────────────────────────────────

/// Trimming moves the first line to column 0, so an indented marker there
/// becomes a control line. Drop such lines until the text starts with content.
fn trim_leading_control_lines(mut s: &str) -> &str {
    loop {
        s = s.trim_start();
        if !s.starts_with(CONTROL_MARKER) {
            return s;
        }
        s = s.find('\n').map_or("", |i| &s[i..]);
    }
}

// ── Rule 4: Citation markers ─────────────────────────────────────────────────

static RE_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\?\(\s*\^\s*\{?\s*([a-zA-Z0-9+\s]+)\s*\}?\s*\\?\)").unwrap()
});

/// Rewrite footnote-style citation markers into `[^id]`.
///
/// Tolerates a leading/trailing backslash, missing braces and whitespace at
/// any position. The identifier's surrounding whitespace is trimmed; internal
/// whitespace is kept. A marker whose identifier is blank (e.g. `( ^ )`) is
/// left untouched rather than rewritten to an empty `[^ ]` reference.
pub fn fix_citations(text: &str) -> String {
    RE_CITATION
        .replace_all(text, |caps: &Captures<'_>| {
            let id = caps[1].trim();
            if id.is_empty() {
                caps[0].to_string()
            } else {
                format!("[^{}]", id)
            }
        })
        .into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_variants() {
        for input in ["(^26)", "(^{26})", "(^ { 26 } )", r"\(^26\)", r"\( ^{26} \)"] {
            assert_eq!(fix_citations(input), "[^26]", "input: {input:?}");
        }
    }

    #[test]
    fn test_citation_inside_prose() {
        assert_eq!(
            fix_citations("as shown earlier (^{3}) and later (^a1)."),
            "as shown earlier [^3] and later [^a1]."
        );
    }

    #[test]
    fn test_citation_internal_whitespace_kept() {
        assert_eq!(fix_citations("(^ 12 b )"), "[^12 b]");
    }

    #[test]
    fn test_blank_citation_untouched() {
        assert_eq!(fix_citations("( ^ )"), "( ^ )");
        assert_eq!(fix_citations("(^ \n )"), "(^ \n )");
    }

    #[test]
    fn test_plain_parentheses_untouched() {
        let input = "f(x) = (a + b) and [^1] stays";
        assert_eq!(fix_citations(input), input);
    }

    #[test]
    fn test_control_line_dropped_entirely() {
        assert_eq!(normalize_text("<|foo|>bar\nkept"), "kept");
    }

    #[test]
    fn test_mid_line_marker_kept() {
        assert_eq!(normalize_text("text<|mid|>"), "text<|mid|>");
    }

    #[test]
    fn test_blank_lines_preserved_as_separators() {
        let raw = "<|ref|>title<|/ref|><|det|>[[1, 2, 3, 4]]<|/det|>\n# Title   \n\n\nBody (^1)\n";
        assert_eq!(normalize_text(raw), "# Title\n\n\nBody [^1]");
    }

    #[test]
    fn test_indented_marker_on_first_line_dropped() {
        assert_eq!(normalize_text("  <|ref|>title\nbody"), "body");
        assert_eq!(normalize_text("\n \n  <|a|>\n  <|b|>\nx"), "x");
        assert_eq!(normalize_text("  <|only|>"), "");
        assert_eq!(normalize_text("body\n  <|kept|>"), "body\n  <|kept|>");
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(normalize_text("a  \r\n<|x|>\r\nb"), "a\nb");
    }

    #[test]
    fn test_whole_text_trimmed() {
        assert_eq!(normalize_text("\n\n  Hello\n\n(^1)\n\n"), "Hello\n\n[^1]");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "<|ref|>Hello\n\n(^1)",
            "  leading\n<|det|>[[0]]\n(^ { 26 } ) tail   \n\n",
            r"\(^{a b}\) and ((^7)) and (^(^2))",
            "( ^ ) empty ( ^\n3 )",
            "",
            "text<|mid|>\n\n\n",
            "  <|ref|>title\nbody",
            "\n \n  <|a|>\n  <|b|>\nx",
            "  <|only|>",
        ];
        for s in samples {
            let once = normalize_text(s);
            assert_eq!(normalize_text(&once), once, "not idempotent for {s:?}");
            assert_eq!(fix_citations(&once), once, "citation pass changed {s:?}");
        }
    }
}
