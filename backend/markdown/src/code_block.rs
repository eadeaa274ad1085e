//! Code Block Line Utilities
//!
//! Fence-marker parsing and the line-level "looks like code" tests shared by
//! segmentation and the whole-text code heuristic.

use regex::Regex;
use std::sync::LazyLock;

/// Lines that may open an implicit code run.
static CODE_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?:",
        r"#(?:include|define|import|pragma|ifn?def|endif)\b|#!",
        r"|using\s+namespace\b|int\s+main\b",
        r"|(?:function|class|def|var|let|const|public|private|protected|package|import|export|fn|func|struct|impl|template)\b",
        r"|//|/\*|<\?|<!DOCTYPE|</?[A-Za-z][\w-]*(?:\s|>|/)",
        r"|cout\b|printf\b|System\.out|console\.log",
        r"|[{}\[\]()]+[;,]?\s*$",
        r")"
    ))
    .unwrap()
});

/// Lines that keep an implicit code run going once it has started.
static CODE_CONTINUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?:",
        r"\w+\s+\*?\w+\s*\(",
        r"|[\w.]+(?:::\w+)*\s*\(.*\)\s*;?\s*$",
        r"|[\w.\[\]]+\s*[-+*/%]?=\s*\S",
        r"|(?:return|if|else|for|while|switch|case|break|continue|try|catch|finally|throw|async|await|static|from|require|module\.exports|std::|typename|echo|elif)\b",
        r"|\.\w+\(|=>|\$\s|\+\+|--\s|#[A-Za-z!]",
        r"|.*[;{}]\s*$",
        r")"
    ))
    .unwrap()
});

static INDENTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?: {4,}|\t)").unwrap());

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?://|/\*)|^\s+(?:\*|#)").unwrap());

/// Parses a fence-marker line and returns its info string (`""` when bare).
///
/// A fence is a line whose trimmed text starts with three backticks and has
/// no further backticks after the opening run.
pub fn parse_fence(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if !trimmed.starts_with("```") {
        return None;
    }
    let info = trimmed.trim_start_matches('`');
    if info.contains('`') {
        return None;
    }
    Some(info.trim())
}

pub fn is_fence(line: &str) -> bool {
    parse_fence(line).is_some()
}

/// Reduces a fence info string to a language tag (`[a-zA-Z0-9+#-]`), `text` if empty.
pub fn sanitize_language(info: &str) -> String {
    let word = info.split_whitespace().next().unwrap_or("");
    let tag: String = word
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-'))
        .collect();
    if tag.is_empty() {
        "text".to_string()
    } else {
        tag
    }
}

/// Whether a line can open an implicit code block.
pub fn looks_like_code_start(line: &str) -> bool {
    !is_fence(line) && CODE_START_RE.is_match(line)
}

/// Whether a line looks like code when it follows other code.
pub fn looks_like_code_line(line: &str) -> bool {
    looks_like_code_start(line) || (!is_fence(line) && CODE_CONTINUE_RE.is_match(line))
}

/// Indented or comment lines that belong to a preceding code line.
pub fn is_code_continuation(line: &str) -> bool {
    INDENTED_RE.is_match(line) || COMMENT_RE.is_match(line)
}

/// Applies `f` to every line outside fenced code, leaving fence lines and
/// fenced content untouched.
pub(crate) fn map_prose_lines(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut inside = false;
    let mut out = Vec::new();
    for line in text.split('\n') {
        if is_fence(line) {
            inside = !inside;
            out.push(line.to_string());
        } else if inside {
            out.push(line.to_string());
        } else {
            out.push(f(line));
        }
    }
    out.join("\n")
}

/// Applies `f` to the parts of a line outside inline code spans.
pub(crate) fn map_outside_inline_code(line: &str, mut f: impl FnMut(&str) -> String) -> String {
    if !line.contains('`') {
        return f(line);
    }
    line.split('`')
        .enumerate()
        .map(|(i, part)| if i % 2 == 0 { f(part) } else { part.to_string() })
        .collect::<Vec<_>>()
        .join("`")
}
