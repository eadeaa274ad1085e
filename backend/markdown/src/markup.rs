//! Markdown style normalization.
//!
//! Emphasis markers are unified (`***x***`, `___x___` and `__x__` become
//! `**x**`, `*x*` becomes `_x_`), ad hoc section labels become level-3
//! headings, and headers and lists get blank-line separation. Fenced code and
//! inline code spans are never touched.

use regex::Regex;
use std::sync::LazyLock;

use crate::code_block::{is_fence, map_outside_inline_code, map_prose_lines};

static TRIPLE_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*([^*\n]+?)\*\*\*").unwrap());
static TRIPLE_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"___([^_\n]+?)___").unwrap());
static DOUBLE_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\W)__([^_\n]+?)__($|\W)").unwrap());
static SINGLE_STAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[\s(\[])\*([^*\s](?:[^*\n]*[^*\s])?)\*($|[\s.,;:!?)\]])").unwrap()
});

static SECTION_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{1,6}\s*(?i:(example|code|explanation|solution))\s*(?::\s*(.*?))?\s*$").unwrap()
});
static CLOSING_HASHES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}\s+.*?\S)\s+#+\s*$").unwrap());

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s+\S").unwrap());
static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+\S").unwrap());

/// Upper bound on emphasis rewrite rounds.
const MAX_EMPHASIS_ROUNDS: usize = 16;

/// Normalizes markdown markup. Applying it twice gives the same result as once.
pub fn normalize_markdown(text: &str) -> String {
    let restyled = map_prose_lines(text, |line| {
        let line = normalize_heading(line);
        map_outside_inline_code(&line, unify_emphasis)
    });
    separate_blocks(&restyled)
}

/// Drops closing hashes, then retitles section labels. Labels are matched
/// on the stripped line so `## Example ##` settles in one pass.
fn normalize_heading(line: &str) -> String {
    let line = CLOSING_HASHES_RE.replace(line, "$1");
    if let Some(caps) = SECTION_LABEL_RE.captures(&line) {
        let label = &caps[1];
        return match caps.get(2).map(|m| m.as_str()).filter(|rest| !rest.is_empty()) {
            Some(rest) => format!("### {label}: {rest}"),
            None => format!("### {label}:"),
        };
    }
    line.into_owned()
}

fn unify_emphasis(segment: &str) -> String {
    let mut current = segment.to_string();
    for _ in 0..MAX_EMPHASIS_ROUNDS {
        let next = TRIPLE_STAR_RE.replace_all(&current, "**$1**");
        let next = TRIPLE_UNDERSCORE_RE.replace_all(&next, "**$1**");
        let next = DOUBLE_UNDERSCORE_RE.replace_all(&next, "$1**$2**$3");
        let next = SINGLE_STAR_RE.replace_all(&next, "${1}_${2}_$3").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Start,
    Blank,
    Header,
    List,
    /// Indented line under a list item.
    Continuation,
    Fence,
    Code,
    Other,
}

fn needs_gap(last: LineKind, current: LineKind) -> bool {
    use LineKind::*;
    match (last, current) {
        (Start | Blank, _) | (_, Blank) => false,
        (Fence | Code, _) | (_, Fence | Code) => false,
        (Header, _) | (_, Header) => true,
        (List | Continuation, List | Continuation) => false,
        (_, List) | (List | Continuation, _) => true,
        _ => false,
    }
}

/// Inserts blank lines around headers and list runs.
fn separate_blocks(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut last = LineKind::Start;
    let mut inside = false;
    for line in text.split('\n') {
        let kind = if is_fence(line) {
            inside = !inside;
            LineKind::Fence
        } else if inside {
            LineKind::Code
        } else if line.trim().is_empty() {
            LineKind::Blank
        } else if HEADER_RE.is_match(line) {
            LineKind::Header
        } else if LIST_RE.is_match(line) {
            LineKind::List
        } else if matches!(last, LineKind::List | LineKind::Continuation)
            && line.starts_with(char::is_whitespace)
        {
            LineKind::Continuation
        } else {
            LineKind::Other
        };
        if needs_gap(last, kind) {
            out.push("");
        }
        out.push(line);
        last = kind;
    }
    out.join("\n")
}
