//! Cleanup of raw model output before markdown normalization.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::code_block::{is_fence, map_prose_lines, parse_fence};

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:思考[:：]|回答[:：]|thinking:|response:|answer:)\s*").unwrap()
});

static ESCAPED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\([\\*_`\[\]()])").unwrap());

static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").unwrap());

/// Repeated wrapper/label removal stops after this many rounds.
const MAX_UNWRAP_ROUNDS: usize = 8;

/// Cleans raw model output. Missing input yields an empty string.
pub fn preprocess<'a>(input: impl Into<Option<&'a str>>) -> String {
    let Some(raw) = input.into() else {
        return String::new();
    };
    let text = normalize_line_endings(raw);
    let text = unescape_fence_lines(&text);
    let text = strip_wrappers(&text);
    let text = unescape_markdown(&text);
    let text = collapse_whitespace(&text);
    let text = convert_underline_headers(&text);
    let text = pad_fences(&text);
    text.trim().to_string()
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strips an outer fence pair and leading role labels until neither applies.
fn strip_wrappers(text: &str) -> String {
    let mut current = text.trim().to_string();
    for _ in 0..MAX_UNWRAP_ROUNDS {
        let unfenced = strip_outer_fence(&current);
        let next = LABEL_RE.replace(unfenced.trim(), "").trim().to_string();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Removes a fence line that opens the whole text and the fence that closes
/// it. As in fence repair, any fence line closes an open fence, tagged or
/// not. A text whose opening fence is never closed loses the opener.
fn strip_outer_fence(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    if !is_fence(lines[0]) {
        return text.to_string();
    }
    let rest = &lines[1..];
    if !rest.iter().any(|l| is_fence(l)) {
        return rest.join("\n");
    }
    let Some((last, interior)) = rest.split_last() else {
        return text.to_string();
    };
    if is_fence(last) && wraps_cleanly(interior) {
        return interior.join("\n");
    }
    text.to_string()
}

/// True when every fence inside a candidate wrapper pairs up without ever
/// closing the wrapper itself.
fn wraps_cleanly(interior: &[&str]) -> bool {
    let mut inside = false;
    for line in interior {
        match parse_fence(line) {
            Some(_) if inside => inside = false,
            Some("") => return false,
            Some(_) => inside = true,
            None => {}
        }
    }
    !inside
}

/// Unescapes `\`\`\`` lines outside code so escaped wrappers and blocks are
/// seen as fences by every later step.
fn unescape_fence_lines(text: &str) -> String {
    map_prose_lines(text, |line| {
        if !line.contains("\\`") {
            return line.to_string();
        }
        let unescaped = ESCAPED_RE.replace_all(line, "$1");
        if is_fence(&unescaped) {
            unescaped.into_owned()
        } else {
            line.to_string()
        }
    })
}

/// Drops backslashes in front of markdown punctuation. `\\` is kept as-is.
fn unescape_markdown(text: &str) -> String {
    map_prose_lines(text, |line| {
        ESCAPED_RE
            .replace_all(line, |caps: &Captures| match &caps[1] {
                "\\" => "\\\\".to_string(),
                other => other.to_string(),
            })
            .into_owned()
    })
}

/// Collapses runs of blank lines to one and inner runs of spaces/tabs to a
/// single space. Leading indentation and fenced code are preserved.
fn collapse_whitespace(text: &str) -> String {
    let collapsed = map_prose_lines(text, |line| {
        let body_start = line.len() - line.trim_start().len();
        let (indent, body) = line.split_at(body_start);
        format!("{indent}{}", SPACE_RUN_RE.replace_all(body, " "))
    });

    let mut out: Vec<&str> = Vec::new();
    let mut inside = false;
    for line in collapsed.split('\n') {
        if is_fence(line) {
            inside = !inside;
        } else if !inside && line.trim().is_empty() {
            if out.last().is_some_and(|prev| prev.is_empty()) {
                continue;
            }
            out.push("");
            continue;
        }
        out.push(line);
    }
    out.join("\n")
}

/// Turns `Title` + `====` into `# Title` and `Title` + `----` into `## Title`.
pub fn convert_underline_headers(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut inside = false;
    let mut prev_is_prose = false;
    for line in text.split('\n') {
        if is_fence(line) {
            inside = !inside;
            prev_is_prose = false;
            out.push(line.to_string());
            continue;
        }
        if inside {
            out.push(line.to_string());
            continue;
        }
        if prev_is_prose {
            if let Some(level) = underline_level(line) {
                if let Some(title) = out.pop() {
                    out.push(format!("{} {}", "#".repeat(level), title.trim()));
                }
                prev_is_prose = false;
                continue;
            }
        }
        let trimmed = line.trim();
        prev_is_prose = !trimmed.is_empty()
            && !trimmed.starts_with('#')
            && !LIST_ITEM_RE.is_match(line)
            && underline_level(line).is_none();
        out.push(line.to_string());
    }
    out.join("\n")
}

fn underline_level(line: &str) -> Option<usize> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.chars().all(|c| c == '=') {
        Some(1)
    } else if trimmed.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

/// Puts a blank line between fence delimiters and adjacent prose.
fn pad_fences(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut inside = false;
    for (i, &line) in lines.iter().enumerate() {
        if !is_fence(line) {
            out.push(line);
            continue;
        }
        if inside {
            out.push(line);
            let next_is_prose = lines.get(i + 1).is_some_and(|next| !next.trim().is_empty());
            if next_is_prose {
                out.push("");
            }
        } else {
            if out.last().is_some_and(|prev| !prev.trim().is_empty()) {
                out.push("");
            }
            out.push(line);
        }
        inside = !inside;
    }
    out.join("\n")
}
