//! Normalization orchestrator.
//!
//! Runs preprocessing, markdown normalization, fence repair and a second
//! underline-header pass, then wraps text that is code as a whole in a single
//! fence. Failures come back as [`Normalized::Fallback`] carrying the input.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::block::ContentBlock;
use crate::code_block::{is_fence, looks_like_code_start};
use crate::error::FormatError;
use crate::fence::{count_fences, repair_fences};
use crate::language::detect_language;
use crate::markup::normalize_markdown;
use crate::preprocess::{convert_underline_headers, preprocess};
use crate::segment::segment_with;

static STRUCTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:#{1,6}\s|>|\s*[-*+]\s|\s*\d+\.\s)").unwrap());

/// Tunable heuristics for normalization and segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatOptions {
    /// Lines scanned when probing for an implicit code block.
    pub lookahead_lines: usize,
    /// Consecutive blank lines tolerated inside an implicit code block.
    pub max_blank_run: usize,
    /// An implicit code block must hold more characters than this.
    pub min_code_chars: usize,
    /// Share of code-like lines above which unstructured text is wrapped whole.
    pub code_ratio_threshold: f64,
    pub max_input_bytes: Option<usize>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            lookahead_lines: 20,
            max_blank_run: 2,
            min_code_chars: 10,
            code_ratio_threshold: 0.6,
            max_input_bytes: Some(1 << 20),
        }
    }
}

/// Outcome of [`normalize`]. A fallback still carries displayable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Formatted(String),
    Fallback { original: String, reason: FormatError },
}

impl Normalized {
    pub fn text(&self) -> &str {
        match self {
            Normalized::Formatted(text) => text,
            Normalized::Fallback { original, .. } => original,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Normalized::Formatted(text) => text,
            Normalized::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Normalized::Fallback { .. })
    }
}

pub fn normalize<'a>(input: impl Into<Option<&'a str>>) -> Normalized {
    normalize_with(input, &FormatOptions::default())
}

pub fn normalize_with<'a>(input: impl Into<Option<&'a str>>, opts: &FormatOptions) -> Normalized {
    let Some(text) = input.into() else {
        return Normalized::Formatted(String::new());
    };
    match try_normalize(text, opts) {
        Ok(formatted) => Normalized::Formatted(formatted),
        Err(reason) => {
            warn!(error = %reason, len = text.len(), "Normalization failed, using raw text");
            Normalized::Fallback {
                original: text.to_string(),
                reason,
            }
        }
    }
}

/// Passes allowed before the output must be a fixed point of the pipeline.
const MAX_ROUNDS: usize = 4;

/// Runs the passes until the text stops changing, so the result is a fixed
/// point and normalizing it again returns it unchanged.
fn try_normalize(text: &str, opts: &FormatOptions) -> Result<String, FormatError> {
    if let Some(limit) = opts.max_input_bytes {
        if text.len() > limit {
            return Err(FormatError::InputTooLarge {
                len: text.len(),
                limit,
            });
        }
    }

    let mut current = normalize_once(text, opts)?;
    for _ in 1..MAX_ROUNDS {
        let next = normalize_once(&current, opts)?;
        if next == current {
            return Ok(current);
        }
        current = next;
    }
    Err(FormatError::Unstable { rounds: MAX_ROUNDS })
}

fn normalize_once(text: &str, opts: &FormatOptions) -> Result<String, FormatError> {
    let cleaned = preprocess(text);
    let styled = normalize_markdown(&cleaned);
    let repaired = repair_fences(&styled);
    let count = count_fences(&repaired);
    if count % 2 != 0 {
        return Err(FormatError::UnbalancedFences { count });
    }
    let headed = convert_underline_headers(&repaired);
    Ok(wrap_if_code(headed, opts))
}

/// Fences the whole text when it is unstructured and mostly code.
fn wrap_if_code(text: String, opts: &FormatOptions) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 3
        || lines.iter().any(|l| is_fence(l) || STRUCTURE_RE.is_match(l))
    {
        return text;
    }
    let code_like = lines.iter().filter(|l| looks_like_code_start(l)).count();
    let ratio = code_like as f64 / lines.len() as f64;
    if ratio <= opts.code_ratio_threshold {
        return text;
    }
    let language = detect_language(&text);
    debug!(%language, ratio, "Wrapping code-only response in a fence");
    format!("```{language}\n{text}\n```")
}

/// Normalizes and segments a response. A fallback becomes one text block
/// holding the raw input.
pub fn render_blocks<'a>(input: impl Into<Option<&'a str>>, opts: &FormatOptions) -> Vec<ContentBlock> {
    match normalize_with(input, opts) {
        Normalized::Formatted(text) => segment_with(text.as_str(), opts),
        Normalized::Fallback { original, .. } => vec![ContentBlock::text(original)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPP_ONLY: &str = "#include <iostream>\nint main() {\n  return 0;\n}";

    #[test]
    fn test_missing_input() {
        assert_eq!(normalize(None), Normalized::Formatted(String::new()));
        assert_eq!(normalize(""), Normalized::Formatted(String::new()));
    }

    #[test]
    fn test_code_only_text_is_wrapped() {
        let out = normalize(CPP_ONLY);
        assert_eq!(out.text(), format!("```cpp\n{CPP_ONLY}\n```"));
        assert_eq!(
            render_blocks(CPP_ONLY, &FormatOptions::default()),
            vec![ContentBlock::code(CPP_ONLY, "cpp")]
        );
    }

    #[test]
    fn test_structured_text_is_not_wrapped() {
        let text = "# Setup\nconst a = 1;\nconst b = 2;\nconst c = 3;";
        assert!(!normalize(text).text().starts_with("```"));
    }

    #[test]
    fn test_unclosed_fence_repaired() {
        let out = normalize("Intro\n```js\nlet a = 1;");
        assert_eq!(out.text(), "Intro\n\n```js\nlet a = 1;\n```");
        assert_eq!(
            render_blocks(out.text(), &FormatOptions::default()),
            vec![ContentBlock::text("Intro"), ContentBlock::code("let a = 1;", "js")]
        );
    }

    #[test]
    fn test_oversized_input_falls_back() {
        let opts = FormatOptions {
            max_input_bytes: Some(4),
            ..FormatOptions::default()
        };
        let out = normalize_with("hello *world*", &opts);
        assert!(out.is_fallback());
        assert_eq!(
            out,
            Normalized::Fallback {
                original: "hello *world*".to_string(),
                reason: FormatError::InputTooLarge { len: 13, limit: 4 },
            }
        );
        assert_eq!(
            render_blocks("hello *world*", &opts),
            vec![ContentBlock::text("hello *world*")]
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "Answer: Here is code\n```python\nprint(1)\n```\nDone.",
            "Title\n=====\nSome *em* text\n- a\n- b",
            CPP_ONLY,
            "a  b\n\n\n\nc",
            "Intro\n```js\nlet a = 1;",
            "```markdown\n## Example\nUse ***this***.\n```",
            "## Example ##\nSee below.",
            "## Code # ",
            "```js\nlet a = 1;\n```js",
            "\\`\\`\\`python\nx=1\n\\`\\`\\`",
            "```\n```py> ",
            "Answer:```\n\n```py",
        ] {
            let once = normalize(input).into_text();
            assert_eq!(normalize(once.as_str()).into_text(), once, "{input:?}");
        }
    }

    /// Deterministic xorshift so generated inputs are the same on every run.
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
            items[(self.next() % items.len() as u64) as usize]
        }
    }

    const ATOMS: &[&str] = &[
        "```", "```py", "```js ", "\\`\\`\\`", "\n", "\n\n", "\n\n\n", "## ", "# ", " ##",
        "Example", "Code:", "Answer:", "Response: ", "***x***", "__y__", "*z*", "_w_", "- item",
        "1. step", "Title\n===", "Sub\n---", "#include <stdio.h>", "int main() {", "}",
        "def f():", "    return 1", "let a = 1;", "plain words", "  ", "\\*", "`code`", ">",
    ];

    #[test]
    fn test_generated_inputs_are_idempotent() {
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
        for case in 0..3000 {
            let len = 1 + (rng.next() % 12) as usize;
            let input: String = (0..len).map(|_| rng.pick(ATOMS)).collect();
            let once = normalize(input.as_str());
            let twice = normalize(once.text());
            assert_eq!(twice.text(), once.text(), "case {case}: {input:?}");
        }
    }

    #[test]
    fn test_label_heading_with_closing_hashes() {
        assert_eq!(normalize("## Example ##\nSee below.").text(), "### Example:\n\nSee below.");
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let opts: FormatOptions =
            serde_json::from_str(r#"{"lookaheadLines": 5, "maxInputBytes": null}"#).unwrap();
        assert_eq!(opts.lookahead_lines, 5);
        assert_eq!(opts.max_blank_run, 2);
        assert_eq!(opts.max_input_bytes, None);
    }
}
