//! Segmentation of normalized text into prose and code blocks.
//!
//! Explicit fences toggle code mode. Outside fences, a line that looks like
//! code at the start of a fresh prose block opens a lookahead window; if the
//! window holds enough code-like text it becomes an implicit code block with a
//! classified language.

use crate::block::ContentBlock;
use crate::code_block::{
    is_code_continuation, is_fence, looks_like_code_line, looks_like_code_start, parse_fence,
    sanitize_language,
};
use crate::language::detect_language;
use crate::pipeline::FormatOptions;

/// Segments text with the default heuristics.
pub fn segment<'a>(input: impl Into<Option<&'a str>>) -> Vec<ContentBlock> {
    segment_with(input, &FormatOptions::default())
}

/// Segments text into an ordered block sequence. Never empty: input that
/// yields no blocks comes back as a single text block holding the input.
pub fn segment_with<'a>(input: impl Into<Option<&'a str>>, opts: &FormatOptions) -> Vec<ContentBlock> {
    let original = input.into().unwrap_or("");
    let lines: Vec<&str> = original.split('\n').collect();

    let mut blocks = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    // Language and body of the fence currently open.
    let mut fenced: Option<(String, Vec<&str>)> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(info) = parse_fence(line) {
            match fenced.take() {
                Some((language, body)) => push_code(&mut blocks, &body, language),
                None => {
                    flush_prose(&mut prose, &mut blocks);
                    fenced = Some((sanitize_language(info), Vec::new()));
                }
            }
            i += 1;
            continue;
        }

        if let Some((_, body)) = fenced.as_mut() {
            body.push(line);
            i += 1;
            continue;
        }

        let fresh_block = prose.iter().all(|l| l.trim().is_empty());
        if fresh_block && looks_like_code_start(line) {
            if let Some(end) = scan_implicit_code(&lines, i, opts) {
                prose.clear();
                let code = lines[i..end].join("\n");
                let language = detect_language(&code);
                blocks.push(ContentBlock::code(code, language.as_str()));
                i = end;
                continue;
            }
        }

        prose.push(line);
        i += 1;
    }

    if let Some((language, body)) = fenced {
        push_code(&mut blocks, &body, language);
    }
    flush_prose(&mut prose, &mut blocks);

    if blocks.is_empty() {
        blocks.push(ContentBlock::text(original));
    }
    blocks
}

fn flush_prose(prose: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
    let text = prose.join("\n");
    prose.clear();
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(ContentBlock::text(text));
    }
}

fn push_code(blocks: &mut Vec<ContentBlock>, body: &[&str], language: String) {
    if body.iter().any(|l| !l.trim().is_empty()) {
        blocks.push(ContentBlock::code(body.join("\n"), language));
    }
}

/// Returns the exclusive end of an implicit code run starting at `start`, or
/// `None` when the run is too thin to count as code.
fn scan_implicit_code(lines: &[&str], start: usize, opts: &FormatOptions) -> Option<usize> {
    let mut end = start;
    let mut code_lines = 0usize;
    let mut blank_run = 0usize;

    for (j, line) in lines.iter().enumerate().skip(start).take(opts.lookahead_lines) {
        if is_fence(line) {
            break;
        }
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > opts.max_blank_run {
                break;
            }
            continue;
        }
        blank_run = 0;
        if looks_like_code_line(line) {
            code_lines += 1;
        } else if !(code_lines > 0 && is_code_continuation(line)) {
            break;
        }
        end = j + 1;
    }

    let chars = lines[start..end].concat().trim().chars().count();
    (code_lines >= 1 && chars > opts.min_code_chars).then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_round_trip() {
        assert_eq!(
            segment("A\n```python\nprint(1)\n```\nB"),
            vec![
                ContentBlock::text("A"),
                ContentBlock::code("print(1)", "python"),
                ContentBlock::text("B"),
            ]
        );
    }

    #[test]
    fn test_implicit_cpp_detection() {
        assert_eq!(
            segment("#include <iostream>\nint main(){return 0;}"),
            vec![ContentBlock::code("#include <iostream>\nint main(){return 0;}", "cpp")]
        );
    }

    #[test]
    fn test_implicit_code_then_prose() {
        let blocks = segment("def add(a, b):\n    return a + b\n\nThat adds numbers.");
        assert_eq!(
            blocks,
            vec![
                ContentBlock::code("def add(a, b):\n    return a + b", "python"),
                ContentBlock::text("That adds numbers."),
            ]
        );
    }

    #[test]
    fn test_code_like_line_inside_prose_stays_prose() {
        let text = "Use this:\nconst x = 1;";
        assert_eq!(segment(text), vec![ContentBlock::text(text)]);
    }

    #[test]
    fn test_short_code_run_stays_prose() {
        assert_eq!(segment("let x;"), vec![ContentBlock::text("let x;")]);
    }

    #[test]
    fn test_lookahead_window_is_tunable() {
        let text = "const a = 1;\nconst b = 2;\nconst c = 3;";
        assert_eq!(segment(text), vec![ContentBlock::code(text, "javascript")]);

        let opts = FormatOptions {
            lookahead_lines: 1,
            ..FormatOptions::default()
        };
        let blocks = segment_with(text, &opts);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], ContentBlock::code("const a = 1;", "javascript"));
        assert!(blocks.iter().all(ContentBlock::is_code));
    }

    #[test]
    fn test_unterminated_fence_is_flushed() {
        assert_eq!(
            segment("Intro\n```rust\nfn main() {}"),
            vec![ContentBlock::text("Intro"), ContentBlock::code("fn main() {}", "rust")]
        );
    }

    #[test]
    fn test_fence_language_is_sanitized() {
        let blocks = segment("```{.c++}\nint x;\n```");
        assert_eq!(blocks, vec![ContentBlock::code("int x;", "c++")]);
        let blocks = segment("```\nplain\n```");
        assert_eq!(blocks[0].language(), Some("text"));
    }

    #[test]
    fn test_empty_input_safety() {
        assert_eq!(segment(None), vec![ContentBlock::text("")]);
        assert_eq!(segment(""), vec![ContentBlock::text("")]);
        assert_eq!(segment("  \n "), vec![ContentBlock::text("  \n ")]);
        assert_eq!(segment("```\n```"), vec![ContentBlock::text("```\n```")]);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let text = "Intro\n```js\nlet a = 1;\n```\n#include <stdio.h>\nmore";
        assert_eq!(segment(text), segment(text));
    }
}
