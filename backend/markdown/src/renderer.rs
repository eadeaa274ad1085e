//! Block renderers
//!
//! Turns a block sequence back into markdown, plain text, or ANSI-styled
//! terminal text. Code blocks are always emitted literally.

use pulldown_cmark::{Event, Parser, Tag};

use crate::block::ContentBlock;

const BOLD: &str = "\x1b[1m";
const NO_BOLD: &str = "\x1b[22m";
const ITALIC: &str = "\x1b[3m";
const NO_ITALIC: &str = "\x1b[23m";
const UNDERLINE: &str = "\x1b[4m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

pub struct Renderer;

impl Renderer {
    /// Re-assembles blocks into markdown, code blocks fenced with their tag.
    pub fn to_markdown(blocks: &[ContentBlock]) -> String {
        blocks
            .iter()
            .map(|block| match block {
                ContentBlock::Text { content } => content.clone(),
                ContentBlock::Code { content, language } => {
                    format!("```{language}\n{content}\n```")
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Strips prose markup. Suitable for speech or clipboard output.
    pub fn to_plain_text(blocks: &[ContentBlock]) -> String {
        blocks
            .iter()
            .map(|block| match block {
                ContentBlock::Text { content } => strip_markup(content),
                ContentBlock::Code { content, .. } => content.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Renders blocks for a terminal.
    pub fn to_ansi(blocks: &[ContentBlock]) -> String {
        blocks
            .iter()
            .map(|block| match block {
                ContentBlock::Text { content } => style_prose(content),
                ContentBlock::Code { content, language } => {
                    format!("{DIM}[{language}]{RESET}\n{CYAN}{content}{RESET}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn strip_markup(text: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(text) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::Item | Tag::CodeBlock(_)) => {
                out.push('\n')
            }
            _ => {}
        }
    }
    out.trim_end().to_string()
}

fn style_prose(text: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::Heading(..)) => {
                out.push_str(BOLD);
                out.push_str(UNDERLINE);
            }
            Event::End(Tag::Heading(..)) => {
                out.push_str(RESET);
                out.push('\n');
            }
            Event::Start(Tag::Strong) => out.push_str(BOLD),
            Event::End(Tag::Strong) => out.push_str(NO_BOLD),
            Event::Start(Tag::Emphasis) => out.push_str(ITALIC),
            Event::End(Tag::Emphasis) => out.push_str(NO_ITALIC),
            Event::Start(Tag::Item) => out.push_str("  • "),
            Event::End(Tag::Paragraph | Tag::Item | Tag::CodeBlock(_)) => out.push('\n'),
            Event::End(Tag::Link(_, url, _)) => {
                out.push_str(&format!(" {DIM}({url}){RESET}"));
            }
            Event::Text(t) => out.push_str(&t),
            Event::Code(t) => out.push_str(&format!("{CYAN}{t}{RESET}")),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Rule => out.push_str("────────\n"),
            _ => {}
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ContentBlock> {
        vec![
            ContentBlock::text("# Title\n\nSome **bold** and `code`."),
            ContentBlock::code("x = a * b * c", "python"),
        ]
    }

    #[test]
    fn test_to_markdown() {
        let blocks = vec![
            ContentBlock::text("A"),
            ContentBlock::code("x = 1", "python"),
            ContentBlock::text("B"),
        ];
        assert_eq!(Renderer::to_markdown(&blocks), "A\n\n```python\nx = 1\n```\n\nB");
        assert_eq!(Renderer::to_markdown(&[ContentBlock::text("*as is*")]), "*as is*");
    }

    #[test]
    fn test_to_plain_text() {
        assert_eq!(
            Renderer::to_plain_text(&sample()),
            "Title\nSome bold and code.\n\nx = a * b * c"
        );
        assert_eq!(
            Renderer::to_plain_text(&[ContentBlock::text("- one\n- two")]),
            "one\ntwo"
        );
    }

    #[test]
    fn test_to_ansi_styles_prose_only() {
        let out = Renderer::to_ansi(&sample());
        assert!(out.contains("\x1b[1mbold\x1b[22m"));
        assert!(out.contains("x = a * b * c"));
        assert!(out.contains("[python]"));
    }
}
