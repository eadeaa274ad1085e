//! Content blocks
//!
//! The unit the renderer consumes: a contiguous span of an answer that is
//! either prose or literal code.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Text,
    Code,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Markdown prose.
    Text { content: String },
    /// Literal code; the renderer must not escape or reformat it.
    Code { content: String, language: String },
}

impl ContentBlock {
    pub fn text(content: impl Into<String>) -> Self {
        ContentBlock::Text {
            content: content.into(),
        }
    }

    pub fn code(content: impl Into<String>, language: impl Into<String>) -> Self {
        ContentBlock::Code {
            content: content.into(),
            language: language.into(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            ContentBlock::Text { .. } => BlockKind::Text,
            ContentBlock::Code { .. } => BlockKind::Code,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ContentBlock::Text { content } | ContentBlock::Code { content, .. } => content,
        }
    }

    /// Language tag; only code blocks carry one.
    pub fn language(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { .. } => None,
            ContentBlock::Code { language, .. } => Some(language),
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind() == BlockKind::Code
    }
}
