//! Response formatting pipeline for model output.
//!
//! Turns the raw text of a finished answer into an ordered list of prose and
//! code blocks: preprocessing, markdown normalization, fence repair, and
//! segmentation with heuristic code detection. Every pass is a pure function
//! of its input.

pub mod block;
pub mod code_block;
pub mod error;
pub mod fence;
pub mod language;
pub mod markup;
pub mod pipeline;
pub mod preprocess;
pub mod renderer;
pub mod segment;

pub use block::{BlockKind, ContentBlock};
pub use error::FormatError;
pub use fence::repair_fences;
pub use language::{Language, detect_language};
pub use markup::normalize_markdown;
pub use pipeline::{FormatOptions, Normalized, normalize, normalize_with, render_blocks};
pub use preprocess::{convert_underline_headers, preprocess};
pub use renderer::Renderer;
pub use segment::{segment, segment_with};
