//! `docsight render`: run a saved answer through the formatting pipeline.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use docsight_config::DocsightConfig;
use docsight_markdown::{render_blocks, ContentBlock, Renderer};

use crate::terminal_output::supports_color;

/// Output shape for rendered blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Json,
    Plain,
    Markdown,
    Ansi,
}

impl RenderFormat {
    pub fn pick(json: bool, plain: bool, color: bool) -> Self {
        match (json, plain, color) {
            (true, _, _) => RenderFormat::Json,
            (false, true, _) => RenderFormat::Plain,
            (false, false, true) => RenderFormat::Ansi,
            (false, false, false) => RenderFormat::Markdown,
        }
    }
}

pub async fn run(config: &DocsightConfig, file: Option<PathBuf>, json: bool, plain: bool) -> Result<()> {
    let input = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let blocks = render_blocks(input.as_str(), &config.format_options());
    let format = RenderFormat::pick(json, plain, supports_color());
    println!("{}", format_blocks(&blocks, format)?);
    Ok(())
}

pub fn format_blocks(blocks: &[ContentBlock], format: RenderFormat) -> Result<String> {
    Ok(match format {
        RenderFormat::Json => serde_json::to_string_pretty(blocks)?,
        RenderFormat::Plain => Renderer::to_plain_text(blocks),
        RenderFormat::Markdown => Renderer::to_markdown(blocks),
        RenderFormat::Ansi => Renderer::to_ansi(blocks),
    })
}
