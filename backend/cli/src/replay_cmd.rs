//! `docsight replay`: decode a captured event-stream transcript offline.

use std::convert::Infallible;
use std::path::Path;

use anyhow::{Context, Result};
use futures_util::stream;

use docsight_core::StreamEvent;
use docsight_stream::{pump, FrameDecoder, PumpSummary};

use crate::terminal_output::{note_info, note_warn};

pub async fn run(file: &Path, chunk_size: usize) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let (events, summary) = decode_transcript(&bytes, chunk_size).await;
    for event in &events {
        println!("{}", serde_json::to_string(event)?);
    }

    note_info(&format!("{} events decoded", summary.events));
    if summary.discarded_bytes > 0 {
        note_warn(&format!(
            "{} bytes of an unterminated trailing frame were discarded",
            summary.discarded_bytes
        ));
    }
    Ok(())
}

/// Feeds `bytes` to a fresh decoder in `chunk_size` slices, the way they
/// would arrive from the network.
pub async fn decode_transcript(bytes: &[u8], chunk_size: usize) -> (Vec<StreamEvent>, PumpSummary) {
    let chunks = stream::iter(bytes.chunks(chunk_size.max(1)).map(Ok::<_, Infallible>));
    let mut events = Vec::new();
    let summary = pump(FrameDecoder::new(), chunks, |event| events.push(event)).await;
    (events, summary)
}
