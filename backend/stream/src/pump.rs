use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use docsight_core::StreamEvent;

use crate::decoder::FrameDecoder;

/// What happened while draining one response stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    /// Events handed to the callback, including a synthetic transport error.
    pub events: usize,
    /// Bytes of an unterminated trailing frame that were discarded.
    pub discarded_bytes: usize,
    pub transport_failed: bool,
}

impl PumpSummary {
    /// Summary of a stream that failed before producing any frame.
    pub fn failed() -> Self {
        Self {
            events: 1,
            discarded_bytes: 0,
            transport_failed: true,
        }
    }
}

/// Drives a chunk stream through `decoder`, calling `on_event` for every
/// decoded event in arrival order.
///
/// A transport error becomes a single `Error` event and ends decoding; a
/// clean end of input discards any partial frame.
pub async fn pump<S, B, E, F>(mut decoder: FrameDecoder, chunks: S, mut on_event: F) -> PumpSummary
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(StreamEvent),
{
    let mut chunks = std::pin::pin!(chunks);
    let mut summary = PumpSummary::default();

    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(bytes) => {
                for event in decoder.feed_bytes(bytes.as_ref()) {
                    summary.events += 1;
                    on_event(event);
                }
            }
            Err(err) => {
                warn!(error = %err, buffered = decoder.buffered(), "Response stream aborted");
                on_event(StreamEvent::Error {
                    message: err.to_string(),
                });
                summary.events += 1;
                summary.transport_failed = true;
                return summary;
            }
        }
    }

    summary.discarded_bytes = decoder.finish();
    debug!(events = summary.events, "Response stream ended");
    summary
}
