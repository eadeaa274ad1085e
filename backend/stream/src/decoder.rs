//! Server-sent event frame decoder.
//!
//! Chunks are appended to an owned buffer; every complete frame (terminated
//! by a blank line) is parsed and dispatched immediately, in arrival order.
//! Whatever follows the last delimiter waits for the next chunk. One decoder
//! belongs to one stream.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use docsight_core::{Source, StreamEvent};

static EVENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^event:[ \t]?(.+)$").unwrap());
static DATA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^data:[ \t]?(.+)$").unwrap());

const FRAME_DELIMITER: &str = "\n\n";
const UNKNOWN_ERROR: &str = "Unknown stream error";

#[derive(Deserialize)]
struct TokenPayload {
    token: String,
}

#[derive(Deserialize)]
struct MessagePayload {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct CompletePayload {
    #[serde(default)]
    sources: Option<Vec<Value>>,
}

/// Incremental decoder for one response stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a text chunk and returns the events of every frame it completes.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.extend(chunk.chars().filter(|&c| c != '\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find(FRAME_DELIMITER) {
            let rest = self.buffer.split_off(pos + FRAME_DELIMITER.len());
            let frame = std::mem::replace(&mut self.buffer, rest);
            if let Some(event) = parse_frame(&frame[..pos]) {
                events.push(event);
            }
        }
        events
    }

    /// Feeds raw bytes. A multi-byte character split across chunks is held
    /// back until it completes; invalid bytes decode to U+FFFD.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut text = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        while !rest.is_empty() {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        self.feed(&text)
    }

    /// Bytes currently buffered without a frame delimiter.
    pub fn buffered(&self) -> usize {
        self.buffer.len() + self.pending.len()
    }

    /// Ends the stream. A trailing partial frame is discarded, never emitted;
    /// returns how many bytes were dropped.
    pub fn finish(self) -> usize {
        let dropped = self.buffered();
        if !self.buffer.trim().is_empty() || !self.pending.is_empty() {
            debug!(bytes = dropped, "Discarding partial frame at end of stream");
        }
        dropped
    }
}

fn parse_frame(frame: &str) -> Option<StreamEvent> {
    if frame.trim().is_empty() {
        return None;
    }
    let (Some(name), Some(data)) = (EVENT_RE.captures(frame), DATA_RE.captures(frame)) else {
        debug!(frame_len = frame.len(), "Dropping frame without event or data line");
        return None;
    };
    let name = name[1].trim();
    match decode_payload(name, data[1].trim()) {
        Ok(Some(event)) => Some(event),
        Ok(None) => {
            debug!(event = name, "Ignoring unknown stream event");
            None
        }
        Err(err) => {
            debug!(event = name, error = %err, "Dropping frame with malformed payload");
            None
        }
    }
}

fn decode_payload(name: &str, data: &str) -> Result<Option<StreamEvent>, serde_json::Error> {
    let event = match name {
        "progress" => {
            let payload: MessagePayload = serde_json::from_str(data)?;
            StreamEvent::Progress {
                message: payload.message.unwrap_or_default(),
            }
        }
        "token" => {
            let payload: TokenPayload = serde_json::from_str(data)?;
            StreamEvent::Token {
                text: payload.token,
            }
        }
        "complete" => {
            let payload: CompletePayload = serde_json::from_str(data)?;
            let sources = payload
                .sources
                .unwrap_or_default()
                .into_iter()
                .map(Source::from_json)
                .collect();
            StreamEvent::Complete { sources }
        }
        "error" => {
            let payload: MessagePayload = serde_json::from_str(data)?;
            StreamEvent::Error {
                message: payload.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}
