use serde::{Deserialize, Serialize};

use crate::message::Source;

/// A typed event decoded from one frame of the response stream.
///
/// Events are produced in the order their frames arrived; nothing downstream
/// reorders them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The server reports what it is currently doing (retrieval, ranking, ...).
    Progress { message: String },
    /// A fragment of the assistant answer.
    Token { text: String },
    /// The answer is complete; carries the cited sources.
    Complete { sources: Vec<Source> },
    /// The stream failed, either server-side or in transport.
    Error { message: String },
}

impl StreamEvent {
    /// Wire name of the event, as it appears on the `event:` line.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::Token { .. } => "token",
            StreamEvent::Complete { .. } => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends the message it belongs to.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }
}

impl std::fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamEvent::Progress { message } => write!(f, "progress: {message}"),
            StreamEvent::Token { text } => write!(f, "token: {text:?}"),
            StreamEvent::Complete { sources } => write!(f, "complete: {} source(s)", sources.len()),
            StreamEvent::Error { message } => write!(f, "error: {message}"),
        }
    }
}
