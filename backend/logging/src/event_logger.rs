//! Session Event Logger
//!
//! One structured record per chat lifecycle step, emitted under the
//! `session_events` target so the file layer keeps them as NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    RequestSent { message: String, history_len: usize },
    Progress { message: String },
    Completed { chars: usize, sources: usize },
    StreamError { message: String },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: SessionEvent,
}

impl EventLogEntry {
    /// Builds an entry with every free-text field redacted.
    pub fn new(session_id: &str, mut event: SessionEvent) -> Self {
        match &mut event {
            SessionEvent::RequestSent { message, .. }
            | SessionEvent::Progress { message }
            | SessionEvent::StreamError { message } => {
                *message = redact_sensitive_data(message);
            }
            SessionEvent::Completed { .. } => {}
        }
        Self {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    pub fn log_event(session_id: &str, event: SessionEvent) {
        let entry = EventLogEntry::new(session_id, event);
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "session_events", session_id, entry = %json, "Session event"),
            Err(err) => info!(target: "session_events", session_id, error = %err, "Session event not serializable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_redacts_message() {
        let entry = EventLogEntry::new(
            "s-1",
            SessionEvent::RequestSent {
                message: "my key is sk-abcdefghijklmnopqrstuvwx".into(),
                history_len: 2,
            },
        );
        assert_eq!(
            entry.event,
            SessionEvent::RequestSent {
                message: "my key is [REDACTED_KEY]".into(),
                history_len: 2,
            }
        );
    }

    #[test]
    fn test_entry_wire_shape() {
        let entry = EventLogEntry::new("s-1", SessionEvent::Completed { chars: 42, sources: 3 });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["session_id"], "s-1");
        assert_eq!(json["event"], serde_json::json!({"type": "completed", "chars": 42, "sources": 3}));
    }

    #[test]
    fn test_log_event_without_subscriber() {
        EventLogger::log_event("s-1", SessionEvent::StreamError { message: "boom".into() });
    }
}
