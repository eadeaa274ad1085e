//! Structured logging for docsight.
//!
//! Subscriber setup (console plus optional rolling NDJSON file), redaction of
//! secrets and addresses, and the per-session event log.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, SessionEvent};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
