//! Log Redaction
//!
//! Scrubs API keys, bearer tokens, and e-mail addresses from text before it
//! is logged.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bearer\s+[a-z0-9\-._~+/]+=*").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(sk-[a-z0-9_-]{20,})|((?:api[_-]?key|token|secret)["']?\s*[:=]\s*["']?)[^\s"',;]+"#)
        .unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "Bearer [REDACTED_TOKEN]");
    let redacted = API_KEY_RE.replace_all(&redacted, |caps: &regex::Captures| match caps.get(2) {
        Some(prefix) => format!("{}[REDACTED_KEY]", prefix.as_str()),
        None => "[REDACTED_KEY]".to_string(),
    });
    EMAIL_RE.replace_all(&redacted, "[REDACTED_EMAIL]").into_owned()
}
