//! Log Redaction Layer
//!
//! Captured code often carries credentials. Anything that goes into a log
//! line passes through here first.

use regex::Regex;
use std::sync::LazyLock;

static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid phone pattern")
});
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(gh[pousr]_[A-Za-z0-9]{36,})|(AKIA[0-9A-Z]{16})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)")
        .expect("valid api key pattern")
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = TELEPHONE_RE.replace_all(input, "[REDACTED_PHONE]");
    API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}

/// Redacted, single-line preview of at most `max_chars` characters.
pub fn redacted_preview(code: &str, max_chars: usize) -> String {
    let one_line: String = code.split_whitespace().collect::<Vec<_>>().join(" ");
    let redacted = redact_sensitive_data(&one_line);
    let mut preview: String = redacted.chars().take(max_chars).collect();
    if redacted.chars().count() > max_chars {
        preview.push_str("...");
    }
    preview
}
