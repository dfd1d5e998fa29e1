//! Structured logging for codeferry.
//!
//! Console + rolling NDJSON output, secret redaction for code previews, and
//! capture events for the extraction/delivery pipeline.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{CaptureEvent, CaptureEventEntry, EventLogger};
pub use logger::init_logger;
pub use redact::{redact_sensitive_data, redacted_preview};
