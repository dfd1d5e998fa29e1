//! Capture Event Logger
//!
//! Structured pipeline events (block captured, element instrumented, delivery
//! outcome) emitted on the `capture_events` target, which the NDJSON file
//! layer records one per line.

use chrono::{DateTime, Utc};
use codeferry_core::{DeliveryAttempt, DeliveryOutcome};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::{redact_sensitive_data, redacted_preview};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptureEvent {
    BlockCaptured {
        platform: String,
        language: String,
        preview: String,
    },
    Instrumented {
        kind: String,
        key: String,
    },
    DeliverySucceeded {
        #[serde(flatten)]
        attempt: DeliveryAttempt,
    },
    DeliveryFailed {
        #[serde(flatten)]
        attempt: DeliveryAttempt,
        error: String,
    },
}

impl CaptureEvent {
    /// Build a `BlockCaptured` event with a redacted, truncated preview.
    pub fn captured(platform: &str, language: &str, code: &str) -> Self {
        CaptureEvent::BlockCaptured {
            platform: platform.to_string(),
            language: language.to_string(),
            preview: redacted_preview(code, PREVIEW_CHARS),
        }
    }

    /// Terminal delivery record; `error` is set for anything but success.
    pub fn delivery(attempt: DeliveryAttempt, error: Option<String>) -> Self {
        match (attempt.outcome, error) {
            (DeliveryOutcome::Success, _) => CaptureEvent::DeliverySucceeded { attempt },
            (_, error) => CaptureEvent::DeliveryFailed {
                attempt,
                error: error.unwrap_or_default(),
            },
        }
    }

    fn is_failure(&self) -> bool {
        matches!(self, CaptureEvent::DeliveryFailed { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct CaptureEventEntry {
    pub page_url: String,
    pub timestamp: DateTime<Utc>,
    pub event: CaptureEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Serialize a pipeline event into the tracing system.
    pub fn log_event(page_url: &str, mut event: CaptureEvent) {
        if let CaptureEvent::DeliveryFailed { error, .. } = &mut event {
            *error = redact_sensitive_data(error);
        }

        let failure = event.is_failure();
        let entry = CaptureEventEntry {
            page_url: page_url.to_string(),
            timestamp: Utc::now(),
            event,
        };
        let json = serde_json::to_string(&entry).unwrap_or_default();

        if failure {
            warn!(target: "capture_events", entry = %json, "Capture event");
        } else {
            info!(target: "capture_events", entry = %json, "Capture event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_event_is_redacted_and_tagged() {
        let event = CaptureEvent::captured("github", "bash", "export KEY=sk-abcdefghijklmnopqrstuvwxyz0123456789");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "block_captured");
        assert!(json["preview"].as_str().unwrap().contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn delivery_events_carry_id_and_outcome() {
        let attempt = DeliveryAttempt {
            id: 7,
            kind: "text".into(),
            attempts: 3,
            outcome: DeliveryOutcome::Rejected,
        };
        let json = serde_json::to_value(CaptureEvent::delivery(attempt.clone(), Some("bad input".into()))).unwrap();
        assert_eq!(json["type"], "delivery_failed");
        assert_eq!(json["id"], 7);
        assert_eq!(json["attempts"], 3);
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["error"], "bad input");

        let success = DeliveryAttempt { outcome: DeliveryOutcome::Success, ..attempt };
        let json = serde_json::to_value(CaptureEvent::delivery(success, None)).unwrap();
        assert_eq!(json["type"], "delivery_succeeded");
        assert_eq!(json["outcome"], "success");
        assert!(json.get("error").is_none());
    }
}
