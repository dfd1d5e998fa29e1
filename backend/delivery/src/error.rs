use std::time::Duration;

use codeferry_core::DeliveryOutcome;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Connect failure, timeout, or a dropped connection.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service response is not valid JSON: {0}")]
    InvalidResponse(String),

    /// A 2xx answer carrying an `error` field.
    #[error("{message}")]
    Rejected { message: String, attempts: u32 },

    #[error("delivery failed after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<DeliveryError>,
    },

    #[error("delivery did not finish within {deadline:?} ({attempts} attempt(s))")]
    DeadlineExceeded { deadline: Duration, attempts: u32 },

    #[error("messaging error: {0}")]
    Messaging(String),
}

impl DeliveryError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Transport(_) | DeliveryError::Status { .. } | DeliveryError::InvalidResponse(_)
        )
    }

    /// Requests sent before giving up. Zero when nothing reached the transport.
    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryError::Exhausted { attempts, .. }
            | DeliveryError::Rejected { attempts, .. }
            | DeliveryError::DeadlineExceeded { attempts, .. } => *attempts,
            DeliveryError::Messaging(_) => 0,
            _ => 1,
        }
    }

    pub fn outcome(&self) -> DeliveryOutcome {
        match self {
            DeliveryError::Rejected { .. } => DeliveryOutcome::Rejected,
            _ => DeliveryOutcome::Exhausted,
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        DeliveryError::Transport(e.to_string())
    }
}
