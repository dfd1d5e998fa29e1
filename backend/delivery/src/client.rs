//! Delivery Client
//!
//! Maps each payload onto the conversion service's endpoints and drives the
//! retry loop. A 2xx JSON body carrying an `error` field ends the loop at
//! once; anything else that is not a clean 2xx JSON answer is retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use codeferry_config::{BatchMode, FerryConfig};
use codeferry_core::{BatchPayload, DeliveryAttempt, DeliveryOutcome, PageMetadata, WireBlock};
use codeferry_logging::{CaptureEvent, EventLogger};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::DeliveryError;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, OutboundRequest, RawResponse, Transport};

const CODE_BLOCKS_PATH: &str = "/code-blocks";
const CONVERT_PATH: &str = "/convert";
const UPLOAD_LANGUAGE: &str = "unknown";

static NEXT_ATTEMPT_ID: AtomicU64 = AtomicU64::new(1);

/// What the caller wants delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Extracted blocks with their page metadata.
    Blocks(BatchPayload),
    /// Raw text, converted as markdown.
    Text(String),
    /// Marked-container text: stored as one block, then converted.
    Upload { content: String, page: PageMetadata },
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Blocks(_) => "blocks",
            Payload::Text(_) => "text",
            Payload::Upload { .. } => "upload",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Blocks(batch) => batch.is_empty(),
            Payload::Text(text) => text.trim().is_empty(),
            Payload::Upload { content, .. } => content.trim().is_empty(),
        }
    }

    fn page_url(&self) -> &str {
        match self {
            Payload::Blocks(batch) => &batch.metadata.url,
            Payload::Upload { page, .. } => &page.url,
            Payload::Text(_) => "",
        }
    }
}

/// The service's parsed answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerResponse {
    pub body: Value,
    /// Requests made, retries included. Zero for a skipped delivery.
    pub attempts: u32,
}

impl ServerResponse {
    pub fn skipped() -> Self {
        Self { body: Value::Null, attempts: 0 }
    }

    pub fn is_skipped(&self) -> bool {
        self.attempts == 0
    }

    /// The service's `message` field, if any.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

pub struct DeliveryClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    batch_mode: BatchMode,
    retry: RetryPolicy,
}

impl DeliveryClient<HttpTransport> {
    pub fn from_config(config: &FerryConfig) -> Result<Self, DeliveryError> {
        Ok(Self::new(
            HttpTransport::from_config(config)?,
            &config.service.base_url,
            config.service.batch_mode,
            RetryPolicy::from(&config.retry),
        ))
    }
}

impl<T: Transport> DeliveryClient<T> {
    pub fn new(transport: T, base_url: &str, batch_mode: BatchMode, retry: RetryPolicy) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            batch_mode,
            retry,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Deliver a payload. Empty payloads are skipped without any request.
    pub async fn deliver(&self, payload: &Payload) -> Result<ServerResponse, DeliveryError> {
        if payload.is_empty() {
            debug!(kind = payload.kind(), "Nothing to deliver");
            return Ok(ServerResponse::skipped());
        }

        let id = NEXT_ATTEMPT_ID.fetch_add(1, Ordering::Relaxed);
        let mut sent = 0;
        let finished = match self.retry.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.deliver_inner(payload, &mut sent))
                .await
                .map_err(|_| deadline),
            None => Ok(self.deliver_inner(payload, &mut sent).await),
        };
        let result = match finished {
            Ok(inner) => inner.map(|body| ServerResponse { body, attempts: sent }),
            Err(deadline) => Err(DeliveryError::DeadlineExceeded { deadline, attempts: sent }),
        };

        let (outcome, error) = match &result {
            Ok(_) => {
                info!(id, kind = payload.kind(), attempts = sent, "Delivery succeeded");
                (DeliveryOutcome::Success, None)
            }
            Err(e) => {
                warn!(id, kind = payload.kind(), attempts = sent, error = %e, "Delivery failed");
                (e.outcome(), Some(e.to_string()))
            }
        };
        let attempt = DeliveryAttempt {
            id,
            kind: payload.kind().to_string(),
            attempts: sent,
            outcome,
        };
        EventLogger::log_event(payload.page_url(), CaptureEvent::delivery(attempt, error));
        result
    }

    /// Runs every request the payload needs; `sent` counts requests across all of them.
    async fn deliver_inner(&self, payload: &Payload, sent: &mut u32) -> Result<Value, DeliveryError> {
        match payload {
            Payload::Blocks(batch) => self.send_with_retry(&self.batch_request(batch)?, sent).await,
            Payload::Text(text) => self.send_with_retry(&self.convert_request(text), sent).await,
            Payload::Upload { content, page } => {
                self.send_with_retry(&self.upload_request(content, page), sent).await?;
                self.send_with_retry(&self.convert_request(content), sent).await
            }
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn batch_request(&self, batch: &BatchPayload) -> Result<OutboundRequest, DeliveryError> {
        Ok(match self.batch_mode {
            BatchMode::Json => {
                let blocks: Vec<WireBlock> = batch.blocks.iter().map(|b| b.to_wire()).collect();
                OutboundRequest::Json {
                    url: self.endpoint(CODE_BLOCKS_PATH),
                    body: json!({ "blocks": blocks, "metadata": &batch.metadata }),
                }
            }
            BatchMode::Form => {
                let encoded = serde_json::to_string(batch)
                    .map_err(|e| DeliveryError::InvalidResponse(format!("cannot encode batch: {e}")))?;
                OutboundRequest::Multipart {
                    url: self.endpoint(CONVERT_PATH),
                    fields: vec![("payload".to_string(), encoded)],
                }
            }
        })
    }

    fn convert_request(&self, text: &str) -> OutboundRequest {
        OutboundRequest::Multipart {
            url: self.endpoint(CONVERT_PATH),
            fields: vec![("markdown_content".to_string(), text.to_string())],
        }
    }

    fn upload_request(&self, content: &str, page: &PageMetadata) -> OutboundRequest {
        let host = url::Url::parse(&page.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let block = WireBlock {
            code: content.to_string(),
            language: UPLOAD_LANGUAGE.to_string(),
            platform: host,
            url: page.url.clone(),
            timestamp: Utc::now(),
            title: page.title.clone(),
        };
        OutboundRequest::Json {
            url: self.endpoint(CODE_BLOCKS_PATH),
            body: json!({ "blocks": [block] }),
        }
    }

    async fn send_with_retry(&self, request: &OutboundRequest, sent: &mut u32) -> Result<Value, DeliveryError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            *sent += 1;
            let error = match self.transport.send(request).await.and_then(interpret) {
                Ok(body) => return Ok(body),
                Err(DeliveryError::Rejected { message, .. }) => {
                    return Err(DeliveryError::Rejected { message, attempts: *sent });
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if !self.retry.should_retry(attempt) {
                return Err(DeliveryError::Exhausted { attempts: *sent, source: Box::new(error) });
            }
            let delay: Duration = self.retry.delay_after(attempt);
            warn!(
                url = request.url(),
                attempt,
                max = self.retry.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Delivery attempt failed, will retry"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Classify a raw response. Non-2xx and unparseable bodies are transport
/// failures whatever they contain; only a 2xx body's `error` field rejects.
fn interpret(raw: RawResponse) -> Result<Value, DeliveryError> {
    if !raw.is_success() {
        return Err(DeliveryError::Status { status: raw.status, body: raw.body });
    }
    if raw.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let body: Value =
        serde_json::from_str(&raw.body).map_err(|e| DeliveryError::InvalidResponse(e.to_string()))?;
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(DeliveryError::Rejected { message, attempts: 1 });
    }
    Ok(body)
}
