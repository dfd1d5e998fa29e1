//! Outbound HTTP
//!
//! `Transport` sends one request and reports the raw status and body; the
//! client decides what counts as success. `HttpTransport` is the reqwest
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use codeferry_config::FerryConfig;
use reqwest::multipart::Form;
use reqwest::Client;
use tracing::debug;

use crate::error::DeliveryError;

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRequest {
    Json { url: String, body: serde_json::Value },
    Multipart { url: String, fields: Vec<(String, String)> },
}

impl OutboundRequest {
    pub fn url(&self) -> &str {
        match self {
            OutboundRequest::Json { url, .. } | OutboundRequest::Multipart { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Only failures to get any response are errors.
    async fn send(&self, request: &OutboundRequest) -> Result<RawResponse, DeliveryError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder().user_agent(user_agent).timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &FerryConfig) -> Result<Self, DeliveryError> {
        let user_agent = config
            .service
            .user_agent
            .clone()
            .unwrap_or_else(codeferry_config::default_user_agent);
        Self::new(&user_agent, Duration::from_millis(config.service.request_timeout_ms))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<RawResponse, DeliveryError> {
        let builder = match request {
            OutboundRequest::Json { url, body } => self.client.post(url).json(body),
            OutboundRequest::Multipart { url, fields } => {
                let form = fields
                    .iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name.clone(), value.clone()));
                self.client.post(url).multipart(form)
            }
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(url = request.url(), status, bytes = body.len(), "Service responded");
        Ok(RawResponse { status, body })
    }
}
