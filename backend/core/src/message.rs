//! Messages exchanged between the page side and the background side of the
//! extension bridge.

use serde::{Deserialize, Serialize};

use crate::types::{BatchPayload, PageMetadata};

/// Page → background request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeRequest {
    /// A batch of extracted blocks.
    CodeBlock { data: BatchPayload },
    /// Raw text captured from a copy button or the clipboard.
    CopyCode { code: String },
    /// Marked-container text to upload, then convert.
    UploadContent { content: String, metadata: PageMetadata },
}

impl BridgeRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeRequest::CodeBlock { .. } => "CODE_BLOCK",
            BridgeRequest::CopyCode { .. } => "COPY_CODE",
            BridgeRequest::UploadContent { .. } => "UPLOAD_CONTENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStatus {
    Success,
    Error,
}

/// Background → page reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub status: BridgeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BridgeResponse {
    pub fn success(data: serde_json::Value) -> Self {
        Self { status: BridgeStatus::Success, data: Some(data), message: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: BridgeStatus::Error, data: None, message: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_code_wire_shape() {
        let req = BridgeRequest::CopyCode { code: "ls -la".into() };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "COPY_CODE");
        assert_eq!(json["code"], "ls -la");
    }

    #[test]
    fn parses_error_reply() {
        let reply: BridgeResponse =
            serde_json::from_str(r#"{"status":"error","message":"boom"}"#).unwrap();
        assert_eq!(reply.status, BridgeStatus::Error);
        assert_eq!(reply.message.as_deref(), Some("boom"));
        assert!(reply.data.is_none());
    }
}
