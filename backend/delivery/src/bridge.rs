//! Extension Bridge
//!
//! Request/reply messaging between the page side (which extracts) and the
//! background side (which talks to the service). The host end owns the
//! dispatcher and answers each request on its own task; the handle end is
//! cheap to clone and implements [`Dispatch`] itself.

use std::sync::Arc;

use async_trait::async_trait;
use codeferry_core::{BridgeRequest, BridgeResponse, BridgeStatus};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::client::{Payload, ServerResponse};
use crate::dispatch::Dispatch;
use crate::error::DeliveryError;

const DEFAULT_BUFFER_SIZE: usize = 64;

type Envelope = (BridgeRequest, oneshot::Sender<BridgeResponse>);

/// Create a connected host/handle pair.
pub fn bridge<D: Dispatch + 'static>(dispatch: D) -> (BridgeHost<D>, BridgeHandle) {
    let (tx, rx) = mpsc::channel(DEFAULT_BUFFER_SIZE);
    (BridgeHost { dispatch: Arc::new(dispatch), rx }, BridgeHandle { tx })
}

impl From<BridgeRequest> for Payload {
    fn from(request: BridgeRequest) -> Self {
        match request {
            BridgeRequest::CodeBlock { data } => Payload::Blocks(data),
            BridgeRequest::CopyCode { code } => Payload::Text(code),
            BridgeRequest::UploadContent { content, metadata } => Payload::Upload { content, page: metadata },
        }
    }
}

impl From<Payload> for BridgeRequest {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Blocks(data) => BridgeRequest::CodeBlock { data },
            Payload::Text(code) => BridgeRequest::CopyCode { code },
            Payload::Upload { content, page } => BridgeRequest::UploadContent { content, metadata: page },
        }
    }
}

/// Background end.
pub struct BridgeHost<D> {
    dispatch: Arc<D>,
    rx: mpsc::Receiver<Envelope>,
}

impl<D: Dispatch + 'static> BridgeHost<D> {
    /// Serve requests until every handle is dropped.
    pub async fn run(mut self) {
        info!("Bridge host started");
        while let Some((request, reply)) = self.rx.recv().await {
            let dispatch = Arc::clone(&self.dispatch);
            tokio::spawn(async move {
                let kind = request.kind();
                debug!(kind, "Bridge request received");
                let response = match dispatch.dispatch(request.into()).await {
                    Ok(resp) => {
                        let message = resp.message().map(str::to_string);
                        BridgeResponse { message, ..BridgeResponse::success(resp.body) }
                    }
                    Err(e) => BridgeResponse::error(e.to_string()),
                };
                if reply.send(response).is_err() {
                    warn!(kind, "Bridge requester went away before the reply");
                }
            });
        }
        info!("Bridge host stopped");
    }
}

/// Page end.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<Envelope>,
}

impl BridgeHandle {
    pub async fn request(&self, request: BridgeRequest) -> Result<BridgeResponse, DeliveryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| DeliveryError::Messaging("bridge host is not running".to_string()))?;
        reply_rx
            .await
            .map_err(|_| DeliveryError::Messaging("bridge host dropped the request".to_string()))
    }
}

#[async_trait]
impl Dispatch for BridgeHandle {
    /// Attempt counts do not cross the bridge; a reply counts as one.
    async fn dispatch(&self, payload: Payload) -> Result<ServerResponse, DeliveryError> {
        let reply = self.request(payload.into()).await?;
        match reply.status {
            BridgeStatus::Success => {
                let mut body = reply.data.unwrap_or(Value::Null);
                if let (Some(message), Value::Object(map)) = (reply.message, &mut body) {
                    map.entry("message").or_insert(Value::String(message));
                }
                Ok(ServerResponse { body, attempts: 1 })
            }
            BridgeStatus::Error => Err(DeliveryError::Rejected {
                message: reply.message.unwrap_or_else(|| "unknown bridge error".to_string()),
                attempts: 1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<&'static str>>,
        fail: bool,
    }

    #[async_trait]
    impl Dispatch for Recorder {
        async fn dispatch(&self, payload: Payload) -> Result<ServerResponse, DeliveryError> {
            self.seen.lock().unwrap().push(payload.kind());
            if self.fail {
                return Err(DeliveryError::Rejected { message: "conversion failed".into(), attempts: 2 });
            }
            Ok(ServerResponse { body: json!({ "message": "done" }), attempts: 2 })
        }
    }

    #[tokio::test]
    async fn copy_code_reaches_dispatcher_as_text() {
        let recorder = Arc::new(Recorder::default());
        let (host, handle) = bridge(ArcDispatch(Arc::clone(&recorder)));
        tokio::spawn(host.run());

        let response = handle.dispatch(Payload::Text("ls".into())).await.unwrap();
        assert_eq!(response.message(), Some("done"));
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["text"]);
    }

    #[tokio::test]
    async fn error_status_becomes_rejected() {
        let (host, handle) = bridge(Recorder { fail: true, ..Recorder::default() });
        tokio::spawn(host.run());

        let err = handle.dispatch(Payload::Text("ls".into())).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { ref message, .. } if message.contains("conversion failed")));
    }

    #[tokio::test]
    async fn closed_host_is_a_messaging_error() {
        let (host, handle) = bridge(Recorder::default());
        drop(host);
        let err = handle.dispatch(Payload::Text("ls".into())).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Messaging(_)));
    }

    #[test]
    fn payloads_map_onto_wire_requests() {
        let request = BridgeRequest::from(Payload::Text("pwd".into()));
        assert_eq!(request.kind(), "COPY_CODE");
        assert_eq!(Payload::from(request), Payload::Text("pwd".into()));
    }

    struct ArcDispatch(Arc<Recorder>);

    #[async_trait]
    impl Dispatch for ArcDispatch {
        async fn dispatch(&self, payload: Payload) -> Result<ServerResponse, DeliveryError> {
            self.0.dispatch(payload).await
        }
    }
}
