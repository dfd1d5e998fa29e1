use async_trait::async_trait;

use crate::client::{DeliveryClient, Payload, ServerResponse};
use crate::error::DeliveryError;
use crate::transport::Transport;

/// Anything that can take a payload to the conversion service, directly or
/// through the extension bridge.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, payload: Payload) -> Result<ServerResponse, DeliveryError>;
}

#[async_trait]
impl<T: Transport> Dispatch for DeliveryClient<T> {
    async fn dispatch(&self, payload: Payload) -> Result<ServerResponse, DeliveryError> {
        self.deliver(&payload).await
    }
}
