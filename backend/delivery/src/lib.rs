//! `codeferry-delivery`: getting captured code to the conversion service.
//!
//! - `client`: payload → endpoint mapping and the retry loop
//! - `transport`: the HTTP seam (`reqwest` in production)
//! - `bridge`: page/background request-reply messaging
//! - `dispatch`: the trait the watcher sends through

pub mod bridge;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod retry;
pub mod transport;

pub use bridge::{bridge, BridgeHandle, BridgeHost};
pub use client::{DeliveryClient, Payload, ServerResponse};
pub use dispatch::Dispatch;
pub use error::DeliveryError;
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, OutboundRequest, RawResponse, Transport};
