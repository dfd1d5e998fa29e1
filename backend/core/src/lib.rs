pub mod error;
pub mod message;
pub mod traits;
pub mod types;

pub use error::FerryError;
pub use message::{BridgeRequest, BridgeResponse, BridgeStatus};
pub use traits::{Notifier, NullNotifier};
pub use types::{
    normalize_code, BatchPayload, BlockProvenance, CodeBlock, DeliveryAttempt, DeliveryOutcome,
    PageMetadata, WireBlock, DEFAULT_LANGUAGE, GENERIC_PLATFORM,
};
