//! `codeferry-browser`: page parsing, platform detection, and code block
//! extraction.

pub mod affordance;
pub mod copy_button;
pub mod document;
pub mod element_query;
pub mod error;
pub mod extractor;
pub mod frames;
pub mod language;
pub mod platform;

pub use affordance::{Affordance, AffordanceAction, AffordanceKind};
pub use copy_button::{copy_buttons, resolve_code, CopyButton};
pub use document::PageDocument;
pub use element_query::ElementKey;
pub use error::ExtractionError;
pub use extractor::{Extractor, ExtractorSettings};
pub use language::classify;
pub use platform::{host_matches, PlatformEntry, PlatformRegistry};
