use thiserror::Error;

use crate::element_query::ElementKey;

/// A page element that looked actionable but yielded no code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no code container found for element {key}")]
    NoCodeContainer { key: ElementKey },

    #[error("code container for element {key} is empty")]
    EmptyCode { key: ElementKey },
}
