use thiserror::Error;

/// Top-level error type shared across codeferry crates.
#[derive(Debug, Error)]
pub enum FerryError {
    #[error("invalid page url: {0}")]
    InvalidUrl(String),

    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("page source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("bridge closed: {0}")]
    BridgeClosed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}
