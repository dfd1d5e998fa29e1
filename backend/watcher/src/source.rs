use async_trait::async_trait;
use codeferry_core::FerryError;

/// The raw state of a page at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    /// Overrides the document's own `<title>` when set.
    pub title: Option<String>,
    pub html: String,
}

/// Where the watcher reads the live page from.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn snapshot(&self) -> Result<PageSnapshot, FerryError>;
}
