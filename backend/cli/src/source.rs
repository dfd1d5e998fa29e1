//! Page sources: a saved HTML file or a live URL, plus a change probe that
//! turns content changes into watcher mutations.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use codeferry_core::FerryError;
use codeferry_watcher::{Mutation, PageSnapshot, PageSource};
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct FileSource {
    path: PathBuf,
    url: String,
}

impl FileSource {
    /// `url` is the address the page was saved from; it decides the platform.
    pub fn new(path: PathBuf, url: Option<String>) -> Result<Self> {
        let url = match url {
            Some(url) => url,
            None => {
                let absolute = std::path::absolute(&path)
                    .with_context(|| format!("Cannot resolve path {}", path.display()))?;
                url::Url::from_file_path(&absolute)
                    .map_err(|_| anyhow::anyhow!("Cannot build a file URL for {}", absolute.display()))?
                    .to_string()
            }
        };
        Ok(Self { path, url })
    }
}

#[async_trait]
impl PageSource for FileSource {
    async fn snapshot(&self) -> Result<PageSnapshot, FerryError> {
        let html = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FerryError::SourceUnavailable(format!("{}: {e}", self.path.display())))?;
        Ok(PageSnapshot { url: self.url.clone(), title: None, html })
    }
}

pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: String, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn snapshot(&self) -> Result<PageSnapshot, FerryError> {
        let unavailable = |e: reqwest::Error| FerryError::SourceUnavailable(format!("{}: {e}", self.url));
        let resp = self.client.get(&self.url).send().await.map_err(unavailable)?;
        let resp = resp.error_for_status().map_err(unavailable)?;
        let url = resp.url().to_string();
        let html = resp.text().await.map_err(unavailable)?;
        Ok(PageSnapshot { url, title: None, html })
    }
}

/// Build a source from a CLI argument: http(s) URLs are fetched, anything
/// else is a file path.
pub fn open_source(
    arg: &str,
    page_url: Option<String>,
    user_agent: &str,
    timeout: Duration,
) -> Result<Arc<dyn PageSource>> {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        Ok(Arc::new(HttpSource::new(arg.to_string(), user_agent, timeout)?))
    } else {
        Ok(Arc::new(FileSource::new(PathBuf::from(arg), page_url)?))
    }
}

fn fingerprint(snapshot: &PageSnapshot) -> u64 {
    let mut hasher = DefaultHasher::new();
    snapshot.url.hash(&mut hasher);
    snapshot.html.hash(&mut hasher);
    hasher.finish()
}

/// Poll `source` every `every` and emit a [`Mutation`] whenever its content
/// changes. Stops when the receiver is gone.
pub fn spawn_mutation_probe(
    source: Arc<dyn PageSource>,
    every: Duration,
    tx: mpsc::Sender<Mutation>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last: Option<u64> = None;
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let current = match source.snapshot().await {
                Ok(snapshot) => fingerprint(&snapshot),
                Err(e) => {
                    warn!(error = %e, "Change probe could not read page");
                    continue;
                }
            };
            if last.is_some_and(|seen| seen != current) {
                debug!("Page content changed");
                if tx.send(Mutation).await.is_err() {
                    break;
                }
            }
            last = Some(current);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_source_reads_and_labels_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        tokio::fs::write(&path, "<pre><code>x = 1</code></pre>").await.unwrap();

        let labelled = FileSource::new(path.clone(), Some("https://github.com/a/b".into())).unwrap();
        let snapshot = labelled.snapshot().await.unwrap();
        assert_eq!(snapshot.url, "https://github.com/a/b");
        assert!(snapshot.html.contains("x = 1"));

        let unlabelled = FileSource::new(path, None).unwrap();
        assert!(unlabelled.snapshot().await.unwrap().url.starts_with("file://"));
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let source = FileSource::new(PathBuf::from("/nonexistent/page.html"), Some("https://x.dev/".into())).unwrap();
        assert!(matches!(source.snapshot().await, Err(FerryError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn probe_reports_changes_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        tokio::fs::write(&path, "<p>one</p>").await.unwrap();
        let source: Arc<dyn PageSource> =
            Arc::new(FileSource::new(path.clone(), Some("https://x.dev/".into())).unwrap());

        let (tx, mut rx) = mpsc::channel(4);
        let probe = spawn_mutation_probe(source, Duration::from_millis(20), tx);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_err());

        tokio::fs::write(&path, "<p>two</p>").await.unwrap();
        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert_eq!(got, Some(Mutation));
        probe.abort();
    }
}
