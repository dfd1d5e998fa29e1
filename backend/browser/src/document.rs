//! Parsed page snapshots.

use codeferry_core::FerryError;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::element_query::{parse_selector, text_content};

static TITLE: Lazy<Selector> = Lazy::new(|| parse_selector("title").expect("valid built-in selector"));

/// One parsed snapshot of a page.
///
/// `scraper::Html` is not `Send`, so a document lives on the task that parsed
/// it; only owned results leave.
pub struct PageDocument {
    url: String,
    title: String,
    html: Html,
}

impl PageDocument {
    /// Parse `html_text` loaded from `url`. The title falls back to the
    /// document's `<title>` when not given.
    pub fn parse(url: &str, html_text: &str, title: Option<&str>) -> Result<Self, FerryError> {
        url::Url::parse(url).map_err(|e| FerryError::InvalidUrl(format!("{url}: {e}")))?;
        let html = Html::parse_document(html_text);
        let title = match title {
            Some(t) => t.trim().to_string(),
            None => html
                .select(&TITLE)
                .next()
                .map(|t| text_content(&t).trim().to_string())
                .unwrap_or_default(),
        };
        Ok(Self { url: url.to_string(), title, html })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn html(&self) -> &Html {
        &self.html
    }
}
