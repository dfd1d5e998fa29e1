//! Block Extractor
//!
//! Turns a parsed page into an ordered, deduplicated list of code blocks
//! using the platform's selectors, and reports the affordances an
//! instrumentation pass attaches to the page.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use codeferry_config::{defaults, ScanConfig};
use codeferry_core::{normalize_code, BlockProvenance, CodeBlock};
use scraper::ElementRef;
use tracing::{debug, warn};

use crate::affordance::{Affordance, AffordanceAction};
use crate::copy_button::{copy_buttons, resolve_code};
use crate::document::PageDocument;
use crate::element_query::{
    class_names, closest, has_class, outer_html_limited, parent_element, parse_selector, tag_is,
    text_content, ElementKey,
};
use crate::frames::{container_candidates, has_green_border};
use crate::language::classify;
use crate::platform::PlatformRegistry;

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub min_code_length: usize,
    pub capture_context: bool,
    pub context_limit: usize,
    pub known_languages: Vec<String>,
    pub block_container_classes: Vec<String>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ExtractorSettings {
    fn from(scan: &ScanConfig) -> Self {
        let known_languages = if scan.known_languages.is_empty() {
            defaults::default_known_languages()
        } else {
            scan.known_languages.clone()
        };
        Self {
            min_code_length: scan.min_code_length.max(1),
            capture_context: scan.capture_context,
            context_limit: scan.context_limit,
            known_languages,
            block_container_classes: scan.block_container_classes.clone(),
        }
    }
}

pub struct Extractor {
    registry: Arc<PlatformRegistry>,
    settings: ExtractorSettings,
}

impl Extractor {
    pub fn new(registry: Arc<PlatformRegistry>, settings: ExtractorSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Every qualifying code block on the page, first occurrence of each
    /// distinct code kept, in selector-then-document order.
    pub fn extract(&self, doc: &PageDocument) -> Vec<CodeBlock> {
        self.located_blocks(doc).into_iter().map(|(_, block)| block).collect()
    }

    /// Send buttons for each extracted block, copy buttons with resolvable
    /// code, and green-framed containers with non-empty text.
    pub fn affordances(&self, doc: &PageDocument) -> Vec<Affordance> {
        let platform = self.registry.detect_platform(doc.url());
        let mut out: Vec<Affordance> = self
            .located_blocks(doc)
            .into_iter()
            .map(|(key, block)| Affordance { key, action: AffordanceAction::SendBlock(block) })
            .collect();

        for button in copy_buttons(doc) {
            match resolve_code(&button, platform) {
                Ok(code) => out.push(Affordance { key: button.key, action: AffordanceAction::CopyCode(code) }),
                Err(e) => warn!(url = doc.url(), error = %e, "Skipping copy button"),
            }
        }

        for container in container_candidates(doc.html().root_element()).filter(has_green_border) {
            let text = normalize_code(&text_content(&container));
            if text.is_empty() {
                continue;
            }
            out.push(Affordance {
                key: ElementKey::of(&container),
                action: AffordanceAction::UploadContent(text),
            });
        }

        let mut seen = HashSet::new();
        out.retain(|a| seen.insert(a.key.clone()));
        out
    }

    fn located_blocks(&self, doc: &PageDocument) -> Vec<(ElementKey, CodeBlock)> {
        let platform = self.registry.detect_platform(doc.url());
        let captured_at = Utc::now();
        let mut seen: HashSet<String> = HashSet::new();
        let mut blocks = Vec::new();

        for css in self.registry.selectors_for(platform) {
            let selector = match parse_selector(&css) {
                Ok(s) => s,
                Err(e) => {
                    warn!(%platform, error = %e, "Skipping invalid selector");
                    continue;
                }
            };

            for element in doc.html().select(&selector) {
                if !self.is_block_level(element) {
                    continue;
                }
                let provenance = BlockProvenance {
                    platform: platform.to_string(),
                    source_url: doc.url().to_string(),
                    page_title: doc.title().to_string(),
                    captured_at,
                };
                let Some(block) = CodeBlock::new(
                    &text_content(&element),
                    self.settings.min_code_length,
                    self.language_of(element),
                    provenance,
                    self.context_of(element),
                ) else {
                    continue;
                };
                if seen.insert(block.code().to_string()) {
                    blocks.push((ElementKey::of(&element), block));
                }
            }
        }

        debug!(url = doc.url(), %platform, count = blocks.len(), "Extracted code blocks");
        blocks
    }

    fn is_block_level(&self, element: ElementRef<'_>) -> bool {
        closest(element, |e| {
            tag_is(e, "pre")
                || e.value().attr("data-code-block").is_some()
                || self.settings.block_container_classes.iter().any(|c| has_class(e, c))
        })
        .is_some()
    }

    fn language_of(&self, element: ElementRef<'_>) -> String {
        let mut classes = class_names(&element);
        if let Some(parent) = parent_element(element) {
            classes.extend(class_names(&parent));
        }
        classify(&classes, &self.settings.known_languages)
    }

    fn context_of(&self, element: ElementRef<'_>) -> Option<String> {
        if !self.settings.capture_context {
            return None;
        }
        parent_element(element).map(|p| outer_html_limited(&p, self.settings.context_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(Arc::new(PlatformRegistry::builtin()), ExtractorSettings::default())
    }

    fn page(url: &str, body: &str) -> PageDocument {
        PageDocument::parse(url, &format!("<html><head><title>T</title></head><body>{body}</body></html>"), None)
            .unwrap()
    }

    #[test]
    fn github_page_yields_classified_blocks() {
        let doc = page(
            "https://github.com/a/b",
            r#"<pre><code class="language-python">def f(): pass</code></pre>
               <pre><code>x=1</code></pre>"#,
        );
        let blocks = extractor().extract(&doc);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].code(), "def f(): pass");
        assert_eq!(blocks[0].language(), "python");
        assert_eq!(blocks[1].code(), "x=1");
        assert_eq!(blocks[1].language(), "text");
        assert!(blocks.iter().all(|b| b.platform() == "github" && b.page_title() == "T"));
    }

    #[test]
    fn duplicates_and_short_snippets_are_dropped() {
        let doc = page(
            "https://example.com/",
            r#"<pre><code>same</code></pre><pre><code>same</code></pre><pre><code> a </code></pre>"#,
        );
        let blocks = extractor().extract(&doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].code(), "same");
    }

    #[test]
    fn inline_code_is_rejected() {
        let doc = page(
            "https://example.com/",
            r#"<p>use <code class="language-js">foo()</code> here</p>
               <div class="highlight"><code class="language-js">bar()</code></div>"#,
        );
        let blocks = extractor().extract(&doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].code(), "bar()");
        assert_eq!(blocks[0].language(), "js");
    }

    #[test]
    fn parent_classes_feed_the_classifier() {
        let doc = page("https://example.com/", r#"<pre class="bash"><code>ls -la</code></pre>"#);
        assert_eq!(extractor().extract(&doc)[0].language(), "bash");
    }

    #[test]
    fn extraction_is_idempotent() {
        let doc = page(
            "https://stackoverflow.com/q/1",
            r#"<div class="post-text"><pre><code>a = 1</code></pre><pre><code>b = 2</code></pre></div>"#,
        );
        let ex = extractor();
        let first: Vec<String> = ex.extract(&doc).iter().map(|b| b.code().to_string()).collect();
        let second: Vec<String> = ex.extract(&doc).iter().map(|b| b.code().to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn context_is_bounded() {
        let settings = ExtractorSettings { context_limit: 16, ..ExtractorSettings::default() };
        let ex = Extractor::new(Arc::new(PlatformRegistry::builtin()), settings);
        let doc = page("https://example.com/", r#"<pre><code>let long = 1;</code></pre>"#);
        let block = &ex.extract(&doc)[0];
        let context = block.context_html().unwrap();
        assert!(context.len() <= 16);
        assert!(context.starts_with("<pre>"));
    }

    #[test]
    fn context_can_be_disabled() {
        let settings = ExtractorSettings { capture_context: false, ..ExtractorSettings::default() };
        let ex = Extractor::new(Arc::new(PlatformRegistry::builtin()), settings);
        let doc = page("https://example.com/", r#"<pre><code>let x = 1;</code></pre>"#);
        assert!(ex.extract(&doc)[0].context_html().is_none());
    }

    #[test]
    fn invalid_override_selector_is_skipped() {
        let registry = PlatformRegistry::builtin()
            .with_overrides(&[codeferry_config::PlatformOverride {
                name: "github".into(),
                hosts: vec![],
                selectors: vec!["pre >>> code".into()],
            }])
            .unwrap();
        let ex = Extractor::new(Arc::new(registry), ExtractorSettings::default());
        let doc = page("https://github.com/a/b", r#"<pre><code>still found</code></pre>"#);
        assert_eq!(ex.extract(&doc).len(), 1);
    }

    #[test]
    fn affordances_cover_blocks_buttons_and_frames() {
        let doc = page(
            "https://github.com/a/b",
            r#"<div class="highlight"><pre><code>cargo test</code></pre><button class="js-clipboard-copy">Copy</button></div>
               <article style="border: 2px solid rgb(0, 160, 0)">Read me first</article>
               <article>plain</article>"#,
        );
        let affordances = extractor().affordances(&doc);
        let kinds: Vec<&str> = affordances.iter().map(|a| a.kind().as_str()).collect();
        assert_eq!(kinds, vec!["send_button", "copy_button", "marked_container"]);
        assert_eq!(affordances[1].action, AffordanceAction::CopyCode("cargo test".into()));
        assert_eq!(affordances[2].action, AffordanceAction::UploadContent("Read me first".into()));

        let again = extractor().affordances(&doc);
        let keys: Vec<_> = again.iter().map(|a| a.key.clone()).collect();
        assert_eq!(keys, affordances.iter().map(|a| a.key.clone()).collect::<Vec<_>>());
    }
}
