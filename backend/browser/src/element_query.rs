//! Element Queries
//!
//! DOM helpers over `scraper` element references: ancestor walks in the style
//! of `Element.closest`, class inspection, normalized text, and stable keys
//! used to mark elements as instrumented across snapshots.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use codeferry_core::FerryError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use serde::Serialize;

pub(crate) static PRE: Lazy<Selector> = Lazy::new(|| Selector::parse("pre").expect("valid built-in selector"));
pub(crate) static SVG: Lazy<Selector> = Lazy::new(|| Selector::parse("svg").expect("valid built-in selector"));

/// Parse a user- or registry-supplied selector.
pub fn parse_selector(css: &str) -> Result<Selector, FerryError> {
    Selector::parse(css).map_err(|e| FerryError::InvalidSelector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Nearest element, starting with `el` itself, for which `pred` holds.
pub fn closest<'a>(el: ElementRef<'a>, pred: impl Fn(&ElementRef<'a>) -> bool) -> Option<ElementRef<'a>> {
    if pred(&el) {
        return Some(el);
    }
    el.ancestors().filter_map(ElementRef::wrap).find(|a| pred(a))
}

/// First descendant matching `selector`, excluding `el` itself.
pub fn first_descendant<'a>(el: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    el.select(selector).find(|found| found.id() != el.id())
}

pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

pub fn tag_is(el: &ElementRef<'_>, name: &str) -> bool {
    el.value().name().eq_ignore_ascii_case(name)
}

pub fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// `[class*="needle"]` semantics: substring of the raw class attribute.
pub fn class_attr_contains(el: &ElementRef<'_>, needle: &str) -> bool {
    el.value().attr("class").is_some_and(|c| c.contains(needle))
}

pub fn attr_contains_ignore_case(el: &ElementRef<'_>, attr: &str, needle: &str) -> bool {
    el.value()
        .attr(attr)
        .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase()))
}

pub fn class_names(el: &ElementRef<'_>) -> Vec<String> {
    el.value().classes().map(str::to_string).collect()
}

/// Concatenated text content, like `Node.textContent`.
pub fn text_content(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

/// Outer HTML cut to at most `limit` bytes on a char boundary.
pub fn outer_html_limited(el: &ElementRef<'_>, limit: usize) -> String {
    let html = el.html();
    if html.len() <= limit {
        return html;
    }
    let mut end = limit;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    html[..end].to_string()
}

/// Stable identity of an element within a page: its tag/index path from the
/// root plus a hash of its text. Equal keys across two snapshots mean "the
/// same element, unchanged".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementKey(String);

impl ElementKey {
    pub fn of(el: &ElementRef<'_>) -> Self {
        let mut segments = Vec::new();
        let mut node = Some(**el);
        while let Some(current) = node {
            if let Some(element) = current.value().as_element() {
                let index = current.prev_siblings().filter(|s| s.value().is_element()).count();
                segments.push(format!("{}[{}]", element.name(), index));
            }
            node = current.parent();
        }
        segments.reverse();

        let mut hasher = DefaultHasher::new();
        text_content(el).hash(&mut hasher);
        Self(format!("{}#{:016x}", segments.join("/"), hasher.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
