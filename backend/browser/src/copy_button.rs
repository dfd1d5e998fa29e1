//! Copy Button Detection
//!
//! Finds the page's own "copy" buttons and resolves which code each one
//! copies. Resolution depends on the platform's markup.

use codeferry_core::normalize_code;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use crate::document::PageDocument;
use crate::element_query::{
    attr_contains_ignore_case, class_attr_contains, closest, first_descendant, has_class,
    parent_element, parse_selector, tag_is, text_content, ElementKey, PRE, SVG,
};
use crate::error::ExtractionError;

static ANY: Lazy<Selector> = Lazy::new(|| parse_selector("*").expect("valid built-in selector"));

/// A detected copy button.
#[derive(Debug, Clone)]
pub struct CopyButton<'a> {
    pub element: ElementRef<'a>,
    pub key: ElementKey,
}

pub fn is_copy_button(el: &ElementRef<'_>) -> bool {
    if has_class(el, "js-clipboard-copy") || class_attr_contains(el, "copy") {
        return true;
    }
    if tag_is(el, "button") {
        let v = el.value();
        if v.attr("aria-label") == Some("Copy code")
            || v.attr("data-state") == Some("copy")
            || first_descendant(*el, &SVG).is_some()
        {
            return true;
        }
    }
    attr_contains_ignore_case(el, "aria-label", "copy") || attr_contains_ignore_case(el, "title", "copy")
}

/// Copy buttons in document order. A match nested inside another match (an
/// icon inside its button) is not reported separately.
pub fn copy_buttons(doc: &PageDocument) -> Vec<CopyButton<'_>> {
    doc.html()
        .select(&ANY)
        .filter(is_copy_button)
        .filter(|el| {
            !el.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| is_copy_button(&a))
        })
        .map(|element| CopyButton { key: ElementKey::of(&element), element })
        .collect()
}

fn pre_within(container: Option<ElementRef<'_>>) -> Option<ElementRef<'_>> {
    container.and_then(|c| if tag_is(&c, "pre") { Some(c) } else { first_descendant(c, &PRE) })
}

fn container_code<'a>(button: ElementRef<'a>, platform: &str) -> Option<ElementRef<'a>> {
    let start = parent_element(button)?;
    match platform {
        "github" => pre_within(
            closest(start, |e| has_class(e, "highlight"))
                .or_else(|| closest(start, |e| has_class(e, "Box-row"))),
        ),
        "claude" => pre_within(closest(start, |e| has_class(e, "prose")))
            .or_else(|| closest(start, |e| has_class(e, "whitespace-pre-wrap")))
            .or_else(|| {
                if first_descendant(button, &SVG).is_some() {
                    pre_within(closest(start, |e| tag_is(e, "div")))
                } else {
                    None
                }
            }),
        "chatgpt" => pre_within(
            closest(start, |e| has_class(e, "markdown"))
                .or_else(|| closest(start, |e| has_class(e, "code-block"))),
        ),
        _ => pre_within(closest(start, |e| {
            has_class(e, "code-block") || has_class(e, "highlight") || class_attr_contains(e, "code")
        }))
        .or_else(|| closest(start, |e| tag_is(e, "pre"))),
    }
}

/// The code a button copies: the platform's container lookup, else the
/// parent element's text.
pub fn resolve_code(button: &CopyButton<'_>, platform: &str) -> Result<String, ExtractionError> {
    let source = container_code(button.element, platform)
        .or_else(|| parent_element(button.element))
        .ok_or_else(|| ExtractionError::NoCodeContainer { key: button.key.clone() })?;

    let code = normalize_code(&text_content(&source));
    if code.is_empty() {
        return Err(ExtractionError::EmptyCode { key: button.key.clone() });
    }
    Ok(code)
}
