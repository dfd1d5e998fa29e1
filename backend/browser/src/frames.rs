//! Marked containers: readme/markdown/article regions outlined with a green
//! border in their inline style.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::element_query::parse_selector;

static CONTAINERS: Lazy<Selector> = Lazy::new(|| {
    parse_selector(r#"[class*="readme"], [class*="markdown"], article, .markdown-body"#)
        .expect("valid built-in selector")
});

static BORDER_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bborder(?:-(?:top|right|bottom|left))?(?:-color)?\s*:\s*([^;]+)")
        .expect("valid border pattern")
});

static RGB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})")
        .expect("valid rgb pattern")
});

static HEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").expect("valid hex color pattern")
});

/// Container elements in document order.
pub fn container_candidates<'a>(root: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    root.select(&CONTAINERS)
}

/// True when the inline style declares a border whose color is green.
pub fn has_green_border(el: &ElementRef<'_>) -> bool {
    el.value()
        .attr("style")
        .is_some_and(|style| BORDER_DECL.captures_iter(style).any(|c| value_is_green(&c[1])))
}

fn value_is_green(value: &str) -> bool {
    if let Some(c) = RGB.captures(value) {
        let channel = |i: usize| c[i].parse::<u16>().unwrap_or(0);
        return is_green(channel(1), channel(2), channel(3));
    }
    if let Some(c) = HEX.captures(value) {
        let hex = &c[1];
        let digits: Vec<u16> = if hex.len() == 3 {
            hex.chars()
                .map(|ch| ch.to_digit(16).unwrap_or(0) as u16 * 17)
                .collect()
        } else {
            (0..3)
                .map(|i| u16::from_str_radix(&hex[i * 2..i * 2 + 2], 16).unwrap_or(0))
                .collect()
        };
        return is_green(digits[0], digits[1], digits[2]);
    }
    value
        .split_whitespace()
        .any(|word| matches!(word.to_lowercase().as_str(), "green" | "lime" | "limegreen" | "seagreen"))
}

fn is_green(r: u16, g: u16, b: u16) -> bool {
    g > r && g > b
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn built_in_patterns_compile() {
        Lazy::force(&CONTAINERS);
        Lazy::force(&BORDER_DECL);
        Lazy::force(&RGB);
        Lazy::force(&HEX);
        Lazy::force(&crate::element_query::PRE);
        Lazy::force(&crate::element_query::SVG);
    }

    fn green(style: &str) -> bool {
        let html = Html::parse_fragment(&format!(r#"<article style="{style}">x</article>"#));
        let el = container_candidates(html.root_element()).next().unwrap();
        has_green_border(&el)
    }

    #[test]
    fn recognizes_green_colors() {
        assert!(green("border: 2px solid rgb(0, 128, 0)"));
        assert!(green("border-color: #0f0"));
        assert!(green("padding: 4px; border-left: 3px solid #2ea043;"));
        assert!(green("border: 1px dashed green"));
        assert!(green("border: 1px solid rgba(10, 200, 10, 0.5)"));
    }

    #[test]
    fn rejects_other_colors_and_properties() {
        assert!(!green("border: 1px solid rgb(200, 0, 0)"));
        assert!(!green("border: 1px solid #ccc"));
        assert!(!green("color: green"));
        assert!(!green(""));
    }

    #[test]
    fn selects_container_kinds() {
        let html = Html::parse_fragment(
            r#"<div class="readme-box"></div><div class="markdown-body"></div><article></article><section></section>"#,
        );
        assert_eq!(container_candidates(html.root_element()).count(), 3);
    }
}
