//! Language classification from element class names.

use codeferry_core::DEFAULT_LANGUAGE;

fn prefixed<'a>(class_names: &'a [String], prefix: &str) -> Option<&'a str> {
    class_names
        .iter()
        .filter_map(|c| c.strip_prefix(prefix))
        .find(|suffix| !suffix.is_empty())
}

/// Derive a lowercase language tag. `language-*` wins over `hljs-*`, which
/// wins over a bare known tag; anything else is `"text"`.
pub fn classify(class_names: &[String], known: &[String]) -> String {
    if let Some(lang) = prefixed(class_names, "language-") {
        return lang.to_lowercase();
    }
    if let Some(lang) = prefixed(class_names, "hljs-") {
        return lang.to_lowercase();
    }
    class_names
        .iter()
        .find(|c| known.iter().any(|k| k.eq_ignore_ascii_case(c)))
        .map(|c| c.to_lowercase())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn known() -> Vec<String> {
        classes(&["js", "python", "bash"])
    }

    #[test]
    fn language_prefix_wins() {
        assert_eq!(classify(&classes(&["hljs-ruby", "language-Rust"]), &known()), "rust");
    }

    #[test]
    fn hljs_prefix_before_known_tag() {
        assert_eq!(classify(&classes(&["python", "hljs-go"]), &known()), "go");
    }

    #[test]
    fn known_tag_is_case_insensitive() {
        assert_eq!(classify(&classes(&["wrapper", "BASH"]), &known()), "bash");
    }

    #[test]
    fn empty_suffix_is_ignored() {
        assert_eq!(classify(&classes(&["language-", "js"]), &known()), "js");
    }

    #[test]
    fn falls_back_to_text() {
        assert_eq!(classify(&classes(&["hljs", "foo"]), &known()), "text");
        assert_eq!(classify(&[], &known()), "text");
    }

    #[test]
    fn output_is_never_empty_or_uppercase() {
        for input in [vec!["language-CPP"], vec!["JS"], vec!["x"], vec![]] {
            let out = classify(&classes(&input), &known());
            assert!(!out.is_empty());
            assert_eq!(out, out.to_lowercase());
        }
    }
}
