//! Platform Registry
//!
//! Maps a page host to a named platform and the ordered selector list used to
//! find code on that platform. Lookup walks entries in insertion order and
//! compares hosts on label boundaries, so `lab.com` never claims `gitlab.com`.

use codeferry_config::PlatformOverride;
use codeferry_core::{FerryError, GENERIC_PLATFORM};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEntry {
    pub name: String,
    pub hosts: Vec<String>,
    pub selectors: Vec<String>,
}

impl PlatformEntry {
    pub fn new(name: &str, hosts: &[&str], selectors: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            hosts: hosts.iter().map(|h| h.to_lowercase()).collect(),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        self.hosts.iter().any(|pattern| host_matches(host, pattern))
    }
}

/// `host` equals `pattern` or is a subdomain of it.
pub fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern
        || host
            .strip_suffix(pattern)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    entries: Vec<PlatformEntry>,
    generic: Vec<String>,
}

impl PlatformRegistry {
    /// Build a registry. The generic fallback list must not be empty.
    pub fn new(entries: Vec<PlatformEntry>, generic: Vec<String>) -> Result<Self, FerryError> {
        if generic.is_empty() {
            return Err(FerryError::ConfigError(
                "the generic selector set cannot be empty".to_string(),
            ));
        }
        Ok(Self { entries, generic })
    }

    /// The built-in table of chat tools, code hosts, notebooks and blogs.
    pub fn builtin() -> Self {
        let entries = vec![
            PlatformEntry::new("discord", &["discord.com"], &[".markup-2BOw-j pre code", ".markup-2BOw-j code"]),
            PlatformEntry::new("claude", &["claude.ai"], &[".prose pre code", ".prose code"]),
            PlatformEntry::new(
                "chatgpt",
                &["chat.openai.com", "chatgpt.com"],
                &[".markdown-renderer pre code", ".markdown-renderer code"],
            ),
            PlatformEntry::new("github", &["github.com"], &[".highlight pre code", ".markdown-body pre code"]),
            PlatformEntry::new(
                "stackoverflow",
                &["stackoverflow.com"],
                &[".post-text pre code", ".answercell pre code"],
            ),
            PlatformEntry::new(
                "stackexchange",
                &["stackexchange.com"],
                &[".post-text pre code", ".answer pre code"],
            ),
            PlatformEntry::new("gitlab", &["gitlab.com"], &[".code.highlight pre code", ".markdown-body pre code"]),
            PlatformEntry::new("bitbucket", &["bitbucket.org"], &[".code pre code", ".markup pre code"]),
            PlatformEntry::new("slack", &["slack.com"], &[".c-mrkdwn__pre code", ".c-mrkdwn code"]),
            PlatformEntry::new(
                "teams",
                &["teams.microsoft.com"],
                &[".message-content pre code", ".markdown pre code"],
            ),
            PlatformEntry::new("gitter", &["gitter.im"], &[".chat-item pre code", ".markdown-body pre code"]),
            PlatformEntry::new(
                "notion",
                &["notion.so"],
                &[".notion-code-block pre code", ".notion-markdown pre code"],
            ),
            PlatformEntry::new(
                "obsidian",
                &["obsidian.md"],
                &[".markdown-preview-view pre code", ".cm-line pre code"],
            ),
            PlatformEntry::new("jupyter", &["jupyter.org"], &[".cell_output pre code", ".input_area pre code"]),
            PlatformEntry::new("kaggle", &["kaggle.com"], &[".code-block pre code", ".markdown-cell-code pre code"]),
            PlatformEntry::new(
                "colab",
                &["colab.google.com", "colab.research.google.com"],
                &[".code pre code", ".outputtext pre code"],
            ),
            PlatformEntry::new("codepen", &["codepen.io"], &[".code-wrap pre code", ".preview-wrap pre code"]),
            PlatformEntry::new("jsfiddle", &["jsfiddle.net"], &[".CodeMirror pre code", ".result pre code"]),
            PlatformEntry::new("replit", &["replit.com"], &[".monaco-editor pre code", ".markdown pre code"]),
            PlatformEntry::new("hashnode", &["hashnode.com"], &[".article pre code", ".markdown pre code"]),
            PlatformEntry::new("devto", &["dev.to"], &[".article-body pre code", ".crayons-article pre code"]),
            PlatformEntry::new("medium", &["medium.com"], &[".graf pre code", ".markup--pre code"]),
        ];
        let generic = [
            "pre code",
            r#"code[class*="language-"]"#,
            r#"code[class*="hljs"]"#,
            ".markdown pre code",
            ".markdown-body pre code",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        Self { entries, generic }
    }

    /// Apply config entries: an existing name gets its non-empty lists
    /// replaced, a new name is appended, `generic` replaces the fallback set.
    pub fn with_overrides(mut self, overrides: &[PlatformOverride]) -> Result<Self, FerryError> {
        for o in overrides {
            let name = o.name.trim();
            if name.is_empty() {
                return Err(FerryError::ConfigError("platform name cannot be empty".to_string()));
            }
            if name == GENERIC_PLATFORM {
                if !o.selectors.is_empty() {
                    self.generic = o.selectors.clone();
                }
                continue;
            }
            let hosts: Vec<String> = o.hosts.iter().map(|h| h.trim().to_lowercase()).collect();
            match self.entries.iter_mut().find(|e| e.name == name) {
                Some(entry) => {
                    if !hosts.is_empty() {
                        entry.hosts = hosts;
                    }
                    if !o.selectors.is_empty() {
                        entry.selectors = o.selectors.clone();
                    }
                    debug!(platform = name, "Platform entry overridden");
                }
                None => {
                    self.entries.push(PlatformEntry {
                        name: name.to_string(),
                        hosts,
                        selectors: o.selectors.clone(),
                    });
                    debug!(platform = name, "Platform entry added");
                }
            }
        }
        Ok(self)
    }

    /// Platform for a page URL, or `"generic"`.
    pub fn detect_platform(&self, url: &str) -> &str {
        match url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
            Some(host) => self.detect_host(&host),
            None => GENERIC_PLATFORM,
        }
    }

    /// Platform for a bare hostname, or `"generic"`.
    pub fn detect_host(&self, host: &str) -> &str {
        let host = host.trim_end_matches('.').to_lowercase();
        self.entries
            .iter()
            .find(|e| e.matches_host(&host))
            .map(|e| e.name.as_str())
            .unwrap_or(GENERIC_PLATFORM)
    }

    /// Platform selectors followed by the generic fallback, first occurrence
    /// of each selector kept. Never empty.
    pub fn selectors_for(&self, platform: &str) -> Vec<String> {
        let specific = self
            .entries
            .iter()
            .find(|e| e.name == platform)
            .map(|e| e.selectors.as_slice())
            .unwrap_or_default();

        let mut out: Vec<String> = Vec::with_capacity(specific.len() + self.generic.len());
        for selector in specific.iter().chain(self.generic.iter()) {
            if !out.contains(selector) {
                out.push(selector.clone());
            }
        }
        out
    }

    pub fn platform_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_registered_hosts_and_subdomains() {
        let registry = PlatformRegistry::builtin();
        assert_eq!(registry.detect_platform("https://github.com/rust-lang/rust"), "github");
        assert_eq!(registry.detect_platform("https://gist.github.com/x"), "github");
        assert_eq!(registry.detect_platform("https://chat.openai.com/c/1"), "chatgpt");
        assert_eq!(registry.detect_platform("https://unix.stackexchange.com/q/1"), "stackexchange");
        assert_eq!(registry.detect_platform("https://DEV.TO/someone"), "devto");
    }

    #[test]
    fn unknown_or_unparseable_urls_are_generic() {
        let registry = PlatformRegistry::builtin();
        assert_eq!(registry.detect_platform("https://example.org/"), GENERIC_PLATFORM);
        assert_eq!(registry.detect_platform("not a url"), GENERIC_PLATFORM);
        assert_eq!(registry.detect_platform("file:///tmp/page.html"), GENERIC_PLATFORM);
    }

    #[test]
    fn matching_respects_label_boundaries() {
        assert!(host_matches("gitlab.com", "gitlab.com"));
        assert!(host_matches("docs.gitlab.com", "gitlab.com"));
        assert!(!host_matches("gitlab.com", "lab.com"));
        assert!(!host_matches("notgithub.com", "github.com"));

        let registry = PlatformRegistry::builtin()
            .with_overrides(&[PlatformOverride {
                name: "labco".into(),
                hosts: vec!["lab.com".into()],
                selectors: vec![".lab pre code".into()],
            }])
            .unwrap();
        assert_eq!(registry.detect_host("gitlab.com"), "gitlab");
        assert_eq!(registry.detect_host("www.lab.com"), "labco");
    }

    #[test]
    fn selectors_append_generic_without_duplicates() {
        let registry = PlatformRegistry::builtin();
        let selectors = registry.selectors_for("github");
        assert_eq!(selectors[0], ".highlight pre code");
        assert_eq!(selectors[2], "pre code");
        let count = selectors.iter().filter(|s| *s == ".markdown-body pre code").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn unknown_platform_gets_generic_set() {
        let registry = PlatformRegistry::builtin();
        let selectors = registry.selectors_for("nowhere");
        assert!(!selectors.is_empty());
        assert_eq!(selectors, registry.selectors_for(GENERIC_PLATFORM));
    }

    #[test]
    fn overrides_replace_and_append() {
        let registry = PlatformRegistry::builtin()
            .with_overrides(&[
                PlatformOverride {
                    name: "github".into(),
                    hosts: vec![],
                    selectors: vec![".blob-code pre".into()],
                },
                PlatformOverride {
                    name: "gitea".into(),
                    hosts: vec!["Gitea.COM".into()],
                    selectors: vec![".markup pre code".into()],
                },
            ])
            .unwrap();
        assert_eq!(registry.selectors_for("github")[0], ".blob-code pre");
        assert_eq!(registry.detect_host("gitea.com"), "gitea");
        assert_eq!(registry.platform_names().last(), Some("gitea"));
    }

    #[test]
    fn empty_generic_set_is_rejected() {
        assert!(PlatformRegistry::new(vec![], vec![]).is_err());
    }
}
