//! Config defaults: constants plus the post-load pass that fills values
//! which depend on the environment.

use std::path::Path;

use crate::schema::FerryConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 1 s base gives the 2 s / 4 s schedule between three attempts.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 5_000;

pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

pub const DEFAULT_MIN_CODE_LENGTH: usize = 2;

pub const DEFAULT_CONTEXT_LIMIT: usize = 4_096;

pub const DEFAULT_SHORTCUT: &str = "Ctrl+Shift+E";

pub const DEFAULT_BANNER_MS: u64 = 3_000;

pub const DEFAULT_FADE_MS: u64 = 300;

pub const DEFAULT_LOG_LEVEL: &str = "info";

const KNOWN_LANGUAGES: &[&str] = &[
    "js", "python", "java", "cpp", "ruby", "php", "html", "css", "sql", "bash", "shell",
    "typescript",
];

const BLOCK_CONTAINER_CLASSES: &[&str] = &["code-block", "highlight", "notion-code-block"];

pub fn default_known_languages() -> Vec<String> {
    KNOWN_LANGUAGES.iter().map(|s| s.to_string()).collect()
}

pub fn default_block_container_classes() -> Vec<String> {
    BLOCK_CONTAINER_CLASSES.iter().map(|s| s.to_string()).collect()
}

/// User agent reported to the conversion service.
pub fn default_user_agent() -> String {
    format!("codeferry/{}", env!("CARGO_PKG_VERSION"))
}

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: FerryConfig, config_dir: &Path) -> FerryConfig {
    let config = apply_service_defaults(config);
    let config = apply_scan_defaults(config);
    apply_logging_defaults(config, config_dir)
}

fn apply_service_defaults(mut config: FerryConfig) -> FerryConfig {
    if config.service.user_agent.as_deref().map(str::trim).unwrap_or("").is_empty() {
        config.service.user_agent = Some(default_user_agent());
    }
    let trimmed = config.service.base_url.trim_end_matches('/').to_string();
    config.service.base_url = trimmed;
    config
}

/// Empty lists in the file mean "use the built-in list", and language tags are
/// compared lowercase.
fn apply_scan_defaults(mut config: FerryConfig) -> FerryConfig {
    if config.scan.known_languages.is_empty() {
        config.scan.known_languages = default_known_languages();
    }
    config.scan.known_languages = config
        .scan
        .known_languages
        .iter()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect();
    if config.scan.block_container_classes.is_empty() {
        config.scan.block_container_classes = default_block_container_classes();
    }
    config
}

fn apply_logging_defaults(mut config: FerryConfig, config_dir: &Path) -> FerryConfig {
    if config.logging.level.is_none() {
        config.logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if config.logging.dir.is_none() {
        config.logging.dir = Some(config_dir.join("logs"));
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn fills_user_agent_and_log_dir() {
        let cfg = apply_all_defaults(FerryConfig::default(), Path::new("/tmp/cf"));
        assert!(cfg.service.user_agent.unwrap().starts_with("codeferry/"));
        assert_eq!(cfg.logging.dir, Some(PathBuf::from("/tmp/cf/logs")));
        assert_eq!(cfg.logging.level.as_deref(), Some("info"));
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = FerryConfig::default();
        cfg.service.user_agent = Some("custom/1".into());
        cfg.logging.level = Some("debug".into());
        let cfg = apply_all_defaults(cfg, Path::new("/tmp"));
        assert_eq!(cfg.service.user_agent.as_deref(), Some("custom/1"));
        assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn empty_language_list_restored_and_lowercased() {
        let mut cfg = FerryConfig::default();
        cfg.scan.known_languages = vec![];
        let cfg = apply_all_defaults(cfg, Path::new("/tmp"));
        assert_eq!(cfg.scan.known_languages, default_known_languages());

        let mut cfg = FerryConfig::default();
        cfg.scan.known_languages = vec![" Rust ".into(), "".into()];
        let cfg = apply_all_defaults(cfg, Path::new("/tmp"));
        assert_eq!(cfg.scan.known_languages, vec!["rust"]);
    }

    #[test]
    fn trailing_slash_removed_from_base_url() {
        let mut cfg = FerryConfig::default();
        cfg.service.base_url = "http://localhost:5000/".into();
        let cfg = apply_all_defaults(cfg, Path::new("/tmp"));
        assert_eq!(cfg.service.base_url, "http://localhost:5000");
    }
}
