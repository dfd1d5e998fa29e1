//! codeferry runtime configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Every section carries its own
//! defaults so a partial file (or no file at all) yields a usable config.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::defaults::{
    default_block_container_classes, default_known_languages, DEFAULT_BANNER_MS,
    DEFAULT_BASE_DELAY_MS, DEFAULT_BASE_URL, DEFAULT_CONTEXT_LIMIT, DEFAULT_DEBOUNCE_MS,
    DEFAULT_FADE_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_CODE_LENGTH, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_SCAN_INTERVAL_MS, DEFAULT_SHORTCUT,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryConfig {
    /// Conversion service endpoint and request shape
    #[serde(default)]
    pub service: ServiceConfig,

    /// Retry/backoff applied to every delivery path
    #[serde(default)]
    pub retry: RetryConfig,

    /// Scanning, extraction, and watcher timing
    #[serde(default)]
    pub scan: ScanConfig,

    /// On-screen banner timing
    #[serde(default)]
    pub notifier: NotifierConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra or replacement platform entries for the selector registry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<PlatformOverride>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// How a batch of blocks is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// `POST /code-blocks` with a JSON body.
    #[default]
    Json,
    /// `POST /convert` multipart, JSON batch in the `payload` field.
    Form,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub batch_mode: BatchMode,

    /// Sent as the User-Agent header and in batch metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            batch_mode: BatchMode::default(),
            user_agent: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait after failed attempt `n` is `baseDelayMs * 2^n`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on one delivery including all retries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            deadline_ms: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    #[serde(default = "default_scan_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_min_code_length")]
    pub min_code_length: usize,

    #[serde(default = "default_true")]
    pub capture_context: bool,

    /// Max bytes of context HTML kept per block
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,

    #[serde(default = "default_known_languages")]
    pub known_languages: Vec<String>,

    /// Class names that mark an element as a block-level code container
    #[serde(default = "default_block_container_classes")]
    pub block_container_classes: Vec<String>,

    /// Manual extraction chord, e.g. "Ctrl+Shift+E"
    #[serde(default = "default_shortcut")]
    pub shortcut: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_code_length: DEFAULT_MIN_CODE_LENGTH,
            capture_context: true,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            known_languages: default_known_languages(),
            block_container_classes: default_block_container_classes(),
            shortcut: default_shortcut(),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifier / logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifierConfig {
    #[serde(default = "default_banner_ms")]
    pub banner_ms: u64,

    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self { banner_ms: DEFAULT_BANNER_MS, fade_ms: DEFAULT_FADE_MS }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// "trace" | "debug" | "info" | "warn" | "error", or any EnvFilter directive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for rolling NDJSON logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Platforms
// ---------------------------------------------------------------------------

/// Registry entry from config. A name that already exists replaces that
/// entry's non-empty lists; a new name is appended after the built-ins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOverride {
    pub name: String,

    #[serde(default)]
    pub hosts: Vec<String>,

    #[serde(default)]
    pub selectors: Vec<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_scan_interval_ms() -> u64 {
    DEFAULT_SCAN_INTERVAL_MS
}
fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}
fn default_min_code_length() -> usize {
    DEFAULT_MIN_CODE_LENGTH
}
fn default_true() -> bool {
    true
}
fn default_context_limit() -> usize {
    DEFAULT_CONTEXT_LIMIT
}
fn default_shortcut() -> String {
    DEFAULT_SHORTCUT.to_string()
}
fn default_banner_ms() -> u64 {
    DEFAULT_BANNER_MS
}
fn default_fade_ms() -> u64 {
    DEFAULT_FADE_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "service:\n  baseUrl: http://127.0.0.1:9000\nscan:\n  intervalMs: 1000\n";
        let cfg: FerryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.service.base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.service.batch_mode, BatchMode::Json);
        assert_eq!(cfg.scan.interval_ms, 1000);
        assert_eq!(cfg.scan.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert!(cfg.scan.known_languages.contains(&"python".to_string()));
    }

    #[test]
    fn parses_platform_overrides() {
        let yaml = r#"
platforms:
  - name: gitea
    hosts: [gitea.com]
    selectors: [".markup pre code"]
service:
  batchMode: form
"#;
        let cfg: FerryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.platforms.len(), 1);
        assert_eq!(cfg.platforms[0].hosts, vec!["gitea.com"]);
        assert_eq!(cfg.service.batch_mode, BatchMode::Form);
    }
}
