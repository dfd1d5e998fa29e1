//! Config file read/write.

use crate::schema::FerryConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the codeferry config directory.
/// Priority: `CODEFERRY_CONFIG_DIR` env > `~/.codeferry/` > `./.codeferry`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CODEFERRY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".codeferry"),
        None => PathBuf::from(".codeferry"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the raw YAML document as a JSON value tree.
///
/// Returns an empty object if the file doesn't exist (first run).
pub async fn load_raw(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        warn!(path = %path.display(), "Config file is empty; using defaults");
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let value: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value)
}

/// Write config to disk atomically (write to temp file, rename).
///
/// The previous file, if any, is kept as `config.yaml.bak`.
pub async fn write_config(config: &FerryConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        let bak = path.with_extension("yaml.bak");
        if let Err(e) = fs::copy(path, &bak).await {
            warn!("Failed to create backup {}: {}", bak.display(), e);
        }
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let value = load_raw(&dir.path().join("nope.yaml")).await.unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_then_read_back_and_keep_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());

        let mut cfg = FerryConfig::default();
        cfg.scan.interval_ms = 1234;
        write_config(&cfg, &path).await.unwrap();
        cfg.scan.interval_ms = 4321;
        write_config(&cfg, &path).await.unwrap();

        let value = load_raw(&path).await.unwrap();
        assert_eq!(value["scan"]["intervalMs"], 4321);
        assert!(path.with_extension("yaml.bak").exists());
    }
}
