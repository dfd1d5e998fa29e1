//! `codeferry-config` — runtime configuration management.
//!
//! Provides:
//! - Typed config schema (service, retry, scan, notifier, logging, platforms)
//! - YAML read/write with a single backup
//! - `${ENV_VAR}` substitution and `CODEFERRY_*` overrides
//! - Default value application
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::{apply_all_defaults, default_user_agent};
pub use env::{apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_raw, write_config};
pub use schema::{
    BatchMode, FerryConfig, LoggingConfig, NotifierConfig, PlatformOverride, RetryConfig,
    ScanConfig, ServiceConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, substitute env vars, apply defaults and overrides, then validate.
///
/// This is the main entry point for loading a config at runtime. Validation
/// warnings are logged; any validation error aborts the load.
pub async fn load_and_prepare(path: &Path) -> Result<FerryConfig> {
    let raw = load_raw(path).await?;
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;

    let config: FerryConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = apply_all_defaults(config, config_dir);
    let config = apply_env_overrides(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if let Some(first) = report.errors.first() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        bail!("{} config error(s); first: {}", report.errors.len(), first);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_and_prepare(&dir.path().join("config.yaml")).await.unwrap();
        assert_eq!(cfg.scan.interval_ms, defaults::DEFAULT_SCAN_INTERVAL_MS);
        assert_eq!(cfg.logging.dir, Some(dir.path().join("logs")));
    }

    #[tokio::test]
    async fn invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "retry:\n  maxAttempts: 0\n").await.unwrap();
        let err = load_and_prepare(&path).await.unwrap_err().to_string();
        assert!(err.contains("retry.maxAttempts"), "{err}");
    }
}
