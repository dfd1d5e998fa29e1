//! Environment handling for config values.
//!
//! Two passes run at load time:
//! - `${VAR_NAME}` references inside string values are substituted
//!   (`$${VAR}` stays as the literal `${VAR}`); only `[A-Z_][A-Z0-9_]*` names match.
//! - `CODEFERRY_*` variables override individual typed fields.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::schema::FerryConfig;

pub const ENV_BASE_URL: &str = "CODEFERRY_BASE_URL";
pub const ENV_SCAN_INTERVAL_MS: &str = "CODEFERRY_SCAN_INTERVAL_MS";
pub const ENV_LOG_LEVEL: &str = "CODEFERRY_LOG_LEVEL";

/// `$` optional second `$` (escape), then `{NAME}`.
static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\$?)\{([A-Z_][A-Z0-9_]*)\}").expect("valid env ref pattern"));

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references using the given map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }
    let mut missing: Option<MissingEnvVarError> = None;
    let out = ENV_REF.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(v) => v.clone(),
            None => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });
    if let Some(err) = missing {
        bail!(err);
    }
    Ok(out.into_owned())
}

/// Apply `CODEFERRY_*` overrides from the process environment.
pub fn apply_env_overrides(config: FerryConfig) -> FerryConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

pub fn apply_env_overrides_with(
    mut config: FerryConfig,
    env: &HashMap<String, String>,
) -> FerryConfig {
    if let Some(url) = env.get(ENV_BASE_URL).filter(|v| !v.is_empty()) {
        debug!(base_url = %url, "Base URL overridden from environment");
        config.service.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(raw) = env.get(ENV_SCAN_INTERVAL_MS) {
        match raw.parse::<u64>() {
            Ok(ms) => config.scan.interval_ms = ms,
            Err(_) => tracing::warn!(var = ENV_SCAN_INTERVAL_MS, value = %raw, "Ignoring non-numeric override"),
        }
    }
    if let Some(level) = env.get(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
        config.logging.level = Some(level.clone());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"service": {"baseUrl": "http://${CONVERTER_HOST}:5000"}});
        let result = resolve_env_vars_with(&v, &env(&[("CONVERTER_HOST", "10.0.0.2")])).unwrap();
        assert_eq!(result["service"]["baseUrl"], "http://10.0.0.2:5000");
    }

    #[test]
    fn error_names_missing_var_and_path() {
        let v = json!({"scan": {"shortcut": "${MISSING_CHORD}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("MISSING_CHORD"));
        assert!(err.contains("scan.shortcut"));
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"a": "$${KEEP_ME}"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["a"], "${KEEP_ME}");
    }

    #[test]
    fn lowercase_names_are_not_references() {
        let v = json!({"a": "${not_a_var}", "b": [1, "${X}"]});
        let result = resolve_env_vars_with(&v, &env(&[("X", "y")])).unwrap();
        assert_eq!(result["a"], "${not_a_var}");
        assert_eq!(result["b"][1], "y");
    }

    #[test]
    fn overrides_apply_and_bad_numbers_are_ignored() {
        let cfg = apply_env_overrides_with(
            FerryConfig::default(),
            &env(&[
                (ENV_BASE_URL, "http://converter:8000/"),
                (ENV_SCAN_INTERVAL_MS, "soon"),
                (ENV_LOG_LEVEL, "debug"),
            ]),
        );
        assert_eq!(cfg.service.base_url, "http://converter:8000");
        assert_eq!(cfg.scan.interval_ms, crate::defaults::DEFAULT_SCAN_INTERVAL_MS);
        assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
    }
}
