//! Config validation: schema checks with user-friendly error messages.

use crate::schema::FerryConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &FerryConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_service(config, &mut report);
    validate_retry(config, &mut report);
    validate_scan(config, &mut report);
    validate_notifier(config, &mut report);
    validate_platforms(config, &mut report);
    report
}

fn validate_service(config: &FerryConfig, report: &mut ValidationReport) {
    match url::Url::parse(&config.service.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => report.error(
            "service.baseUrl",
            format!("Unsupported scheme '{}'; use http or https", url.scheme()),
        ),
        Err(e) => report.error("service.baseUrl", format!("Not a valid URL: {e}")),
    }
    if config.service.request_timeout_ms == 0 {
        report.error("service.requestTimeoutMs", "requestTimeoutMs must be > 0");
    }
}

fn validate_retry(config: &FerryConfig, report: &mut ValidationReport) {
    let retry = &config.retry;
    if retry.max_attempts == 0 {
        report.error("retry.maxAttempts", "maxAttempts must be >= 1");
    }
    if retry.max_attempts > 10 {
        report.warn(
            "retry.maxAttempts",
            format!("{} attempts with exponential backoff can take a very long time", retry.max_attempts),
        );
    }
    if retry.deadline_ms == Some(0) {
        report.error("retry.deadlineMs", "deadlineMs must be > 0 when set");
    }
}

fn validate_scan(config: &FerryConfig, report: &mut ValidationReport) {
    let scan = &config.scan;
    if scan.interval_ms == 0 {
        report.error("scan.intervalMs", "intervalMs must be > 0");
    } else if scan.interval_ms < 500 {
        report.warn("scan.intervalMs", "Scanning more than twice a second is rarely useful");
    }
    if scan.debounce_ms == 0 {
        report.warn("scan.debounceMs", "debounceMs of 0 re-scans on every mutation");
    }
    if scan.min_code_length == 0 {
        report.error("scan.minCodeLength", "minCodeLength must be >= 1");
    }
    if scan.shortcut.trim().is_empty() {
        report.error("scan.shortcut", "shortcut cannot be empty");
    }
}

fn validate_notifier(config: &FerryConfig, report: &mut ValidationReport) {
    if config.notifier.banner_ms == 0 {
        report.error("notifier.bannerMs", "bannerMs must be > 0");
    }
}

fn validate_platforms(config: &FerryConfig, report: &mut ValidationReport) {
    for (i, platform) in config.platforms.iter().enumerate() {
        let path = format!("platforms[{i}]");
        if platform.name.trim().is_empty() {
            report.error(format!("{path}.name"), "Platform name cannot be empty");
        }
        if platform.name == "generic" {
            if !platform.hosts.is_empty() {
                report.warn(format!("{path}.hosts"), "Hosts on the generic entry are ignored");
            }
            if platform.selectors.is_empty() {
                report.warn(format!("{path}.selectors"), "Empty generic override keeps built-in selectors");
            }
        }
        for host in &platform.hosts {
            if host.contains("://") || host.contains('/') {
                report.error(
                    format!("{path}.hosts"),
                    format!("'{host}' must be a bare hostname like 'example.com'"),
                );
            }
        }
        if platform.selectors.iter().any(|s| s.trim().is_empty()) {
            report.error(format!("{path}.selectors"), "Selectors cannot be empty strings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PlatformOverride;

    #[test]
    fn default_config_is_valid() {
        let report = validate(&FerryConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn bad_base_url_is_error() {
        let mut cfg = FerryConfig::default();
        cfg.service.base_url = "ftp://localhost".into();
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "service.baseUrl");
    }

    #[test]
    fn zero_attempts_and_zero_min_length_are_errors() {
        let mut cfg = FerryConfig::default();
        cfg.retry.max_attempts = 0;
        cfg.scan.min_code_length = 0;
        let report = validate(&cfg);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"retry.maxAttempts"));
        assert!(paths.contains(&"scan.minCodeLength"));
    }

    #[test]
    fn platform_host_with_scheme_is_error() {
        let mut cfg = FerryConfig::default();
        cfg.platforms.push(PlatformOverride {
            name: "gitea".into(),
            hosts: vec!["https://gitea.com".into()],
            selectors: vec![".markup pre code".into()],
        });
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert!(report.errors[0].path.starts_with("platforms[0]"));
    }
}
