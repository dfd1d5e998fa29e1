//! Structured Logger
//!
//! Wraps `tracing` to provide a console layer, optional daily-rotated NDJSON
//! file output, and environment-based level control.

use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "codeferry.log";

/// Initialize the global logger.
///
/// `RUST_LOG` wins over `level`. Console output goes to stderr so that
/// command output on stdout stays machine-readable. When `log_dir` is given,
/// JSON lines are also written to `<log_dir>/codeferry.log.YYYY-MM-DD`.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logger(log_dir: Option<&Path>, level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            Some(fmt::layer().json().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}
