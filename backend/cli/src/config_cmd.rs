//! Print (and optionally persist) the effective configuration.

use std::path::Path;

use anyhow::{Context, Result};
use codeferry_config::{write_config, FerryConfig};

use crate::terminal_output::note_success;

pub async fn run(config: &FerryConfig, path: &Path, write: bool) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to render config")?;
    print!("{yaml}");
    if write {
        write_config(config, path).await?;
        note_success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}
