//! One-shot extraction.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use codeferry_browser::{Extractor, ExtractorSettings, PageDocument, PlatformRegistry};
use codeferry_config::{default_user_agent, FerryConfig};
use codeferry_core::CodeBlock;
use codeferry_logging::{CaptureEvent, EventLogger};

use crate::source::open_source;
use crate::terminal_output::{note_info, note_warn, render_table, Column};

pub fn build_extractor(config: &FerryConfig) -> Result<Extractor> {
    let registry = PlatformRegistry::builtin()
        .with_overrides(&config.platforms)
        .context("Invalid platform configuration")?;
    Ok(Extractor::new(Arc::new(registry), ExtractorSettings::from(&config.scan)))
}

pub async fn run(config: &FerryConfig, source: &str, page_url: Option<String>, json: bool) -> Result<()> {
    let extractor = build_extractor(config)?;
    let user_agent = config.service.user_agent.clone().unwrap_or_else(default_user_agent);
    let source = open_source(
        source,
        page_url,
        &user_agent,
        Duration::from_millis(config.service.request_timeout_ms),
    )?;
    let snapshot = source.snapshot().await?;

    let (platform, blocks) = {
        let doc = PageDocument::parse(&snapshot.url, &snapshot.html, snapshot.title.as_deref())?;
        let platform = extractor.registry().detect_platform(doc.url()).to_string();
        (platform, extractor.extract(&doc))
    };
    for block in &blocks {
        EventLogger::log_event(
            block.source_url(),
            CaptureEvent::captured(block.platform(), block.language(), block.code()),
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    if blocks.is_empty() {
        note_warn(&format!("No code blocks found on {} ({platform})", snapshot.url));
        return Ok(());
    }
    note_info(&format!("{} code block(s) on {} ({platform})", blocks.len(), snapshot.url));
    print!("{}", block_table(&blocks));
    Ok(())
}

fn block_table(blocks: &[CodeBlock]) -> String {
    let columns = [
        Column::right("#"),
        Column::left("Language"),
        Column::right("Chars"),
        Column::left("Code").max(60),
    ];
    let rows: Vec<Vec<String>> = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| {
            vec![
                (i + 1).to_string(),
                b.language().to_string(),
                b.code().chars().count().to_string(),
                b.code().to_string(),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}
