//! One-shot text delivery.

use anyhow::{bail, Context, Result};
use codeferry_config::FerryConfig;
use codeferry_delivery::{DeliveryClient, Payload};
use tokio::io::AsyncReadExt;

use crate::terminal_output::{note_error, note_success};

pub async fn run(config: &FerryConfig, text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        bail!("Nothing to send");
    }

    let client = DeliveryClient::from_config(config)?;
    match client.deliver(&Payload::Text(text)).await {
        Ok(response) => {
            note_success(response.message().unwrap_or("Code sent successfully!"));
            Ok(())
        }
        Err(e) => {
            note_error(&e.to_string());
            Err(e.into())
        }
    }
}
