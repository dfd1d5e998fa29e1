//! Watch mode: the watcher loop, a change probe, banners, and a stdin
//! console driving user actions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use codeferry_config::{default_user_agent, FerryConfig};
use codeferry_delivery::{bridge, DeliveryClient, Dispatch};
use codeferry_watcher::{watch_channels, ListedAffordance, UserAction, Watcher, WatcherSettings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::banner::BannerNotifier;
use crate::console::{parse_line, ConsoleCommand, HELP};
use crate::scan_cmd::build_extractor;
use crate::source::{open_source, spawn_mutation_probe};
use crate::terminal_output::{note_error, note_info, note_warn, render_table, Column};

/// Floor for the change probe period.
const MIN_PROBE_MS: u64 = 250;

pub async fn run(config: &FerryConfig, source: &str, page_url: Option<String>, use_bridge: bool) -> Result<()> {
    let settings = WatcherSettings::from_config(config)?;
    let extractor = build_extractor(config)?;
    let user_agent = config.service.user_agent.clone().unwrap_or_else(default_user_agent);
    let page = open_source(
        source,
        page_url,
        &user_agent,
        Duration::from_millis(config.service.request_timeout_ms),
    )?;

    let client = DeliveryClient::from_config(config)?;
    let dispatch: Arc<dyn Dispatch> = if use_bridge {
        let (host, handle) = bridge(client);
        tokio::spawn(host.run());
        info!("Deliveries routed through the bridge");
        Arc::new(handle)
    } else {
        Arc::new(client)
    };

    let notifier = Arc::new(BannerNotifier::new(&config.notifier));
    let watcher = Watcher::new(Arc::clone(&page), extractor, dispatch, notifier, settings.clone());
    let listing = watcher.affordance_listing();
    let (inputs, channels, shutdown) = watch_channels();

    let probe_every = Duration::from_millis(config.scan.debounce_ms.max(MIN_PROBE_MS));
    let probe = spawn_mutation_probe(page, probe_every, inputs.mutations.clone());
    let console = tokio::spawn(console_loop(inputs.actions.clone(), listing, shutdown.clone()));
    drop(inputs);

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_shutdown.send(true);
        }
    });

    note_info(&format!(
        "Watching {source} every {}s; shortcut {}. {HELP}",
        settings.interval.as_secs_f32(),
        settings.shortcut
    ));
    watcher.run(channels).await;

    probe.abort();
    console.abort();
    Ok(())
}

async fn console_loop(
    actions: mpsc::Sender<UserAction>,
    listing: watch::Receiver<Vec<ListedAffordance>>,
    shutdown: watch::Sender<bool>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::List)) => {
                let rows = listing.borrow().clone();
                print_listing(&rows);
            }
            Ok(Some(ConsoleCommand::Quit)) => {
                let _ = shutdown.send(true);
                break;
            }
            Ok(Some(ConsoleCommand::Action(action))) => {
                if actions.send(action).await.is_err() {
                    break;
                }
            }
            Err(message) => note_error(&message),
        }
    }
}

fn print_listing(listing: &[ListedAffordance]) {
    if listing.is_empty() {
        note_warn("No affordances attached yet");
        return;
    }
    let columns = [Column::right("Id"), Column::left("Kind"), Column::left("Label").max(70)];
    let rows: Vec<Vec<String>> = listing
        .iter()
        .map(|a| vec![a.id.to_string(), a.kind.as_str().to_string(), a.label.clone()])
        .collect();
    print!("{}", render_table(&columns, &rows));
}
