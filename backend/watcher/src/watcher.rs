//! DOM Watcher
//!
//! One event loop per page. A tick interval drives periodic extraction and
//! delivers only blocks not seen on the previous tick. Mutations are
//! debounced into instrumentation passes that attach affordances to new
//! elements. User actions bypass the debounce. Deliveries run on their own
//! tasks so the loop never waits on the service.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use codeferry_browser::{Affordance, AffordanceAction, ElementKey, Extractor, PageDocument};
use codeferry_config::{default_user_agent, FerryConfig};
use codeferry_core::{BatchPayload, CodeBlock, FerryError, Notifier, PageMetadata};
use codeferry_delivery::{DeliveryError, Dispatch, Payload};
use codeferry_logging::{CaptureEvent, EventLogger};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::action::{AffordanceId, ListedAffordance, Mutation, UserAction};
use crate::chord::KeyChord;
use crate::source::{PageSnapshot, PageSource};

pub const SUCCESS_MESSAGE: &str = "Code sent successfully!";
pub const NO_BLOCKS_MESSAGE: &str = "No code blocks found on this page";
pub const NO_CODE_MESSAGE: &str = "No code found to extract";

const CHANNEL_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Scanning,
    Debounced,
}

#[derive(Debug, Clone)]
pub struct WatcherSettings {
    pub interval: Duration,
    pub debounce: Duration,
    pub shortcut: KeyChord,
    /// Copied into batch metadata
    pub user_agent: String,
}

impl WatcherSettings {
    pub fn from_config(config: &FerryConfig) -> Result<Self, FerryError> {
        Ok(Self {
            interval: Duration::from_millis(config.scan.interval_ms.max(1)),
            debounce: Duration::from_millis(config.scan.debounce_ms),
            shortcut: config.scan.shortcut.parse()?,
            user_agent: config.service.user_agent.clone().unwrap_or_else(default_user_agent),
        })
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self::from_config(&FerryConfig::default()).unwrap_or_else(|_| Self {
            interval: Duration::from_secs(5),
            debounce: Duration::from_millis(100),
            shortcut: KeyChord { ctrl: true, shift: true, key: "e".into(), ..KeyChord::default() },
            user_agent: default_user_agent(),
        })
    }
}

/// Sending side of a watcher's inputs.
#[derive(Clone)]
pub struct WatchInputs {
    pub mutations: mpsc::Sender<Mutation>,
    pub actions: mpsc::Sender<UserAction>,
}

/// Receiving side, consumed by [`Watcher::run`].
pub struct WatchChannels {
    pub mutations: mpsc::Receiver<Mutation>,
    pub actions: mpsc::Receiver<UserAction>,
    pub shutdown: watch::Receiver<bool>,
}

/// Build the input channels plus the shutdown switch.
pub fn watch_channels() -> (WatchInputs, WatchChannels, watch::Sender<bool>) {
    let (mutations_tx, mutations) = mpsc::channel(CHANNEL_BUFFER);
    let (actions_tx, actions) = mpsc::channel(CHANNEL_BUFFER);
    let (shutdown_tx, shutdown) = watch::channel(false);
    (
        WatchInputs { mutations: mutations_tx, actions: actions_tx },
        WatchChannels { mutations, actions, shutdown },
        shutdown_tx,
    )
}

pub struct Watcher {
    source: Arc<dyn PageSource>,
    extractor: Extractor,
    dispatch: Arc<dyn Dispatch>,
    notifier: Arc<dyn Notifier>,
    settings: WatcherSettings,
    state: WatchState,
    /// Codes seen on the last tick
    previous: HashSet<String>,
    /// Instrumented elements
    markers: HashMap<ElementKey, AffordanceId>,
    affordances: BTreeMap<AffordanceId, Affordance>,
    next_id: u32,
    page: Option<(String, String)>,
    listing: watch::Sender<Vec<ListedAffordance>>,
    inflight: JoinSet<()>,
}

impl Watcher {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: Extractor,
        dispatch: Arc<dyn Dispatch>,
        notifier: Arc<dyn Notifier>,
        settings: WatcherSettings,
    ) -> Self {
        let (listing, _) = watch::channel(Vec::new());
        Self {
            source,
            extractor,
            dispatch,
            notifier,
            settings,
            state: WatchState::Idle,
            previous: HashSet::new(),
            markers: HashMap::new(),
            affordances: BTreeMap::new(),
            next_id: 1,
            page: None,
            listing,
            inflight: JoinSet::new(),
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Live view of the attached affordances.
    pub fn affordance_listing(&self) -> watch::Receiver<Vec<ListedAffordance>> {
        self.listing.subscribe()
    }

    /// Run until shutdown fires or both input channels close. In-flight
    /// deliveries are awaited before returning.
    pub async fn run(mut self, channels: WatchChannels) {
        let WatchChannels { mut mutations, mut actions, mut shutdown } = channels;
        info!(interval_ms = self.settings.interval.as_millis() as u64, "Watcher started");

        self.instrument().await;
        self.tick().await;

        let mut ticker = time::interval_at(Instant::now() + self.settings.interval, self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut debounce_until: Option<Instant> = None;
        let (mut mutations_open, mut actions_open, mut shutdown_open) = (true, true, true);

        loop {
            tokio::select! {
                changed = shutdown.changed(), if shutdown_open => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => break,
                        Ok(()) => {}
                        Err(_) => shutdown_open = false,
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
                mutation = mutations.recv(), if mutations_open => match mutation {
                    Some(Mutation) => {
                        debounce_until = Some(Instant::now() + self.settings.debounce);
                        self.state = WatchState::Debounced;
                    }
                    None => mutations_open = false,
                },
                action = actions.recv(), if actions_open => match action {
                    Some(action) => self.handle_action(action).await,
                    None => actions_open = false,
                },
                _ = time::sleep_until(debounce_until.unwrap_or_else(Instant::now)), if debounce_until.is_some() => {
                    debounce_until = None;
                    self.instrument().await;
                    self.state = WatchState::Idle;
                }
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Delivery task failed");
                    }
                }
            }

            if !mutations_open && !actions_open {
                debug!("All watcher inputs closed");
                break;
            }
        }

        while self.inflight.join_next().await.is_some() {}
        info!("Watcher stopped");
    }

    fn settle(&mut self, previous_state: WatchState) {
        self.state = match previous_state {
            WatchState::Debounced => WatchState::Debounced,
            _ => WatchState::Idle,
        };
    }

    async fn read_page(&mut self) -> Option<PageSnapshot> {
        match self.source.snapshot().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Could not read page");
                None
            }
        }
    }

    /// Periodic scan: deliver blocks whose code was absent last tick.
    pub async fn tick(&mut self) {
        let prior = self.state;
        self.state = WatchState::Scanning;
        let Some(snapshot) = self.read_page().await else {
            self.settle(prior);
            return;
        };

        match self.extract(&snapshot) {
            Ok(blocks) => {
                let fresh: Vec<CodeBlock> =
                    blocks.iter().filter(|b| !self.previous.contains(b.code())).cloned().collect();
                self.previous = blocks.iter().map(|b| b.code().to_string()).collect();

                if fresh.is_empty() {
                    debug!(total = blocks.len(), "No new code blocks");
                } else {
                    info!(new = fresh.len(), total = blocks.len(), "Found new code blocks");
                    for block in &fresh {
                        EventLogger::log_event(
                            block.source_url(),
                            CaptureEvent::captured(block.platform(), block.language(), block.code()),
                        );
                    }
                    let batch = BatchPayload::new(fresh, self.metadata());
                    self.spawn_delivery(Payload::Blocks(batch), false);
                }
            }
            Err(e) => warn!(error = %e, "Skipping scan"),
        }
        self.settle(prior);
    }

    /// Attach affordances to elements not yet instrumented.
    pub async fn instrument(&mut self) {
        let Some(snapshot) = self.read_page().await else {
            return;
        };
        let found = match self.affordances_of(&snapshot) {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Skipping instrumentation");
                return;
            }
        };

        let present: HashSet<ElementKey> = found.iter().map(|a| a.key.clone()).collect();
        for affordance in found {
            if self.markers.contains_key(&affordance.key) {
                continue;
            }
            let id = AffordanceId(self.next_id);
            self.next_id += 1;
            EventLogger::log_event(
                &snapshot.url,
                CaptureEvent::Instrumented {
                    kind: affordance.kind().as_str().to_string(),
                    key: affordance.key.to_string(),
                },
            );
            self.markers.insert(affordance.key.clone(), id);
            self.affordances.insert(id, affordance);
        }

        self.markers.retain(|key, _| present.contains(key));
        let markers = &self.markers;
        self.affordances.retain(|_, a| markers.contains_key(&a.key));
        self.publish_listing();
    }

    fn publish_listing(&self) {
        let rows = self
            .affordances
            .iter()
            .map(|(id, a)| ListedAffordance { id: *id, kind: a.kind(), label: a.label() })
            .collect();
        self.listing.send_replace(rows);
    }

    pub async fn handle_action(&mut self, action: UserAction) {
        match action {
            UserAction::KeyPress(chord) => {
                if !self.settings.shortcut.matches(&chord) {
                    debug!(%chord, "Ignoring key press");
                    return;
                }
                info!(%chord, "Manual extraction triggered");
                let Some(snapshot) = self.read_page().await else {
                    self.notifier.notify("Could not read the page", true);
                    return;
                };
                match self.extract(&snapshot) {
                    Ok(blocks) if !blocks.is_empty() => {
                        let batch = BatchPayload::new(blocks, self.metadata());
                        self.spawn_delivery(Payload::Blocks(batch), true);
                    }
                    Ok(_) => self.notifier.notify(NO_BLOCKS_MESSAGE, true),
                    Err(e) => {
                        warn!(error = %e, "Manual extraction failed");
                        self.notifier.notify(NO_BLOCKS_MESSAGE, true);
                    }
                }
            }
            UserAction::Click(id) => {
                let Some(affordance) = self.affordances.get(&id) else {
                    warn!(%id, "No affordance with this id");
                    self.notifier.notify(NO_CODE_MESSAGE, true);
                    return;
                };
                let payload = match &affordance.action {
                    AffordanceAction::CopyCode(code) => Payload::Text(code.clone()),
                    AffordanceAction::UploadContent(content) => {
                        Payload::Upload { content: content.clone(), page: self.metadata() }
                    }
                    AffordanceAction::SendBlock(block) => {
                        let page = PageMetadata {
                            url: block.source_url().to_string(),
                            title: block.page_title().to_string(),
                            ..self.metadata()
                        };
                        Payload::Blocks(BatchPayload::new(vec![block.clone()], page))
                    }
                };
                if payload.is_empty() {
                    self.notifier.notify(NO_CODE_MESSAGE, true);
                    return;
                }
                self.spawn_delivery(payload, true);
            }
            UserAction::ClipboardCopy(text) => {
                if text.trim().is_empty() {
                    warn!("Ignoring empty clipboard copy");
                    return;
                }
                self.spawn_delivery(Payload::Text(text), true);
            }
        }
    }

    fn extract(&mut self, snapshot: &PageSnapshot) -> Result<Vec<CodeBlock>, FerryError> {
        let doc = PageDocument::parse(&snapshot.url, &snapshot.html, snapshot.title.as_deref())?;
        self.page = Some((doc.url().to_string(), doc.title().to_string()));
        Ok(self.extractor.extract(&doc))
    }

    fn affordances_of(&mut self, snapshot: &PageSnapshot) -> Result<Vec<Affordance>, FerryError> {
        let doc = PageDocument::parse(&snapshot.url, &snapshot.html, snapshot.title.as_deref())?;
        self.page = Some((doc.url().to_string(), doc.title().to_string()));
        Ok(self.extractor.affordances(&doc))
    }

    fn metadata(&self) -> PageMetadata {
        let (url, title) = self.page.clone().unwrap_or_default();
        PageMetadata { url, title, timestamp: Utc::now(), user_agent: self.settings.user_agent.clone() }
    }

    fn spawn_delivery(&mut self, payload: Payload, announce_success: bool) {
        let dispatch = Arc::clone(&self.dispatch);
        let notifier = Arc::clone(&self.notifier);
        self.inflight.spawn(async move {
            match dispatch.dispatch(payload).await {
                Ok(response) if announce_success => {
                    notifier.notify(response.message().unwrap_or(SUCCESS_MESSAGE), false)
                }
                Ok(_) => {}
                Err(e) => notifier.notify(&failure_message(&e), true),
            }
        });
    }
}

fn failure_message(error: &DeliveryError) -> String {
    match error {
        DeliveryError::Rejected { message, .. } => message.clone(),
        DeliveryError::Exhausted { attempts, .. } => format!("Failed to send code after {attempts} attempts"),
        other => other.to_string(),
    }
}
