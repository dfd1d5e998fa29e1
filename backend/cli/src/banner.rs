//! On-screen banners for watch mode.
//!
//! At most one banner is visible. A new banner replaces the current one; each
//! banner stays for `banner_ms`, fades for `fade_ms`, then clears itself
//! unless something newer took its place.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use codeferry_config::NotifierConfig;
use codeferry_core::Notifier;
use tracing::debug;

use crate::terminal_output::{supports_color, BG_GREEN, BG_RED, BOLD, DIM, RESET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    Visible,
    Fading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: u64,
    pub message: String,
    pub is_error: bool,
    pub phase: BannerPhase,
}

#[derive(Default)]
struct BannerState {
    current: Option<Banner>,
    next_id: u64,
}

type Output = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Clone)]
pub struct BannerNotifier {
    visible_for: Duration,
    fade_for: Duration,
    color: bool,
    state: Arc<Mutex<BannerState>>,
    out: Output,
}

impl BannerNotifier {
    pub fn new(config: &NotifierConfig) -> Self {
        Self::with_output(config, Box::new(std::io::stderr()), supports_color())
    }

    pub fn with_output(config: &NotifierConfig, out: Box<dyn Write + Send>, color: bool) -> Self {
        Self {
            visible_for: Duration::from_millis(config.banner_ms),
            fade_for: Duration::from_millis(config.fade_ms),
            color,
            state: Arc::new(Mutex::new(BannerState::default())),
            out: Arc::new(Mutex::new(out)),
        }
    }

    /// The banner on screen right now, if any.
    pub fn current(&self) -> Option<Banner> {
        self.state.lock().ok().and_then(|s| s.current.clone())
    }

    fn render(&self, banner: &Banner) {
        let line = match (self.color, banner.phase, banner.is_error) {
            (false, BannerPhase::Visible, true) => format!("[error] {}", banner.message),
            (false, BannerPhase::Visible, false) => format!("[ok] {}", banner.message),
            (false, BannerPhase::Fading, _) => String::new(),
            (true, BannerPhase::Visible, true) => format!("{BG_RED}{BOLD} {} {RESET}", banner.message),
            (true, BannerPhase::Visible, false) => format!("{BG_GREEN}{BOLD} {} {RESET}", banner.message),
            (true, BannerPhase::Fading, _) => format!("{DIM} {} {RESET}", banner.message),
        };
        if line.is_empty() {
            return;
        }
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }

    /// Move banner `id` to `phase`, or clear it, if it is still current.
    fn advance(&self, id: u64, phase: Option<BannerPhase>) -> bool {
        let updated = {
            let Ok(mut state) = self.state.lock() else {
                return false;
            };
            if state.current.as_ref().map(|b| b.id) != Some(id) {
                return false;
            }
            match phase {
                Some(phase) => state.current.as_mut().map(|b| {
                    b.phase = phase;
                    b.clone()
                }),
                None => {
                    state.current = None;
                    None
                }
            }
        };
        if let Some(banner) = updated {
            self.render(&banner);
        }
        true
    }
}

impl Notifier for BannerNotifier {
    fn notify(&self, message: &str, is_error: bool) {
        let banner = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if let Some(old) = state.current.take() {
                debug!(id = old.id, "Replacing banner");
            }
            state.next_id += 1;
            let banner = Banner {
                id: state.next_id,
                message: message.to_string(),
                is_error,
                phase: BannerPhase::Visible,
            };
            state.current = Some(banner.clone());
            banner
        };
        self.render(&banner);

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let this = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(this.visible_for).await;
            if this.advance(banner.id, Some(BannerPhase::Fading)) {
                tokio::time::sleep(this.fade_for).await;
                this.advance(banner.id, None);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn notifier() -> (BannerNotifier, Capture) {
        let capture = Capture::default();
        let notifier = BannerNotifier::with_output(&NotifierConfig::default(), Box::new(capture.clone()), false);
        (notifier, capture)
    }

    #[tokio::test(start_paused = true)]
    async fn banner_fades_then_clears() {
        let (banners, capture) = notifier();
        banners.notify("Code sent successfully!", false);
        assert_eq!(banners.current().unwrap().phase, BannerPhase::Visible);

        tokio::time::sleep(Duration::from_millis(3_050)).await;
        assert_eq!(banners.current().unwrap().phase, BannerPhase::Fading);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(banners.current().is_none());

        let text = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "[ok] Code sent successfully!\n");
    }

    #[tokio::test(start_paused = true)]
    async fn newer_banner_replaces_and_outlives_older() {
        let (banners, _) = notifier();
        banners.notify("first", false);
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        banners.notify("second", true);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let current = banners.current().unwrap();
        assert_eq!(current.message, "second");
        assert!(current.is_error);
        assert_eq!(current.phase, BannerPhase::Visible);
    }

    #[test]
    fn works_without_a_runtime() {
        let (banners, _) = notifier();
        banners.notify("no runtime", true);
        assert_eq!(banners.current().unwrap().message, "no runtime");
    }
}
