/// User-facing feedback surface.
///
/// Calls are fire-and-forget: implementations render and return immediately,
/// any dismissal happens in the background.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, is_error: bool);
}

/// Notifier that only logs. Used by one-shot commands and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, message: &str, is_error: bool) {
        if is_error {
            tracing::warn!(%message, "notification");
        } else {
            tracing::info!(%message, "notification");
        }
    }
}
