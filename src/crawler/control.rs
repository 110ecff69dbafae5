//! Pause/resume and cancellation handle for a running crawl

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Cloneable handle shared between the crawl loop and its controller
///
/// Pausing stops new dispatches; fetches already in flight still complete.
/// Cancellation takes precedence over pause.
#[derive(Debug, Clone, Default)]
pub struct CrawlControl {
    paused: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl CrawlControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Flips the pause flag and returns the new value
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Requests a cooperative stop
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once [`CrawlControl::cancel`] has been called
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// The underlying token, for wiring into other shutdown paths
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
