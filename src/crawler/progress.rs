//! Progress reporting
//!
//! The crawl loop reports to an injected [`CrawlObserver`] rather than any
//! process-wide broadcaster. Observers are called from the loop task only,
//! strictly after the page they describe has been fetched.

use crate::storage::{PageRecord, SessionStatus};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Snapshot emitted after every completed fetch
#[derive(Debug, Clone, PartialEq)]
pub struct ScanProgress {
    /// Pages fetched so far, including failed stubs
    pub scanned_count: u32,
    /// URLs waiting in the frontier
    pub queue_count: usize,
    /// Distinct URLs discovered so far (visited, in flight, or queued)
    pub total_known_urls: usize,
    /// The URL that was just processed
    pub current_url: String,
    /// The page record just produced
    pub latest_page: PageRecord,
}

/// Outcome of a finished crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub session_id: i64,
    pub status: SessionStatus,
    pub pages_scanned: u32,
}

/// Receives lifecycle and progress notifications from the crawl loop
pub trait CrawlObserver: Send + Sync {
    /// Fired once the session record exists, before the first fetch
    fn on_session_started(&self, _session_id: i64) {}

    /// Fired after each fetch (success or failure) has been persisted
    fn on_progress(&self, _progress: &ScanProgress) {}

    /// Fired after the session has been finalized
    fn on_finished(&self, _summary: &CrawlSummary) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {}

/// Event forwarded by [`ChannelObserver`]
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    SessionStarted { session_id: i64 },
    Progress(Box<ScanProgress>),
    Finished(CrawlSummary),
}

/// Observer that forwards every notification over an unbounded channel
///
/// Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<CrawlEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, UnboundedReceiver<CrawlEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CrawlObserver for ChannelObserver {
    fn on_session_started(&self, session_id: i64) {
        let _ = self.tx.send(CrawlEvent::SessionStarted { session_id });
    }

    fn on_progress(&self, progress: &ScanProgress) {
        let _ = self.tx.send(CrawlEvent::Progress(Box::new(progress.clone())));
    }

    fn on_finished(&self, summary: &CrawlSummary) {
        let _ = self.tx.send(CrawlEvent::Finished(*summary));
    }
}

/// Observer that writes progress lines through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn on_session_started(&self, session_id: i64) {
        tracing::info!("Scan session {} started", session_id);
    }

    fn on_progress(&self, progress: &ScanProgress) {
        tracing::info!(
            "[{}] {} {} ({:.0} ms) | queue: {} | known: {}",
            progress.scanned_count,
            progress.latest_page.status_code,
            progress.current_url,
            progress.latest_page.load_time_ms,
            progress.queue_count,
            progress.total_known_urls
        );
    }

    fn on_finished(&self, summary: &CrawlSummary) {
        tracing::info!(
            "Scan session {} finished: {} ({} pages)",
            summary.session_id,
            summary.status.to_db_string(),
            summary.pages_scanned
        );
    }
}
