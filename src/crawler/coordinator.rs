//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Opening and closing the scan session
//! - Loading robots.txt for the seed origin
//! - Dispatching fetches to a bounded worker pool, spaced by the request delay
//! - Folding results back into the frontier, storage and progress stream
//! - Honouring pause, resume and cancellation between iterations

use crate::config::Config;
use crate::crawler::control::CrawlControl;
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::crawler::progress::{CrawlObserver, CrawlSummary, NoopObserver, ScanProgress};
use crate::crawler::session::{close_session, open_session};
use crate::robots::{fetch_robots, is_allowed, ParsedRobots};
use crate::state::ScanState;
use crate::storage::{SessionStatus, Storage};
use crate::url::normalize_url;
use crate::SwallowError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

type FetchOutcome = (QueuedUrl, FetchedPage);

/// Runs one fetch on its own task and pairs the result with its queue entry
///
/// A panic inside the fetch degrades to the same status-0 stub a transport
/// failure produces, so every dispatched URL yields a page.
async fn guarded_fetch<F>(queued: QueuedUrl, session_id: i64, fetch: F) -> FetchOutcome
where
    F: Future<Output = FetchedPage> + Send + 'static,
{
    let fetched = match tokio::spawn(fetch).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::error!("Fetch task for {} failed: {}", queued.url, e);
            FetchedPage::failed(&queued.url, session_id, queued.depth)
        }
    };
    (queued, fetched)
}

/// What woke the crawl loop up
enum LoopEvent {
    Cancelled,
    Fetched(Option<Result<FetchOutcome, tokio::task::JoinError>>),
    Idle,
}

/// Drives one scan session from seed to terminal state
///
/// The frontier, visited set and counters are owned by the loop; fetch
/// workers only return results.
pub struct Crawler<S: Storage> {
    config: Config,
    storage: S,
    fetcher: PageFetcher,
    control: CrawlControl,
    observer: Arc<dyn CrawlObserver>,
    state: ScanState,
}

impl<S: Storage> Crawler<S> {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    /// * `storage` - Where sessions and pages are persisted
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(SwallowError)` - The HTTP client could not be built
    pub fn new(config: Config, storage: S) -> Result<Self, SwallowError> {
        let fetcher = PageFetcher::from_config(&config)?;
        Ok(Self {
            config,
            storage,
            fetcher,
            control: CrawlControl::new(),
            observer: Arc::new(NoopObserver),
            state: ScanState::Starting,
        })
    }

    /// Replaces the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Uses an externally created control handle
    pub fn with_control(mut self, control: CrawlControl) -> Self {
        self.control = control;
        self
    }

    /// A handle for pausing, resuming or cancelling this crawl
    pub fn control(&self) -> CrawlControl {
        self.control.clone()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn transition(&mut self, next: ScanState) -> Result<(), SwallowError> {
        if !self.state.can_transition_to(next) {
            return Err(SwallowError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Scan state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the scan to completion, cancellation or failure
    ///
    /// The session record is created before any fetch and finalized on
    /// every exit path. A storage failure finalizes the session as `Failed`
    /// (best effort) and is returned.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The scan reached `Completed` or `Stopped`
    /// * `Err(SwallowError)` - The scan aborted
    pub async fn run(&mut self) -> Result<CrawlSummary, SwallowError> {
        if self.state != ScanState::Starting {
            return Err(SwallowError::InvalidTransition {
                from: self.state,
                to: ScanState::Running,
            });
        }

        let seed = normalize_url(&self.config.crawler.seed_url)?;
        let agent = self.config.user_agent.name.clone();

        let session = open_session(&mut self.storage, &seed, &agent)?;
        self.observer.on_session_started(session.id);

        let robots = fetch_robots(
            self.fetcher.client(),
            &seed,
            self.config.crawler.max_redirects,
        )
        .await;
        self.transition(ScanState::Running)?;

        let frontier = Frontier::with_seed(seed, self.config.crawler.max_depth);
        let mut scanned = 0;
        let outcome = self
            .crawl_loop(session.id, frontier, &robots, &mut scanned)
            .await;

        let final_state = match outcome {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("Scan session {} aborted: {}", session.id, e);
                self.state = ScanState::Failed;
                if let Err(close_err) =
                    close_session(&mut self.storage, session.id, SessionStatus::Failed, scanned)
                {
                    tracing::error!(
                        "Could not mark session {} as failed: {}",
                        session.id,
                        close_err
                    );
                }
                return Err(e);
            }
        };

        self.transition(final_state)?;
        let status = SessionStatus::from_scan_state(final_state);
        close_session(&mut self.storage, session.id, status, scanned)?;

        let summary = CrawlSummary {
            session_id: session.id,
            status,
            pages_scanned: scanned,
        };
        self.observer.on_finished(&summary);
        Ok(summary)
    }

    /// The frontier loop
    ///
    /// # Returns
    ///
    /// The terminal state the loop ended in (`Completed` or `Stopped`)
    async fn crawl_loop(
        &mut self,
        session_id: i64,
        mut frontier: Frontier,
        robots: &ParsedRobots,
        scanned: &mut u32,
    ) -> Result<ScanState, SwallowError> {
        let max_pages = self.config.crawler.max_pages as usize;
        let concurrency = self.config.crawler.concurrent_requests.max(1) as usize;
        let poll_interval = Duration::from_millis(self.config.crawler.pause_poll_interval_ms);
        let request_delay = Duration::from_millis(self.config.crawler.request_delay_ms);
        let agent = self.config.user_agent.name.clone();
        let cancel = self.control.cancellation_token();

        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
        let mut next_dispatch = Instant::now();

        let terminal = loop {
            if self.control.is_cancelled() {
                break ScanState::Stopped;
            }

            let paused = self.control.is_paused();
            if paused && self.state == ScanState::Running {
                self.transition(ScanState::Paused)?;
                tracing::info!("Scan paused");
            } else if !paused && self.state == ScanState::Paused {
                self.transition(ScanState::Running)?;
                tracing::info!("Scan resumed");
            }

            let has_slot = |in_flight: usize| {
                in_flight < concurrency && (*scanned as usize) + in_flight < max_pages
            };

            if !paused {
                while has_slot(in_flight.len()) && Instant::now() >= next_dispatch {
                    let Some(next) = frontier.pop() else {
                        break;
                    };
                    if !frontier.mark_visited(&next.url) {
                        tracing::debug!("Skipping already visited {}", next.url);
                        continue;
                    }
                    if !is_allowed(robots, &next.url, &agent) {
                        tracing::info!("Disallowed by robots.txt: {}", next.url);
                        continue;
                    }

                    tracing::debug!("Dispatching {} (depth {})", next.url, next.depth);
                    let fetcher = self.fetcher.clone();
                    let url = next.url.clone();
                    let depth = next.depth;
                    in_flight.spawn(guarded_fetch(next, session_id, async move {
                        fetcher.fetch(&url, session_id, depth).await
                    }));
                    next_dispatch = Instant::now() + request_delay;
                }
            }

            // Work is waiting but the request delay has not elapsed yet
            let throttled = !paused
                && !frontier.is_empty()
                && has_slot(in_flight.len())
                && Instant::now() < next_dispatch;

            if !paused && !throttled && in_flight.is_empty() {
                if *scanned as usize >= max_pages {
                    tracing::info!("Page cap of {} reached", max_pages);
                } else {
                    tracing::info!("Frontier exhausted");
                }
                break ScanState::Completed;
            }

            let event = tokio::select! {
                _ = cancel.cancelled() => LoopEvent::Cancelled,
                joined = in_flight.join_next(), if !in_flight.is_empty() => {
                    LoopEvent::Fetched(joined)
                }
                _ = tokio::time::sleep(poll_interval), if paused => LoopEvent::Idle,
                _ = tokio::time::sleep_until(next_dispatch), if throttled => LoopEvent::Idle,
            };

            match event {
                LoopEvent::Cancelled | LoopEvent::Idle => continue,
                LoopEvent::Fetched(joined) => {
                    self.fold_result(joined, &mut frontier, scanned)?;
                }
            }
        };

        if !in_flight.is_empty() {
            tracing::info!("Waiting for {} in-flight fetches", in_flight.len());
        }
        while let Some(joined) = in_flight.join_next().await {
            self.fold_result(Some(joined), &mut frontier, scanned)?;
        }

        Ok(terminal)
    }

    /// Applies one completed fetch: expand, persist, count, report
    ///
    /// The scanned counter only moves once the page is stored, so a storage
    /// failure leaves it equal to the number of persisted rows.
    fn fold_result(
        &mut self,
        joined: Option<Result<FetchOutcome, tokio::task::JoinError>>,
        frontier: &mut Frontier,
        scanned: &mut u32,
    ) -> Result<(), SwallowError> {
        let (queued, mut fetched) = match joined {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => {
                tracing::error!("Fetch worker failed: {}", e);
                return Ok(());
            }
            None => return Ok(()),
        };

        if fetched.is_expandable() {
            let depth = queued.depth + 1;
            for link in fetched.internal_links() {
                match normalize_url(&link.url) {
                    Ok(url) => {
                        frontier.enqueue(url, depth);
                    }
                    Err(e) => tracing::debug!("Not enqueuing {}: {}", link.url, e),
                }
            }
        } else if fetched.page.status_code == 0 {
            tracing::warn!("Recorded failed fetch for {}", queued.url);
        }

        fetched.page.discovery_order = queued.discovery_order;
        let page_id = self
            .storage
            .insert_page(&fetched.page, &fetched.links, &fetched.images)?;
        fetched.page.id = Some(page_id);
        *scanned += 1;

        self.observer.on_progress(&ScanProgress {
            scanned_count: *scanned,
            queue_count: frontier.len(),
            total_known_urls: frontier.known_count(),
            current_url: queued.url.to_string(),
            latest_page: fetched.page,
        });

        Ok(())
    }
}
