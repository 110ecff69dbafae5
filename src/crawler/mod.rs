//! Crawler module for page fetching and scan orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with manual redirect handling
//! - HTML parsing for SEO signals, links and images
//! - The breadth-first frontier
//! - Scan session lifecycle, progress reporting and pause/cancel control
//! - Overall crawl coordination

mod control;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod progress;
mod session;

pub use control::CrawlControl;
pub use coordinator::Crawler;
pub use fetcher::{
    build_http_client, content_hash, get_following_redirects, FetchedPage, PageFetcher,
};
pub use frontier::{EnqueueOutcome, Frontier, QueuedUrl};
pub use parser::{analyze_html, PageAnalysis, OPTIMAL_DESCRIPTION_LEN, OPTIMAL_TITLE_LEN};
pub use progress::{
    ChannelObserver, CrawlEvent, CrawlObserver, CrawlSummary, NoopObserver, ScanProgress,
    TracingObserver,
};
pub use session::{close_session, open_session};
