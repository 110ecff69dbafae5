//! Storage module for persisting scan results
//!
//! This module handles all database operations for the crawl engine:
//! - SQLite database initialization and schema management
//! - Scan session records and their lifecycle fields
//! - Page records with their discovered links and images
//! - Read-back queries used by consumers (history, duplicate content)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::ScanState;

/// One crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSession {
    pub id: i64,
    pub base_url: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub total_pages_scanned: u32,
    pub user_agent: String,
    pub status: SessionStatus,
}

/// Persisted status of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Running,
    Completed,
    Stopped,
    Failed,
}

impl SessionStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Stopped => "Stopped",
            Self::Failed => "Failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "Running" => Some(Self::Running),
            "Completed" => Some(Self::Completed),
            "Stopped" => Some(Self::Stopped),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Maps a loop state onto the persisted status
    ///
    /// Live states (starting, running, paused) are all stored as `Running`.
    pub fn from_scan_state(state: ScanState) -> Self {
        match state {
            ScanState::Starting | ScanState::Running | ScanState::Paused => Self::Running,
            ScanState::Completed => Self::Completed,
            ScanState::Stopped => Self::Stopped,
            ScanState::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One fetched resource with its extracted signals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRecord {
    /// Database ID, `None` until persisted
    pub id: Option<i64>,
    pub session_id: i64,

    // ===== Fetch =====
    /// URL as requested
    pub url: String,
    /// URL after redirects
    pub final_url: Option<String>,
    /// HTTP status, 0 when the fetch failed
    pub status_code: u16,
    pub load_time_ms: f64,
    /// Raw body length in bytes
    pub content_length: u64,
    pub scanned_at: String,
    /// Seed is depth 0
    pub depth: u32,

    // ===== SEO metadata =====
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical_url: Option<String>,
    pub meta_robots: Option<String>,
    /// Comma-joined hreflang codes
    pub hreflangs: Option<String>,
    pub rel_next: Option<String>,
    pub rel_prev: Option<String>,

    // ===== Structure =====
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub script_count: u32,
    pub style_count: u32,
    pub image_count: u32,

    // ===== Flags =====
    pub has_viewport: bool,
    pub has_favicon: bool,
    pub has_open_graph: bool,
    pub has_twitter_card: bool,
    pub has_hsts: bool,
    pub is_redirect: bool,
    /// "requested -> final" when a redirect occurred
    pub redirect_chain: Option<String>,

    // ===== Fingerprint and derived metrics =====
    /// Lower-case hex SHA-256 of the raw body
    pub content_hash: Option<String>,
    pub size_kb: f64,
    pub text_to_html_ratio: f64,
    pub word_count: u32,
    pub missing_alt_count: u32,
    pub internal_links_count: u32,
    pub external_links_count: u32,
    pub is_title_optimal: bool,
    pub is_description_optimal: bool,

    /// Position of the URL in the frontier's discovery order (seed = 0)
    pub discovery_order: u64,
}

impl PageRecord {
    /// Minimal record for a fetch that failed outright
    pub fn failed(url: &str, session_id: i64, depth: u32, scanned_at: String) -> Self {
        Self {
            session_id,
            url: url.to_string(),
            status_code: 0,
            scanned_at,
            depth,
            ..Default::default()
        }
    }

    /// True when the fetch produced a response (status other than 0)
    pub fn is_fetched(&self) -> bool {
        self.status_code != 0
    }
}

/// One anchor discovered on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub id: Option<i64>,
    pub page_id: Option<i64>,
    /// Absolute target URL
    pub url: String,
    pub text: String,
    pub is_internal: bool,
}

/// One image reference on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: Option<i64>,
    pub page_id: Option<i64>,
    /// Absolute image URL
    pub url: String,
    pub alt_text: Option<String>,
    pub title: Option<String>,
    /// Not measured by the crawler; filled in by downstream tooling
    pub size_bytes: Option<i64>,
    pub content_hash: Option<String>,
}
