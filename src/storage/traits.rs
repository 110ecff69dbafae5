//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ImageRecord, LinkRecord, PageRecord, ScanSession, SessionStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("Session {0} is already finalized")]
    SessionFinalized(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The crawl loop is the only writer for a session. Any error returned here
/// aborts the scan: a lost page would break the session's page count.
pub trait Storage {
    // ===== Session Management =====

    /// Creates a new session in `Running` status and returns it
    ///
    /// # Arguments
    ///
    /// * `base_url` - The seed URL of the scan
    /// * `user_agent` - The declared agent string
    fn create_session(&mut self, base_url: &str, user_agent: &str) -> StorageResult<ScanSession>;

    /// Gets a session by ID
    fn get_session(&self, session_id: i64) -> StorageResult<ScanSession>;

    /// Lists all sessions, newest first
    fn list_sessions(&self) -> StorageResult<Vec<ScanSession>>;

    /// Records the finish time, final status and page count of a session
    ///
    /// Fails with [`StorageError::SessionFinalized`] if the session already
    /// reached a terminal status.
    fn finalize_session(
        &mut self,
        session_id: i64,
        status: SessionStatus,
        total_pages_scanned: u32,
    ) -> StorageResult<()>;

    // ===== Page Management =====

    /// Inserts a page together with its links and images in one transaction
    ///
    /// # Returns
    ///
    /// The new page ID
    fn insert_page(
        &mut self,
        page: &PageRecord,
        links: &[LinkRecord],
        images: &[ImageRecord],
    ) -> StorageResult<i64>;

    /// Gets all pages of a session in discovery (insertion) order
    fn get_pages(&self, session_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Counts the pages persisted for a session
    fn count_pages(&self, session_id: i64) -> StorageResult<u64>;

    /// Gets a page of a session by requested URL
    fn get_page_by_url(&self, session_id: i64, url: &str) -> StorageResult<Option<PageRecord>>;

    // ===== Links and Images =====

    /// Gets all links discovered on a page
    fn get_links(&self, page_id: i64) -> StorageResult<Vec<LinkRecord>>;

    /// Gets all images referenced by a page
    fn get_images(&self, page_id: i64) -> StorageResult<Vec<ImageRecord>>;

    // ===== Content Fingerprints =====

    /// Groups page URLs of a session that share a content hash
    ///
    /// Only hashes shared by two or more pages are returned.
    fn find_duplicate_content(&self, session_id: i64) -> StorageResult<Vec<(String, Vec<String>)>>;
}
