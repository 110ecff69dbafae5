//! Scan session lifecycle
//!
//! Opens the session record before the first fetch and closes it after the
//! crawl loop exits for any reason.

use crate::storage::{ScanSession, SessionStatus, Storage};
use crate::SwallowError;
use url::Url;

/// Creates and persists a `Running` session for a crawl of `seed`
pub fn open_session<S: Storage>(
    storage: &mut S,
    seed: &Url,
    user_agent: &str,
) -> Result<ScanSession, SwallowError> {
    let session = storage.create_session(seed.as_str(), user_agent)?;
    tracing::info!(
        "Opened scan session {} for {} as {}",
        session.id,
        session.base_url,
        session.user_agent
    );
    Ok(session)
}

/// Records the final status and page count of a session
///
/// # Arguments
///
/// * `storage` - The storage backend
/// * `session_id` - Session to close
/// * `status` - Terminal status (`Completed`, `Stopped` or `Failed`)
/// * `pages_scanned` - Pages fetched and persisted during the session
pub fn close_session<S: Storage>(
    storage: &mut S,
    session_id: i64,
    status: SessionStatus,
    pages_scanned: u32,
) -> Result<(), SwallowError> {
    storage.finalize_session(session_id, status, pages_scanned)?;
    tracing::info!(
        "Closed scan session {}: {} after {} pages",
        session_id,
        status.to_db_string(),
        pages_scanned
    );
    Ok(())
}
