//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the scan database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawl run
CREATE TABLE IF NOT EXISTS scan_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    base_url TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    total_pages_scanned INTEGER NOT NULL DEFAULT 0,
    user_agent TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Every fetched resource, including failed fetches (status_code = 0)
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES scan_sessions(id),
    url TEXT NOT NULL,
    final_url TEXT,
    status_code INTEGER NOT NULL,
    load_time_ms REAL NOT NULL DEFAULT 0,
    content_length INTEGER NOT NULL DEFAULT 0,
    scanned_at TEXT NOT NULL,
    depth INTEGER NOT NULL,
    title TEXT,
    meta_description TEXT,
    canonical_url TEXT,
    meta_robots TEXT,
    hreflangs TEXT,
    rel_next TEXT,
    rel_prev TEXT,
    h1_count INTEGER NOT NULL DEFAULT 0,
    h2_count INTEGER NOT NULL DEFAULT 0,
    h3_count INTEGER NOT NULL DEFAULT 0,
    h4_count INTEGER NOT NULL DEFAULT 0,
    script_count INTEGER NOT NULL DEFAULT 0,
    style_count INTEGER NOT NULL DEFAULT 0,
    image_count INTEGER NOT NULL DEFAULT 0,
    has_viewport INTEGER NOT NULL DEFAULT 0,
    has_favicon INTEGER NOT NULL DEFAULT 0,
    has_open_graph INTEGER NOT NULL DEFAULT 0,
    has_twitter_card INTEGER NOT NULL DEFAULT 0,
    has_hsts INTEGER NOT NULL DEFAULT 0,
    is_redirect INTEGER NOT NULL DEFAULT 0,
    redirect_chain TEXT,
    content_hash TEXT,
    size_kb REAL NOT NULL DEFAULT 0,
    text_to_html_ratio REAL NOT NULL DEFAULT 0,
    word_count INTEGER NOT NULL DEFAULT 0,
    missing_alt_count INTEGER NOT NULL DEFAULT 0,
    internal_links_count INTEGER NOT NULL DEFAULT 0,
    external_links_count INTEGER NOT NULL DEFAULT 0,
    is_title_optimal INTEGER NOT NULL DEFAULT 0,
    is_description_optimal INTEGER NOT NULL DEFAULT 0,
    discovery_order INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_pages_session ON pages(session_id);
CREATE INDEX IF NOT EXISTS idx_pages_session_url ON pages(session_id, url);
CREATE INDEX IF NOT EXISTS idx_pages_content_hash ON pages(session_id, content_hash);

-- Anchors found on a page
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    url TEXT NOT NULL,
    text TEXT NOT NULL,
    is_internal INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_links_page ON links(page_id);

-- Image references found on a page
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    url TEXT NOT NULL,
    alt_text TEXT,
    title TEXT,
    size_bytes INTEGER,
    content_hash TEXT
);

CREATE INDEX IF NOT EXISTS idx_images_page ON images(page_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
