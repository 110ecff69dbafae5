//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ImageRecord, LinkRecord, PageRecord, ScanSession, SessionStatus};
use crate::SwallowError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SESSION_COLUMNS: &str =
    "id, base_url, started_at, finished_at, total_pages_scanned, user_agent, status";

const PAGE_COLUMNS: &str = "id, session_id, url, final_url, status_code, load_time_ms, \
     content_length, scanned_at, depth, title, meta_description, canonical_url, meta_robots, \
     hreflangs, rel_next, rel_prev, h1_count, h2_count, h3_count, h4_count, script_count, \
     style_count, image_count, has_viewport, has_favicon, has_open_graph, has_twitter_card, \
     has_hsts, is_redirect, redirect_chain, content_hash, size_kb, text_to_html_ratio, \
     word_count, missing_alt_count, internal_links_count, external_links_count, \
     is_title_optimal, is_description_optimal, discovery_order";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SwallowError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SwallowError> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SwallowError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<ScanSession> {
    Ok(ScanSession {
        id: row.get(0)?,
        base_url: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        total_pages_scanned: row.get(4)?,
        user_agent: row.get(5)?,
        status: SessionStatus::from_db_string(&row.get::<_, String>(6)?)
            .unwrap_or(SessionStatus::Failed),
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: Some(row.get(0)?),
        session_id: row.get(1)?,
        url: row.get(2)?,
        final_url: row.get(3)?,
        status_code: row.get(4)?,
        load_time_ms: row.get(5)?,
        content_length: row.get::<_, i64>(6)?.max(0) as u64,
        scanned_at: row.get(7)?,
        depth: row.get(8)?,
        title: row.get(9)?,
        meta_description: row.get(10)?,
        canonical_url: row.get(11)?,
        meta_robots: row.get(12)?,
        hreflangs: row.get(13)?,
        rel_next: row.get(14)?,
        rel_prev: row.get(15)?,
        h1_count: row.get(16)?,
        h2_count: row.get(17)?,
        h3_count: row.get(18)?,
        h4_count: row.get(19)?,
        script_count: row.get(20)?,
        style_count: row.get(21)?,
        image_count: row.get(22)?,
        has_viewport: row.get(23)?,
        has_favicon: row.get(24)?,
        has_open_graph: row.get(25)?,
        has_twitter_card: row.get(26)?,
        has_hsts: row.get(27)?,
        is_redirect: row.get(28)?,
        redirect_chain: row.get(29)?,
        content_hash: row.get(30)?,
        size_kb: row.get(31)?,
        text_to_html_ratio: row.get(32)?,
        word_count: row.get(33)?,
        missing_alt_count: row.get(34)?,
        internal_links_count: row.get(35)?,
        external_links_count: row.get(36)?,
        is_title_optimal: row.get(37)?,
        is_description_optimal: row.get(38)?,
        discovery_order: row.get::<_, i64>(39)?.max(0) as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Session Management =====

    fn create_session(&mut self, base_url: &str, user_agent: &str) -> StorageResult<ScanSession> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO scan_sessions (base_url, started_at, total_pages_scanned, user_agent, status)
             VALUES (?1, ?2, 0, ?3, ?4)",
            params![
                base_url,
                now,
                user_agent,
                SessionStatus::Running.to_db_string()
            ],
        )?;

        Ok(ScanSession {
            id: self.conn.last_insert_rowid(),
            base_url: base_url.to_string(),
            started_at: now,
            finished_at: None,
            total_pages_scanned: 0,
            user_agent: user_agent.to_string(),
            status: SessionStatus::Running,
        })
    }

    fn get_session(&self, session_id: i64) -> StorageResult<ScanSession> {
        let sql = format!("SELECT {} FROM scan_sessions WHERE id = ?1", SESSION_COLUMNS);
        self.conn
            .query_row(&sql, params![session_id], session_from_row)
            .optional()?
            .ok_or(StorageError::SessionNotFound(session_id))
    }

    fn list_sessions(&self) -> StorageResult<Vec<ScanSession>> {
        let sql = format!("SELECT {} FROM scan_sessions ORDER BY id DESC", SESSION_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let sessions = stmt
            .query_map([], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn finalize_session(
        &mut self,
        session_id: i64,
        status: SessionStatus,
        total_pages_scanned: u32,
    ) -> StorageResult<()> {
        let current = self.get_session(session_id)?;
        if current.status.is_terminal() {
            return Err(StorageError::SessionFinalized(session_id));
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE scan_sessions SET status = ?1, finished_at = ?2, total_pages_scanned = ?3
             WHERE id = ?4",
            params![status.to_db_string(), now, total_pages_scanned, session_id],
        )?;
        Ok(())
    }

    // ===== Page Management =====

    fn insert_page(
        &mut self,
        page: &PageRecord,
        links: &[LinkRecord],
        images: &[ImageRecord],
    ) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO pages (
                session_id, url, final_url, status_code, load_time_ms, content_length,
                scanned_at, depth, title, meta_description, canonical_url, meta_robots,
                hreflangs, rel_next, rel_prev, h1_count, h2_count, h3_count, h4_count,
                script_count, style_count, image_count, has_viewport, has_favicon,
                has_open_graph, has_twitter_card, has_hsts, is_redirect, redirect_chain,
                content_hash, size_kb, text_to_html_ratio, word_count, missing_alt_count,
                internal_links_count, external_links_count, is_title_optimal,
                is_description_optimal, discovery_order
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32,
                ?33, ?34, ?35, ?36, ?37, ?38, ?39
            )",
            params![
                page.session_id,
                page.url,
                page.final_url,
                page.status_code,
                page.load_time_ms,
                page.content_length as i64,
                page.scanned_at,
                page.depth,
                page.title,
                page.meta_description,
                page.canonical_url,
                page.meta_robots,
                page.hreflangs,
                page.rel_next,
                page.rel_prev,
                page.h1_count,
                page.h2_count,
                page.h3_count,
                page.h4_count,
                page.script_count,
                page.style_count,
                page.image_count,
                page.has_viewport,
                page.has_favicon,
                page.has_open_graph,
                page.has_twitter_card,
                page.has_hsts,
                page.is_redirect,
                page.redirect_chain,
                page.content_hash,
                page.size_kb,
                page.text_to_html_ratio,
                page.word_count,
                page.missing_alt_count,
                page.internal_links_count,
                page.external_links_count,
                page.is_title_optimal,
                page.is_description_optimal,
                page.discovery_order as i64,
            ],
        )?;
        let page_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO links (page_id, url, text, is_internal) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for link in links {
                stmt.execute(params![page_id, link.url, link.text, link.is_internal])?;
            }
        }

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO images (page_id, url, alt_text, title, size_bytes, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for image in images {
                stmt.execute(params![
                    page_id,
                    image.url,
                    image.alt_text,
                    image.title,
                    image.size_bytes,
                    image.content_hash
                ])?;
            }
        }

        tx.commit()?;
        Ok(page_id)
    }

    fn get_pages(&self, session_id: i64) -> StorageResult<Vec<PageRecord>> {
        let sql = format!(
            "SELECT {} FROM pages WHERE session_id = ?1 ORDER BY discovery_order, id",
            PAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map(params![session_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn count_pages(&self, session_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn get_page_by_url(&self, session_id: i64, url: &str) -> StorageResult<Option<PageRecord>> {
        let sql = format!(
            "SELECT {} FROM pages WHERE session_id = ?1 AND url = ?2 ORDER BY id LIMIT 1",
            PAGE_COLUMNS
        );
        let page = self
            .conn
            .query_row(&sql, params![session_id, url], page_from_row)
            .optional()?;
        Ok(page)
    }

    // ===== Links and Images =====

    fn get_links(&self, page_id: i64) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, page_id, url, text, is_internal FROM links WHERE page_id = ?1 ORDER BY id",
        )?;
        let links = stmt
            .query_map(params![page_id], |row| {
                Ok(LinkRecord {
                    id: Some(row.get(0)?),
                    page_id: Some(row.get(1)?),
                    url: row.get(2)?,
                    text: row.get(3)?,
                    is_internal: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn get_images(&self, page_id: i64) -> StorageResult<Vec<ImageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, page_id, url, alt_text, title, size_bytes, content_hash
             FROM images WHERE page_id = ?1 ORDER BY id",
        )?;
        let images = stmt
            .query_map(params![page_id], |row| {
                Ok(ImageRecord {
                    id: Some(row.get(0)?),
                    page_id: Some(row.get(1)?),
                    url: row.get(2)?,
                    alt_text: row.get(3)?,
                    title: row.get(4)?,
                    size_bytes: row.get(5)?,
                    content_hash: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }

    // ===== Content Fingerprints =====

    fn find_duplicate_content(
        &self,
        session_id: i64,
    ) -> StorageResult<Vec<(String, Vec<String>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT content_hash, url FROM pages
             WHERE session_id = ?1 AND content_hash IN (
                 SELECT content_hash FROM pages
                 WHERE session_id = ?1 AND content_hash IS NOT NULL
                 GROUP BY content_hash HAVING COUNT(*) > 1
             )
             ORDER BY content_hash, id",
        )?;

        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for (hash, url) in rows {
            match groups.last_mut() {
                Some((last_hash, urls)) if *last_hash == hash => urls.push(url),
                _ => groups.push((hash, vec![url])),
            }
        }
        Ok(groups)
    }
}

/// Opens a database file and applies the connection pragmas and schema
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
