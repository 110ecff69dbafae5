//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the declared user agent string
//! - GET requests with manual redirect handling (loop and hop-limit detection)
//! - Timing, fingerprinting and analysis of the response body
//! - Degrading any failure to a status-0 stub page

use crate::config::Config;
use crate::crawler::parser::analyze_html;
use crate::storage::{ImageRecord, LinkRecord, PageRecord};
use crate::SwallowError;
use chrono::Utc;
use reqwest::header::{LOCATION, STRICT_TRANSPORT_SECURITY};
use reqwest::{redirect::Policy, Client, Proxy, Response};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use url::Url;

/// A fetched page and the references discovered on it
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub page: PageRecord,
    pub links: Vec<LinkRecord>,
    /// Empty unless image saving is enabled
    pub images: Vec<ImageRecord>,
}

impl FetchedPage {
    /// True when this page's internal links may expand the frontier
    ///
    /// Only a 200 response with a non-empty body and at least one internal
    /// link qualifies.
    pub fn is_expandable(&self) -> bool {
        self.page.status_code == 200
            && self.page.content_length > 0
            && self.page.internal_links_count > 0
    }

    /// Status-0 stub for a fetch that produced no response at all
    pub fn failed(url: &Url, session_id: i64, depth: u32) -> Self {
        Self {
            page: PageRecord::failed(url.as_str(), session_id, depth, Utc::now().to_rfc3339()),
            links: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Internal link targets in document order
    pub fn internal_links(&self) -> impl Iterator<Item = &LinkRecord> {
        self.links.iter().filter(|link| link.is_internal)
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled at the transport so the fetcher can record them.
///
/// # Arguments
///
/// * `user_agent` - The declared agent string
/// * `timeout` - Whole-request timeout
/// * `proxy` - Optional proxy URL applied to every scheme
///
/// # Example
///
/// ```no_run
/// use swallow_crawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("SwallowsBot/1.0", Duration::from_secs(30), None).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
    proxy: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    builder.build()
}

/// Fetches single pages and turns them into page records
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    max_redirects: u32,
    save_images: bool,
}

impl PageFetcher {
    pub fn new(client: Client, max_redirects: u32, save_images: bool) -> Self {
        Self {
            client,
            max_redirects,
            save_images,
        }
    }

    /// Builds a fetcher (and its client) from the crawler configuration
    pub fn from_config(config: &Config) -> Result<Self, SwallowError> {
        let client = build_http_client(
            &config.user_agent.name,
            Duration::from_secs(config.crawler.request_timeout_secs),
            config.crawler.proxy_url.as_deref(),
        )?;
        Ok(Self::new(
            client,
            config.crawler.max_redirects,
            config.crawler.save_images,
        ))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches and analyzes one URL
    ///
    /// Never fails: transport errors, redirect loops, hop-limit overruns and
    /// unreadable bodies all produce a status-0 stub with no metadata.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch; also defines which links count as internal
    /// * `session_id` - Session the page belongs to
    /// * `depth` - Crawl depth of the page
    pub async fn fetch(&self, url: &Url, session_id: i64, depth: u32) -> FetchedPage {
        let started = Instant::now();

        match self.fetch_page(url, session_id, depth, started).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Fetch failed for {}: {}", url, e);
                let mut failed = FetchedPage::failed(url, session_id, depth);
                failed.page.load_time_ms = elapsed_ms(started);
                failed
            }
        }
    }

    async fn fetch_page(
        &self,
        url: &Url,
        session_id: i64,
        depth: u32,
        started: Instant,
    ) -> Result<FetchedPage, SwallowError> {
        let (response, final_url) =
            get_following_redirects(&self.client, url, self.max_redirects).await?;

        let status_code = response.status().as_u16();
        let has_hsts = response.headers().contains_key(STRICT_TRANSPORT_SECURITY);
        let body = response.bytes().await.map_err(|source| SwallowError::Http {
            url: final_url.to_string(),
            source,
        })?;
        let load_time_ms = elapsed_ms(started);

        let html = String::from_utf8_lossy(&body);
        let analysis = analyze_html(&html, &final_url, url);

        let is_redirect = final_url != *url;
        let content_length = body.len() as u64;
        let text_to_html_ratio = if body.is_empty() {
            0.0
        } else {
            analysis.visible_text_len as f64 / body.len() as f64
        };

        let page = PageRecord {
            id: None,
            session_id,
            url: url.to_string(),
            final_url: Some(final_url.to_string()),
            status_code,
            load_time_ms,
            content_length,
            scanned_at: Utc::now().to_rfc3339(),
            depth,

            is_title_optimal: analysis.is_title_optimal(),
            is_description_optimal: analysis.is_description_optimal(),
            title: analysis.title,
            meta_description: analysis.meta_description,
            canonical_url: analysis.canonical_url,
            meta_robots: analysis.meta_robots,
            hreflangs: analysis.hreflangs,
            rel_next: analysis.rel_next,
            rel_prev: analysis.rel_prev,

            h1_count: analysis.h1_count,
            h2_count: analysis.h2_count,
            h3_count: analysis.h3_count,
            h4_count: analysis.h4_count,
            script_count: analysis.script_count,
            style_count: analysis.style_count,
            image_count: analysis.images.len() as u32,

            has_viewport: analysis.has_viewport,
            has_favicon: analysis.has_favicon,
            has_open_graph: analysis.has_open_graph,
            has_twitter_card: analysis.has_twitter_card,
            has_hsts,
            is_redirect,
            redirect_chain: is_redirect.then(|| format!("{} -> {}", url, final_url)),

            content_hash: Some(content_hash(&body)),
            size_kb: body.len() as f64 / 1024.0,
            text_to_html_ratio,
            word_count: analysis.word_count,
            missing_alt_count: analysis.missing_alt_count,
            internal_links_count: analysis.internal_links_count,
            external_links_count: analysis.external_links_count,
            discovery_order: 0,
        };

        tracing::debug!(
            "Fetched {} -> {} ({} bytes, {} links)",
            url,
            status_code,
            content_length,
            analysis.links.len()
        );

        Ok(FetchedPage {
            page,
            links: analysis.links,
            images: if self.save_images {
                analysis.images
            } else {
                Vec::new()
            },
        })
    }
}

/// Sends GET requests, following `Location` headers by hand
///
/// The client must have transport-level redirects disabled.
///
/// # Returns
///
/// The first non-redirect response and the URL it was served from, or
/// `RedirectLoop`/`RedirectLimit` when the chain does not settle within
/// `max_redirects` hops.
pub async fn get_following_redirects(
    client: &Client,
    url: &Url,
    max_redirects: u32,
) -> Result<(Response, Url), SwallowError> {
    let mut current = url.clone();
    let mut visited = HashSet::new();
    visited.insert(current.to_string());
    let mut hops = 0;

    loop {
        let response = client
            .get(current.clone())
            .send()
            .await
            .map_err(|source| SwallowError::Http {
                url: current.to_string(),
                source,
            })?;

        if !response.status().is_redirection() {
            return Ok((response, current));
        }

        let Some(next) = redirect_target(&response, &current) else {
            // A 3xx without a usable Location is the final answer
            return Ok((response, current));
        };

        hops += 1;
        if hops > max_redirects {
            return Err(SwallowError::RedirectLimit {
                url: url.to_string(),
            });
        }
        if !visited.insert(next.to_string()) {
            return Err(SwallowError::RedirectLoop {
                url: next.to_string(),
            });
        }

        tracing::debug!("Redirect {} -> {}", current, next);
        current = next;
    }
}

fn redirect_target(response: &Response, current: &Url) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

/// Lower-case hex SHA-256 of the raw body
pub fn content_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
