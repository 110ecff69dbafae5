use serde::Deserialize;

/// Default agent string declared to servers and matched against robots.txt
pub const DEFAULT_USER_AGENT: &str = "SwallowsBot/1.0";

/// Main configuration structure for Swallow-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URL the scan starts from (depth 0)
    pub seed_url: String,

    /// Upper bound on pages fetched per session
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Links discovered deeper than this are not enqueued
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of fetches allowed in flight at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: u32,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether image records are persisted alongside pages
    #[serde(default)]
    pub save_images: bool,

    /// Maximum redirect hops followed for a single page
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Idle interval while the scan is paused (milliseconds)
    #[serde(default = "default_pause_poll_interval_ms")]
    pub pause_poll_interval_ms: u64,

    /// Minimum gap between two consecutive fetch dispatches (milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// HTTP(S) proxy every request is routed through
    #[serde(default)]
    pub proxy_url: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Full agent string, e.g. "SwallowsBot/1.0"
    #[serde(default = "default_user_agent")]
    pub name: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: default_user_agent(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl CrawlerConfig {
    /// Builds a crawler configuration for `seed_url` with every other knob at its default
    pub fn with_seed(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            concurrent_requests: default_concurrent_requests(),
            request_timeout_secs: default_request_timeout_secs(),
            save_images: false,
            max_redirects: default_max_redirects(),
            pause_poll_interval_ms: default_pause_poll_interval_ms(),
            request_delay_ms: default_request_delay_ms(),
            proxy_url: None,
        }
    }
}

fn default_max_pages() -> u32 {
    1000
}

fn default_max_depth() -> u32 {
    5
}

fn default_concurrent_requests() -> u32 {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_redirects() -> u32 {
    10
}

fn default_pause_poll_interval_ms() -> u64 {
    1000
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
