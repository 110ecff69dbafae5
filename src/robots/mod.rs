//! Robots.txt handling module
//!
//! This module fetches and parses the seed origin's robots.txt and answers
//! "is this path allowed for this agent" queries. Loading never fails: any
//! fetch or status problem yields an allow-all policy. Redirects on the
//! robots.txt request are followed first.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::get_following_redirects;
use reqwest::Client;
use url::Url;

/// Fetches and parses `{seed-origin}/robots.txt`
///
/// # Arguments
///
/// * `client` - The HTTP client (carries the declared User-Agent header)
/// * `seed` - Any URL on the origin being crawled
/// * `max_redirects` - Hop limit for redirects on the robots.txt request
///
/// # Returns
///
/// The parsed rules, or [`ParsedRobots::allow_all`] when the redirect chain
/// ends in an error or a non-success status, or the body cannot be read.
pub async fn fetch_robots(client: &Client, seed: &Url, max_redirects: u32) -> ParsedRobots {
    let robots_url = match seed.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", seed, e);
            return ParsedRobots::allow_all();
        }
    };

    tracing::debug!("Fetching robots.txt: {}", robots_url);

    let (response, served_from) =
        match get_following_redirects(client, &robots_url, max_redirects).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::info!("robots.txt unavailable at {} ({}), allowing all", robots_url, e);
                return ParsedRobots::allow_all();
            }
        };

    if !response.status().is_success() {
        tracing::info!(
            "robots.txt at {} returned {}, allowing all",
            served_from,
            response.status()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let robots = ParsedRobots::from_content(&body);
            tracing::info!(
                "Loaded robots.txt from {} ({} agent groups)",
                served_from,
                robots.group_count()
            );
            robots
        }
        Err(e) => {
            tracing::warn!("Failed to read robots.txt body from {}: {}", served_from, e);
            ParsedRobots::allow_all()
        }
    }
}

/// Checks if a URL is allowed by robots.txt for the agent
///
/// The URL's path and query are matched; scheme and host are ignored.
pub fn is_allowed(robots: &ParsedRobots, url: &Url, user_agent: &str) -> bool {
    robots.is_allowed(&crate::url::robots_path(url), user_agent)
}
