//! URL handling module for Swallow-Crawl
//!
//! This module provides URL normalization for the frontier, host comparison
//! for internal/external link classification, and the robots.txt match key.

mod domain;
mod normalize;

pub use domain::{extract_host, host_key, is_same_site, robots_path, strip_www};
pub use normalize::{normalize_parsed, normalize_url};
