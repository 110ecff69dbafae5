use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use swallow_crawl::url::extract_host;
///
/// let url = Url::parse("https://Blog.Example.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Removes a single leading `www.` label, case-insensitively
pub fn strip_www(host: &str) -> &str {
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => &host[4..],
        _ => host,
    }
}

/// Host used for internal/external classification: lowercase, no leading `www.`
pub fn host_key(url: &Url) -> Option<String> {
    extract_host(url).map(|h| strip_www(&h).to_string())
}

/// Returns true when both URLs point at the same site
///
/// Hosts are compared case-insensitively with a leading `www.` ignored.
/// Scheme and port do not take part in the comparison.
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (host_key(a), host_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Path plus query, the string robots.txt rules are matched against
pub fn robots_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
