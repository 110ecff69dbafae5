use crate::UrlError;
use url::Url;

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL into the form used as a frontier/visited key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything other than http/https, or a URL without a host
/// 3. Lowercase the host (done by the parser) and resolve dot segments
/// 4. Empty path becomes `/`
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters, keeping the rest in their original
///    order and encoding
/// 7. Remove empty query string (trailing ?)
///
/// Scheme and `www.` are kept: both select a different origin to fetch from.
///
/// # Examples
///
/// ```
/// use swallow_crawl::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/page?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Same as [`normalize_url`] for an already parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let kept = filter_query(query);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&kept));
        }
    }

    Ok(url)
}

/// Drops tracking pairs from a raw query string without re-encoding the rest
fn filter_query(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !is_tracking_param(key)
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
