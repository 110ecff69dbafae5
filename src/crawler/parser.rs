//! HTML parser for SEO and content signals
//!
//! This module handles parsing HTML content to extract:
//! - Head metadata (title, description, canonical, robots, hreflang, pagination)
//! - Structural counts (headings, scripts, styles)
//! - Feature flags (viewport, favicon, Open Graph, Twitter Card)
//! - Visible text metrics (word count, text length)
//! - Links and images, resolved to absolute URLs

use crate::storage::{ImageRecord, LinkRecord};
use crate::url::is_same_site;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Title lengths (in characters) considered optimal, inclusive
pub const OPTIMAL_TITLE_LEN: (usize, usize) = (10, 60);

/// Meta description lengths (in characters) considered optimal, inclusive
pub const OPTIMAL_DESCRIPTION_LEN: (usize, usize) = (50, 160);

/// Everything extracted from one HTML document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageAnalysis {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical_url: Option<String>,
    pub meta_robots: Option<String>,
    pub hreflangs: Option<String>,
    pub rel_next: Option<String>,
    pub rel_prev: Option<String>,

    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub script_count: u32,
    pub style_count: u32,

    pub has_viewport: bool,
    pub has_favicon: bool,
    pub has_open_graph: bool,
    pub has_twitter_card: bool,

    /// Length in characters of the whitespace-collapsed body text
    pub visible_text_len: usize,
    pub word_count: u32,

    pub links: Vec<LinkRecord>,
    pub internal_links_count: u32,
    pub external_links_count: u32,

    pub images: Vec<ImageRecord>,
    /// `<img>` tags with a usable `src` but a blank or missing `alt`
    pub missing_alt_count: u32,
}

impl PageAnalysis {
    pub fn is_title_optimal(&self) -> bool {
        within(self.title.as_deref(), OPTIMAL_TITLE_LEN)
    }

    pub fn is_description_optimal(&self) -> bool {
        within(self.meta_description.as_deref(), OPTIMAL_DESCRIPTION_LEN)
    }
}

fn within(text: Option<&str>, (min, max): (usize, usize)) -> bool {
    match text {
        Some(t) if !t.is_empty() => {
            let len = t.chars().count();
            len >= min && len <= max
        }
        _ => false,
    }
}

/// Parses an HTML document and extracts its SEO signals
///
/// Malformed hrefs and srcs are dropped one by one; parsing itself never
/// fails.
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `base_url` - URL the document was served from, for resolving relative links
/// * `site_url` - URL whose host defines "internal" (`www.` ignored)
///
/// # Example
///
/// ```
/// use swallow_crawl::crawler::analyze_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let analysis = analyze_html(html, &base_url, &base_url);
/// assert_eq!(analysis.title, Some("Test".to_string()));
/// assert_eq!(analysis.internal_links_count, 1);
/// ```
pub fn analyze_html(html: &str, base_url: &Url, site_url: &Url) -> PageAnalysis {
    let document = Html::parse_document(html);

    let mut analysis = PageAnalysis {
        title: first_text(&document, "title"),
        meta_description: first_attr(&document, r#"meta[name="description"]"#, "content"),
        canonical_url: first_attr(&document, r#"link[rel="canonical"]"#, "href"),
        meta_robots: first_attr(&document, r#"meta[name="robots"]"#, "content"),
        hreflangs: extract_hreflangs(&document),
        rel_next: first_attr(&document, r#"link[rel="next"]"#, "href"),
        rel_prev: first_attr(&document, r#"link[rel="prev"]"#, "href"),

        h1_count: count(&document, "h1"),
        h2_count: count(&document, "h2"),
        h3_count: count(&document, "h3"),
        h4_count: count(&document, "h4"),
        script_count: count(&document, "script"),
        style_count: count(&document, "style"),

        has_viewport: exists(&document, r#"meta[name="viewport"]"#),
        has_favicon: exists(&document, r#"link[rel="icon"], link[rel="shortcut icon"]"#),
        has_open_graph: exists(&document, r#"meta[property="og:title"]"#),
        has_twitter_card: exists(&document, r#"meta[name="twitter:card"]"#),

        ..Default::default()
    };

    let visible_text = body_text(&document);
    analysis.visible_text_len = visible_text.chars().count();
    analysis.word_count = visible_text.split(' ').filter(|w| !w.is_empty()).count() as u32;

    extract_links(&document, base_url, site_url, &mut analysis);
    extract_images(&document, base_url, &mut analysis);

    analysis
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn count(document: &Html, css: &str) -> u32 {
    selector(css)
        .map(|sel| document.select(&sel).count() as u32)
        .unwrap_or(0)
}

fn exists(document: &Html, css: &str) -> bool {
    selector(css)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css)?;
    let element = document.select(&sel).next()?;
    element.value().attr(attr).map(str::to_string)
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Joins whitespace runs into single spaces and trims the ends
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn body_text(document: &Html) -> String {
    selector("body")
        .and_then(|sel| document.select(&sel).next())
        .map(element_text)
        .unwrap_or_default()
}

fn extract_hreflangs(document: &Html) -> Option<String> {
    let sel = selector(r#"link[rel="alternate"][hreflang]"#)?;
    let langs: Vec<&str> = document
        .select(&sel)
        .filter_map(|element| element.value().attr("hreflang"))
        .filter(|lang| !lang.is_empty())
        .collect();

    if langs.is_empty() {
        None
    } else {
        Some(langs.join(", "))
    }
}

/// Resolves an href or src against the document URL
///
/// Returns None for blank values, unparseable references and anything that
/// does not resolve to http(s) (javascript:, mailto:, tel:, data:).
fn resolve_reference(reference: &str, base_url: &Url) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    let absolute = base_url.join(reference).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

fn extract_links(document: &Html, base_url: &Url, site_url: &Url, analysis: &mut PageAnalysis) {
    let Some(sel) = selector("a[href]") else {
        return;
    };

    for element in document.select(&sel) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_reference(href, base_url) else {
            continue;
        };

        let is_internal = is_same_site(&absolute, site_url);
        if is_internal {
            analysis.internal_links_count += 1;
        } else {
            analysis.external_links_count += 1;
        }

        analysis.links.push(LinkRecord {
            id: None,
            page_id: None,
            url: absolute.to_string(),
            text: element_text(element),
            is_internal,
        });
    }
}

fn extract_images(document: &Html, base_url: &Url, analysis: &mut PageAnalysis) {
    let Some(sel) = selector("img[src]") else {
        return;
    };

    for element in document.select(&sel) {
        let attrs = element.value();
        let src = attrs.attr("src").unwrap_or_default();
        if src.trim().is_empty() {
            continue;
        }

        let alt = attrs.attr("alt");
        if alt.map_or(true, |a| a.trim().is_empty()) {
            analysis.missing_alt_count += 1;
        }

        if let Some(absolute) = resolve_reference(src, base_url) {
            analysis.images.push(ImageRecord {
                id: None,
                page_id: None,
                url: absolute.to_string(),
                alt_text: alt.map(str::to_string),
                title: attrs.attr("title").map(str::to_string),
                size_bytes: None,
                content_hash: None,
            });
        }
    }
}
