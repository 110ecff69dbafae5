//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::sync::Arc;
use std::time::Duration;
use swallow_crawl::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use swallow_crawl::crawler::{
    ChannelObserver, CrawlControl, CrawlEvent, CrawlObserver, Crawler, ScanProgress,
};
use swallow_crawl::state::ScanState;
use swallow_crawl::storage::{SessionStatus, SqliteStorage, Storage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from the mock server root
fn create_test_config(server: &MockServer, db_path: &str) -> Config {
    let mut crawler = CrawlerConfig::with_seed(format!("{}/", server.uri()));
    crawler.request_timeout_secs = 5;
    crawler.pause_poll_interval_ms = 20;
    crawler.request_delay_ms = 0;

    Config {
        crawler,
        user_agent: UserAgentConfig {
            name: "SwallowsBot".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(body.to_string())
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content.to_string()))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_never_fetched(server: &MockServer, at: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html("<html><body>should not be fetched</body></html>"))
        .expect(0)
        .mount(server)
        .await;
}

fn page_urls<S: Storage>(storage: &S, session_id: i64) -> Vec<String> {
    storage
        .get_pages(session_id)
        .unwrap()
        .into_iter()
        .map(|p| p.url)
        .collect()
}

/// Cancels the crawl once a given number of pages has been reported
struct CancelAfter {
    control: CrawlControl,
    pages: u32,
}

impl CrawlObserver for CancelAfter {
    fn on_progress(&self, progress: &ScanProgress) {
        if progress.scanned_count >= self.pages {
            self.control.cancel();
        }
    }
}

#[tokio::test]
async fn test_page_cap_scenario_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/page1">Page 1</a>
            <a href="https://external.com">External</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<html><body><a href="/page2">Page 2</a></body></html>"#,
    )
    .await;
    mount_never_fetched(&server, "/page2").await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("scan.db");
    let mut config = create_test_config(&server, db_path.to_str().unwrap());
    config.crawler.max_pages = 2;

    let storage = SqliteStorage::new(&db_path).unwrap();
    let mut crawler = Crawler::new(config, storage).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, SessionStatus::Completed);
    assert_eq!(summary.pages_scanned, 2);

    // Reopen from disk to check what was actually persisted
    drop(crawler);
    let storage = SqliteStorage::new(&db_path).unwrap();
    let session = storage.get_session(summary.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.total_pages_scanned, 2);
    assert_eq!(session.user_agent, "SwallowsBot");

    assert_eq!(
        page_urls(&storage, summary.session_id),
        vec![format!("{}/", base), format!("{}/page1", base)]
    );

    let home = storage
        .get_page_by_url(summary.session_id, &format!("{}/", base))
        .unwrap()
        .unwrap();
    assert_eq!(home.internal_links_count, 1);
    assert_eq!(home.external_links_count, 1);
    assert_eq!(home.depth, 0);
    assert_eq!(home.title.as_deref(), Some("Home"));

    let links = storage.get_links(home.id.unwrap()).unwrap();
    assert_eq!(links.len(), 2);
    assert!(links.iter().any(|l| l.url == "https://external.com/" && !l.is_internal));

    let page1 = storage
        .get_page_by_url(summary.session_id, &format!("{}/page1", base))
        .unwrap()
        .unwrap();
    assert_eq!(page1.depth, 1);
}

#[tokio::test]
async fn test_robots_disallowed_path_is_never_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private/secret">Secret</a><a href="/public">Public</a>"#,
    )
    .await;
    mount_never_fetched(&server, "/private/secret").await;
    mount_page(&server, "/public", "<p>open</p>").await;

    let config = create_test_config(&server, ":memory:");
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.pages_scanned, 2);
    let urls = page_urls(crawler.storage(), summary.session_id);
    assert!(urls.contains(&format!("{}/public", base)));
    assert!(!urls.contains(&format!("{}/private/secret", base)));
}

#[tokio::test]
async fn test_redirected_robots_rules_are_honoured() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/robots-real.txt", base).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots-real.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private">Private</a><a href="/public">Public</a>"#,
    )
    .await;
    mount_never_fetched(&server, "/private").await;
    mount_page(&server, "/public", "<p>open</p>").await;

    let config = create_test_config(&server, ":memory:");
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.pages_scanned, 2);
    let urls = page_urls(crawler.storage(), summary.session_id);
    assert_eq!(urls, vec![format!("{}/", base), format!("{}/public", base)]);
}

#[tokio::test]
async fn test_agent_specific_group_overrides_wildcard() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(
        &server,
        "User-agent: *\nDisallow: /\n\nUser-agent: SwallowsBot\nDisallow: /admin\n",
    )
    .await;
    mount_page(&server, "/", r#"<a href="/admin">Admin</a><a href="/blog">Blog</a>"#).await;
    mount_never_fetched(&server, "/admin").await;
    mount_page(&server, "/blog", "<p>post</p>").await;

    let config = create_test_config(&server, ":memory:");
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    let urls = page_urls(crawler.storage(), summary.session_id);
    assert_eq!(urls, vec![format!("{}/", base), format!("{}/blog", base)]);
}

#[tokio::test]
async fn test_longest_prefix_wins_in_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(
        &server,
        "User-agent: *\nAllow: /folder/public\nDisallow: /folder/\n",
    )
    .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/folder/public">P</a><a href="/folder/secret">S</a>"#,
    )
    .await;
    mount_page(&server, "/folder/public", "<p>public</p>").await;
    mount_never_fetched(&server, "/folder/secret").await;

    let config = create_test_config(&server, ":memory:");
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    let urls = page_urls(crawler.storage(), summary.session_id);
    assert!(urls.contains(&format!("{}/folder/public", base)));
    assert_eq!(urls.len(), 2);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", "<p>leaf</p>").await;

    let config = create_test_config(&server, ":memory:");
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.pages_scanned, 2);
}

#[tokio::test]
async fn test_page_cap_holds_with_concurrency() {
    let server = MockServer::start().await;

    let mut home = String::from("<html><body>");
    for i in 0..10 {
        home.push_str(&format!(r#"<a href="/p{}">p{}</a>"#, i, i));
        Mock::given(method("GET"))
            .and(path(format!("/p{}", i)))
            .respond_with(html("<p>leaf</p>").set_delay(Duration::from_millis(20)))
            .mount(&server)
            .await;
    }
    home.push_str("</body></html>");
    mount_page(&server, "/", &home).await;

    let mut config = create_test_config(&server, ":memory:");
    config.crawler.max_pages = 4;
    config.crawler.concurrent_requests = 3;

    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, SessionStatus::Completed);
    assert_eq!(summary.pages_scanned, 4);
    assert_eq!(crawler.storage().count_pages(summary.session_id).unwrap(), 4);
}

#[tokio::test]
async fn test_concurrent_crawl_fetches_each_url_once() {
    let server = MockServer::start().await;

    // Every leaf links back to the home page and to each other
    let mut home = String::from("<html><body>");
    for i in 0..6 {
        home.push_str(&format!(r#"<a href="/p{}">p{}</a>"#, i, i));
    }
    home.push_str("</body></html>");
    mount_page(&server, "/", &home).await;
    for i in 0..6 {
        mount_page(&server, &format!("/p{}", i), &home).await;
    }

    let mut config = create_test_config(&server, ":memory:");
    config.crawler.concurrent_requests = 4;

    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.pages_scanned, 7);
    let mut urls = page_urls(crawler.storage(), summary.session_id);
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 7);
}

#[tokio::test]
async fn test_depth_cap_stops_expansion() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/b">B</a>"#).await;
    mount_never_fetched(&server, "/b").await;

    let mut config = create_test_config(&server, ":memory:");
    config.crawler.max_depth = 1;

    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, SessionStatus::Completed);
    assert_eq!(summary.pages_scanned, 2);
}

#[tokio::test]
async fn test_failed_fetches_become_stub_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/loop">Loop</a><a href="/missing">Missing</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"<a href="/never">x</a>"#))
        .mount(&server)
        .await;
    mount_never_fetched(&server, "/never").await;

    let config = create_test_config(&server, ":memory:");
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, SessionStatus::Completed);
    assert_eq!(summary.pages_scanned, 3);

    let storage = crawler.storage();
    let looped = storage
        .get_page_by_url(summary.session_id, &format!("{}/loop", base))
        .unwrap()
        .unwrap();
    assert_eq!(looped.status_code, 0);
    assert!(looped.title.is_none());

    let missing = storage
        .get_page_by_url(summary.session_id, &format!("{}/missing", base))
        .unwrap()
        .unwrap();
    assert_eq!(missing.status_code, 404);
}

#[tokio::test]
async fn test_redirected_page_records_chain() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/old">Old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<p>moved here</p>").await;

    let config = create_test_config(&server, ":memory:");
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    let old = crawler
        .storage()
        .get_page_by_url(summary.session_id, &format!("{}/old", base))
        .unwrap()
        .unwrap();
    assert!(old.is_redirect);
    assert_eq!(old.final_url, Some(format!("{}/new", base)));
    assert_eq!(
        old.redirect_chain,
        Some(format!("{}/old -> {}/new", base, base))
    );
}

#[tokio::test]
async fn test_cancel_mid_crawl_stops_session() {
    let server = MockServer::start().await;

    let mut home = String::from("<html><body>");
    for i in 0..5 {
        home.push_str(&format!(r#"<a href="/p{}">p{}</a>"#, i, i));
        mount_never_fetched(&server, &format!("/p{}", i)).await;
    }
    home.push_str("</body></html>");
    mount_page(&server, "/", &home).await;

    let config = create_test_config(&server, ":memory:");
    let control = CrawlControl::new();
    let observer = CancelAfter {
        control: control.clone(),
        pages: 1,
    };
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap())
        .unwrap()
        .with_control(control)
        .with_observer(Arc::new(observer));

    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, SessionStatus::Stopped);
    assert_eq!(summary.pages_scanned, 1);
    assert_eq!(crawler.state(), ScanState::Stopped);

    let session = crawler.storage().get_session(summary.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Stopped);
    assert_eq!(session.total_pages_scanned, 1);
    assert_eq!(crawler.storage().count_pages(summary.session_id).unwrap(), 1);
}

#[tokio::test]
async fn test_pause_holds_dispatch_until_resume() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", "<p>leaf</p>").await;

    let config = create_test_config(&server, ":memory:");
    let control = CrawlControl::new();
    control.pause();

    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap())
        .unwrap()
        .with_control(control.clone());

    let controller = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let requests = server.received_requests().await.unwrap_or_default();
        let page_requests = requests
            .iter()
            .filter(|r| r.url.path() != "/robots.txt")
            .count();
        control.resume();
        page_requests
    };

    let (result, fetched_while_paused) = tokio::join!(crawler.run(), controller);
    let summary = result.unwrap();

    assert_eq!(fetched_while_paused, 0);
    assert_eq!(summary.status, SessionStatus::Completed);
    assert_eq!(summary.pages_scanned, 2);
}

#[tokio::test]
async fn test_cancel_while_paused_stops_without_fetching() {
    let server = MockServer::start().await;
    mount_never_fetched(&server, "/").await;

    let config = create_test_config(&server, ":memory:");
    let control = CrawlControl::new();
    control.pause();

    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap())
        .unwrap()
        .with_control(control.clone());

    let canceller = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        control.cancel();
    };

    let (result, ()) = tokio::join!(crawler.run(), canceller);
    let summary = result.unwrap();

    assert!(control.is_paused());
    assert_eq!(summary.status, SessionStatus::Stopped);
    assert_eq!(summary.pages_scanned, 0);
    assert_eq!(crawler.state(), ScanState::Stopped);

    let session = crawler.storage().get_session(summary.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Stopped);
    assert_eq!(crawler.storage().count_pages(summary.session_id).unwrap(), 0);
}

#[tokio::test]
async fn test_progress_stream_reports_every_fetch() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "<p>a</p>").await;
    mount_page(&server, "/b", "<p>b</p>").await;

    let config = create_test_config(&server, ":memory:");
    let (observer, mut rx) = ChannelObserver::new();
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap())
        .unwrap()
        .with_observer(Arc::new(observer));
    let summary = crawler.run().await.unwrap();

    let mut progress = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CrawlEvent::Progress(p) = event {
            progress.push(p);
        }
    }

    assert_eq!(progress.len(), summary.pages_scanned as usize);
    assert_eq!(progress[0].current_url, format!("{}/", base));
    assert_eq!(progress[0].scanned_count, 1);
    assert_eq!(progress[0].queue_count, 2);
    assert_eq!(progress[0].total_known_urls, 3);
    assert!(progress[0].latest_page.id.is_some());
    assert_eq!(progress[2].queue_count, 0);
}

#[tokio::test]
async fn test_duplicate_content_is_detected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "<p>same body</p>").await;
    mount_page(&server, "/b", "<p>same body</p>").await;

    let config = create_test_config(&server, ":memory:");
    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    let duplicates = crawler
        .storage()
        .find_duplicate_content(summary.session_id)
        .unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(
        duplicates[0].1,
        vec![format!("{}/a", base), format!("{}/b", base)]
    );
}

#[tokio::test]
async fn test_images_saved_only_when_enabled() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<img src="/logo.png" alt=""><img src="/hero.jpg" alt="Hero">"#)
        .await;

    let mut config = create_test_config(&server, ":memory:");
    config.crawler.save_images = true;

    let mut crawler = Crawler::new(config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = crawler.run().await.unwrap();

    let storage = crawler.storage();
    let home = &storage.get_pages(summary.session_id).unwrap()[0];
    assert_eq!(home.image_count, 2);
    assert_eq!(home.missing_alt_count, 1);
    assert_eq!(storage.get_images(home.id.unwrap()).unwrap().len(), 2);
}
