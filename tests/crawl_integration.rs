//! End-to-end crawl tests against a mock forum
//!
//! These spin up a wiremock server standing in for the forum's search and
//! thread pages, and drive the orchestrator through the full pipeline:
//! window generation, splitting, page walking, extraction, aggregation,
//! and cancellation.

use chrono::NaiveDate;
use mediatrawl::config::{Config, CrawlerConfig, OutputConfig, SiteConfig};
use mediatrawl::crawler::{Orchestrator, Subject};
use mediatrawl::media::MediaKind;
use mediatrawl::session::SessionRegistry;
use mediatrawl::TrawlError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            search_id: "40169483".to_string(),
            user_agent: "mediatrawl-test/1.0".to_string(),
        },
        crawler: CrawlerConfig {
            workers: 4,
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            gallery_path: "unused.html".to_string(),
        },
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()
}

const SEARCH_PAGE: &str = r#"
<html><body>
    <a href="/threads/jane-photos.1/">Jane Doe appreciation</a>
    <a href="/threads/misc.2/">Misc thread</a>
    <div class="pageNav">
        <a href="?page=1">1</a>
        <a href="?page=2">2</a>
    </div>
</body></html>
"#;

const JANE_THREAD: &str = r#"
<html><body>
    <article data-author="Jane Doe">
        <time class="u-dt" datetime="2020-05-04T10:00:00+0000"></time>
        <img src="https://cdn.example.com/a.jpg">
        <img src="/attachments/b.jpg">
        <img src="https://cdn.example.com/data/avatars/s/0/1.jpg">
        <video src="https://cdn.example.com/v.mp4"></video>
    </article>
</body></html>
"#;

const MISC_THREAD: &str = r#"
<html><body>
    <article data-author="Other Person">
        <p>Nothing about the subject here</p>
        <img src="https://cdn.example.com/unrelated.jpg">
    </article>
</body></html>
"#;

async fn mount_forum(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search/40169483/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/jane-photos.1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(JANE_THREAD))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/misc.2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MISC_THREAD))
        .mount(server)
        .await;
}

#[tokio::test]
async fn end_to_end_crawl_aggregates_and_dedups() {
    let server = MockServer::start().await;
    mount_forum(&server).await;

    let registry = SessionRegistry::new();
    let orchestrator = Orchestrator::new(test_config(&server.uri()), registry.clone()).unwrap();
    let subjects = vec![Subject::new("Jane Doe", 2020, 2020, false)];

    let outcome = orchestrator
        .run_crawl_as_of(1, &subjects, today())
        .await
        .unwrap();

    assert!(!outcome.report.stopped);
    assert!(!registry.is_active(1));

    let store = &outcome.stores["Jane Doe"];

    // Every window surfaced the same two posts and the same media, but
    // each URL is recorded exactly once
    assert_eq!(store.count(MediaKind::Image), 2);
    assert_eq!(store.count(MediaKind::Video), 1);
    assert_eq!(store.count(MediaKind::Gif), 0);

    let items = store.items_newest_first();
    let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
    assert!(urls.contains(&"https://cdn.example.com/a.jpg"));
    assert!(urls.contains(&"https://cdn.example.com/v.mp4"));
    // Relative src resolved against the site origin
    let resolved = format!("{}/attachments/b.jpg", server.uri());
    assert!(urls.contains(&resolved.as_str()));
    // The avatar never made it in
    assert!(!urls.iter().any(|u| u.contains("avatars")));

    // Both dated off the post timestamp
    assert!(items.iter().all(|i| i.date == "2020-05-04"));

    let report = &outcome.report.subjects[0];
    assert_eq!(report.name, "Jane Doe");
    assert!(report.windows_planned > 0);
    assert!(report.windows_final >= report.windows_planned);
    assert_eq!(report.posts_processed, 2);
    assert_eq!(report.images, 2);
    assert_eq!(report.videos, 1);
}

#[tokio::test]
async fn no_media_is_a_normal_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    let registry = SessionRegistry::new();
    let orchestrator = Orchestrator::new(test_config(&server.uri()), registry.clone()).unwrap();
    let subjects = vec![Subject::new("Jane Doe", 2020, 2020, false)];

    let outcome = orchestrator
        .run_crawl_as_of(1, &subjects, today())
        .await
        .unwrap();

    assert!(!outcome.report.stopped);
    assert_eq!(outcome.stores["Jane Doe"].total(), 0);
    assert_eq!(outcome.report.total_items(), 0);
    assert!(!registry.is_active(1));
}

#[tokio::test]
async fn cancellation_stops_the_crawl_and_keeps_partials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/40169483/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&server)
        .await;
    // Thread pages hang long enough for the cancel to land while the
    // extraction batch is outstanding
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(JANE_THREAD)
                .set_delay(Duration::from_secs(60)),
        )
        .mount(&server)
        .await;

    let registry = SessionRegistry::new();
    let orchestrator =
        Arc::new(Orchestrator::new(test_config(&server.uri()), registry.clone()).unwrap());

    let task = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            let subjects = vec![Subject::new("Jane Doe", 2020, 2020, false)];
            orchestrator.run_crawl_as_of(5, &subjects, today()).await
        })
    };

    // Let the crawl get past window generation and into fetching
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(registry.cancel(5));

    let outcome = task.await.unwrap().unwrap();
    assert!(outcome.report.stopped);
    assert!(!registry.is_active(5));

    // Only posts whose extraction had completed before the cancel can have
    // contributed; the hung ones contributed nothing
    let store = &outcome.stores["Jane Doe"];
    assert_eq!(store.total(), 0);

    // A second cancel finds no active crawl
    assert!(!registry.cancel(5));
}

#[tokio::test]
async fn concurrent_crawl_for_same_session_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(SEARCH_PAGE)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let registry = SessionRegistry::new();
    let orchestrator =
        Arc::new(Orchestrator::new(test_config(&server.uri()), registry.clone()).unwrap());

    let task = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            let subjects = vec![Subject::new("Jane Doe", 2020, 2020, false)];
            orchestrator.run_crawl_as_of(9, &subjects, today()).await
        })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;

    let subjects = vec![Subject::new("Jane Doe", 2020, 2020, false)];
    let second = orchestrator.run_crawl_as_of(9, &subjects, today()).await;
    assert!(matches!(second, Err(TrawlError::SessionBusy(9))));

    registry.cancel(9);
    let outcome = task.await.unwrap().unwrap();
    assert!(outcome.report.stopped);
}
