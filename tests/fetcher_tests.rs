//! Fetch pipeline tests against a mocked search endpoint.

use chrono::{Duration, Utc};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use research_assistant::config::ArxivConfig;
use research_assistant::error::{EntryError, FetchError};
use research_assistant::fetcher::ArxivFetcher;

const FEED_PATH: &str = "/api/query";

fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days)).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn entry(id: &str, title: &str, published: &str) -> String {
    format!(
        r#"<entry>
    <id>http://arxiv.org/abs/{id}v1</id>
    <published>{published}</published>
    <title>{title}</title>
    <summary>Abstract of {title}.</summary>
    <author><name>First Author</name></author>
    <author><name>Second Author</name></author>
    <link href="http://arxiv.org/abs/{id}v1" rel="alternate" type="text/html"/>
  </entry>"#
    )
}

fn feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query</title>
  {}
</feed>"#,
        entries.join("\n  ")
    )
}

async fn setup(body: String, status: u16) -> (MockServer, ArxivFetcher) {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&mock_server)
        .await;

    let config = ArxivConfig::with_endpoint(&format!("{}{}", mock_server.uri(), FEED_PATH));
    let fetcher = ArxivFetcher::new(config).unwrap();
    (mock_server, fetcher)
}

#[tokio::test]
async fn test_request_carries_query_parameters() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("search_query", "all:quantum computing"))
        .and(query_param("start", "0"))
        .and(query_param("max_results", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ArxivConfig::with_endpoint(&format!("{}{}", mock_server.uri(), FEED_PATH));
    let fetcher = ArxivFetcher::new(config).unwrap();
    let report = fetcher.fetch_papers("quantum computing", 3).await.unwrap();
    assert!(report.papers.is_empty());
}

#[tokio::test]
async fn test_fetch_uses_configured_bound() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("max_results", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
            entry("2401.00002", "Recent one", &days_ago(30)),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ArxivConfig::with_endpoint(&format!("{}{}", mock_server.uri(), FEED_PATH));
    assert_eq!(config.max_results, 5);
    let fetcher = ArxivFetcher::new(config).unwrap();
    let report = fetcher.fetch("graph neural networks").await.unwrap();
    assert_eq!(report.papers.len(), 1);
}

#[tokio::test]
async fn test_two_of_five_in_window() {
    let body = feed(&[
        entry("1801.00001", "Old one", &days_ago(365 * 8)),
        entry("2401.00002", "Recent one", &days_ago(30)),
        entry("1901.00003", "Old two", &days_ago(365 * 7)),
        entry("2501.00004", "Recent two", &days_ago(400)),
        entry("1701.00005", "Old three", &days_ago(365 * 9)),
    ]);
    let (_server, fetcher) = setup(body, 200).await;

    let report = fetcher.fetch_papers("graphs", 5).await.unwrap();
    let titles = report.papers.iter().map(|p| p.title()).collect::<Vec<_>>();
    assert_eq!(titles, ["Recent one", "Recent two"]);
    assert_eq!(report.stale, 3);
    assert!(report.skipped.is_empty());

    let first = &report.papers[0];
    assert_eq!(first.authors(), ["First Author", "Second Author"]);
    assert_eq!(first.abstract_text(), "Abstract of Recent one.");
    assert_eq!(first.url(), "http://arxiv.org/abs/2401.00002v1");
}

#[tokio::test]
async fn test_server_error_is_signalled() {
    let (_server, fetcher) = setup(String::from("Internal Server Error"), 500).await;

    match fetcher.fetch_papers("graphs", 5).await {
        Err(FetchError::Status { status }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_entry_missing_title_is_skipped() {
    let untitled = format!(
        "<entry><id>http://arxiv.org/abs/2402.00009v1</id><published>{}</published>\
         <summary>No title.</summary></entry>",
        days_ago(10)
    );
    let body = feed(&[
        entry("2401.00001", "Kept one", &days_ago(10)),
        untitled,
        entry("2401.00003", "Kept two", &days_ago(20)),
    ]);
    let (_server, fetcher) = setup(body, 200).await;

    let report = fetcher.fetch_papers("graphs", 5).await.unwrap();
    let titles = report.papers.iter().map(|p| p.title()).collect::<Vec<_>>();
    assert_eq!(titles, ["Kept one", "Kept two"]);
    assert_eq!(report.skipped, vec![(1, EntryError::MissingField("title"))]);
}

#[tokio::test]
async fn test_malformed_body_fails_whole_call() {
    let (_server, fetcher) = setup(String::from("<feed><entry><title>cut off"), 200).await;
    assert!(matches!(
        fetcher.fetch_papers("graphs", 5).await,
        Err(FetchError::Parse(_))
    ));
}

#[tokio::test]
async fn test_result_bounded_by_max_results() {
    let entries = (0..6)
        .map(|i| entry(&format!("2401.0000{}", i), &format!("Paper {}", i), &days_ago(5)))
        .collect::<Vec<_>>();
    let (_server, fetcher) = setup(feed(&entries), 200).await;

    let report = fetcher.fetch_papers("graphs", 2).await.unwrap();
    assert_eq!(report.papers.len(), 2);
}

#[tokio::test]
async fn test_repeated_fetch_yields_equal_records() {
    let body = feed(&[entry("2401.00001", "Stable", &days_ago(3))]);
    let (_server, fetcher) = setup(body, 200).await;

    let first = fetcher.fetch_papers("graphs", 5).await.unwrap().into_papers();
    let second = fetcher.fetch_papers("graphs", 5).await.unwrap().into_papers();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_topic_never_hits_network() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = ArxivFetcher::new(ArxivConfig::with_endpoint(&mock_server.uri())).unwrap();
    assert!(matches!(
        fetcher.fetch_papers("   ", 5).await,
        Err(FetchError::InvalidRequest(_))
    ));
    assert!(matches!(
        fetcher.fetch_papers("graphs", 0).await,
        Err(FetchError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    // nothing listens on the discard port.
    let fetcher = ArxivFetcher::new(ArxivConfig::with_endpoint("http://127.0.0.1:9/api/query")).unwrap();
    assert!(matches!(
        fetcher.fetch_papers("graphs", 5).await,
        Err(FetchError::Transport(_))
    ));
}
