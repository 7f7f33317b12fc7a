//! Integration tests for `CategoryScraper` driving `HttpPageFetcher`.
//!
//! Each test stands up a `wiremock` server that serves a numbered category
//! listing, so no real network traffic is made.

use std::sync::Arc;

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use harvest_core::ListingProfile;
use harvest_scraper::{
    CategoryScraper, HttpFetcherConfig, HttpPageFetcher, OriginThrottle, ScraperError, StopReason,
};

fn test_fetcher(max_retries: u32) -> HttpPageFetcher {
    HttpPageFetcher::new(&HttpFetcherConfig {
        timeout_secs: Some(5),
        user_agent: "harvest-test/0.1".to_owned(),
        max_retries,
        backoff_base_secs: 0,
    })
    .expect("failed to build test fetcher")
}

fn test_scraper(max_retries: u32) -> CategoryScraper<HttpPageFetcher> {
    CategoryScraper::new(
        test_fetcher(max_retries),
        Arc::new(OriginThrottle::disabled()),
        ListingProfile::default(),
        50,
    )
    .expect("valid scraper")
}

fn category_url(server: &MockServer) -> String {
    format!("{}/index.php?route=product/category&path=38", server.uri())
}

fn listing_html(title: Option<&str>, ids: &[u64]) -> String {
    let title = title
        .map(|t| format!(r#"<h1 class="title page-title">{t}</h1>"#))
        .unwrap_or_default();
    let products: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="product-thumb"><a href="/index.php?route=product/product&amp;path=38&amp;product_id={id}"><img src="/p/{id}.jpg"></a></div>"#
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>Shop</title></head><body>
<nav><a href="/index.php?route=common/home">Home</a></nav>
{title}
<div class="row">{products}</div>
</body></html>"#
    )
}

const END_HTML: &str = r#"<!DOCTYPE html><html><body>
<h1 class="title page-title">Chairs</h1>
<div id="cart"><p>Your shopping cart is empty!</p></div>
</body></html>"#;

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn mount_first_page(server: &MockServer, template: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("route", "product/category"))
        .and(query_param_is_missing("page"))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: &str, template: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("page", page))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scrapes_pages_until_sentinel() {
    let server = MockServer::start().await;
    mount_first_page(&server, html(listing_html(Some("Chairs"), &[101, 102])), 1).await;
    mount_page(&server, "2", html(listing_html(None, &[102, 103])), 1).await;
    mount_page(&server, "3", html(END_HTML.to_owned()), 1).await;

    let mut scraper = test_scraper(0);
    let outcome = scraper
        .scrape(&category_url(&server))
        .await
        .expect("scrape succeeds");

    assert_eq!(outcome.dataset.category_name, "Chairs");
    assert_eq!(outcome.dataset.product_ids, vec![101, 102, 103]);
    assert_eq!(outcome.stop, StopReason::EndOfListing { page: 3 });
    assert_eq!(outcome.pages_fetched, 3);
}

#[tokio::test]
async fn ignores_links_without_product_marker() {
    let server = MockServer::start().await;
    mount_first_page(&server, html(listing_html(Some("Sofas"), &[7])), 1).await;
    mount_page(&server, "2", html(listing_html(None, &[])), 1).await;

    let mut scraper = test_scraper(0);
    let outcome = scraper
        .scrape(&category_url(&server))
        .await
        .expect("scrape succeeds");

    assert_eq!(outcome.dataset.product_ids, vec![7]);
    assert_eq!(outcome.stop, StopReason::NoResults { page: 2 });
}

#[tokio::test]
async fn scrape_to_dir_writes_dataset_file() {
    let server = MockServer::start().await;
    mount_first_page(&server, html(listing_html(Some("Chairs"), &[2, 1])), 1).await;
    mount_page(&server, "2", html(END_HTML.to_owned()), 1).await;
    let dir = tempfile::tempdir().unwrap();

    let mut scraper = test_scraper(0);
    let (_, written) = scraper
        .scrape_to_dir(&category_url(&server), dir.path())
        .await
        .expect("scrape succeeds");

    assert_eq!(written, dir.path().join("Chairs_products.json"));
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"category_name": "Chairs", "product_ids": [1, 2]})
    );
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_page_not_found_writes_nothing() {
    let server = MockServer::start().await;
    mount_first_page(&server, ResponseTemplate::new(404), 1).await;
    let dir = tempfile::tempdir().unwrap();

    let mut scraper = test_scraper(0);
    let err = scraper
        .scrape_to_dir(&category_url(&server), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::NotFound { .. }), "got: {err:?}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_title_is_fatal() {
    let server = MockServer::start().await;
    mount_first_page(&server, html(listing_html(None, &[1, 2])), 1).await;

    let mut scraper = test_scraper(0);
    let err = scraper.scrape(&category_url(&server)).await.unwrap_err();

    assert!(matches!(err, ScraperError::MissingCategoryTitle { .. }));
}

#[tokio::test]
async fn rate_limit_mid_listing_keeps_partial_results() {
    let server = MockServer::start().await;
    mount_first_page(&server, html(listing_html(Some("Chairs"), &[1, 2])), 1).await;
    mount_page(
        &server,
        "2",
        ResponseTemplate::new(429).insert_header("Retry-After", "30"),
        1,
    )
    .await;

    let mut scraper = test_scraper(0);
    let outcome = scraper
        .scrape(&category_url(&server))
        .await
        .expect("partial results kept");

    assert_eq!(outcome.dataset.product_ids, vec![1, 2]);
    match outcome.stop {
        StopReason::FetchError { page, message } => {
            assert_eq!(page, 2);
            assert!(message.contains("retry after 30s"), "message: {message}");
        }
        other => panic!("expected FetchError, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_retries_recover_from_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_first_page(&server, html(listing_html(Some("Chairs"), &[9])), 1).await;
    mount_page(&server, "2", html(END_HTML.to_owned()), 1).await;

    let mut scraper = test_scraper(2);
    let outcome = scraper
        .scrape(&category_url(&server))
        .await
        .expect("retry recovers");

    assert_eq!(outcome.dataset.product_ids, vec![9]);
    assert_eq!(outcome.stop, StopReason::EndOfListing { page: 2 });
}
