//! Integration tests for the harvester
//!
//! These tests use wiremock to serve listing and detail pages and run the
//! full discover/fetch/extract/accumulate cycle end-to-end. Listings are
//! loaded by a plain HTTP expander standing in for the browser.

use async_trait::async_trait;
use longchau_harvest::config::{CategoryEntry, Config, HttpConfig, SiteConfig};
use longchau_harvest::crawler::{
    BrowserError, HttpFetcher, ListingDiscoverer, ListingExpander, Pacer,
};
use longchau_harvest::output::{save_records, OutputFormat};
use longchau_harvest::{
    run_interruptible, CategoryTarget, Coordinator, CrawlMode, ProductExtractor, RunOutcome,
    Taxonomy,
};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MAIN: &str = "thuc-pham-chuc-nang";

/// Loads listing pages over plain HTTP, reporting 4xx/5xx like the browser does
struct HttpListings {
    client: reqwest::Client,
}

#[async_trait]
impl ListingExpander for HttpListings {
    async fn load_and_expand(&self, url: &Url) -> Result<String, BrowserError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(BrowserError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        response
            .text()
            .await
            .map_err(|e| BrowserError::Content(e.to_string()))
    }
}

/// Creates a test configuration rooted at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            ..SiteConfig::default()
        },
        http: HttpConfig {
            timeout_secs: 5,
            max_retries: 3,
            retry_base_delay_ms: 10, // Very short for testing
            ..HttpConfig::default()
        },
        categories: vec![CategoryEntry {
            main: MAIN.to_string(),
            subcategories: vec!["vitamin-c".to_string(), "vitamin-e".to_string()],
        }],
        ..Config::default()
    }
}

fn create_coordinator(config: &Config) -> Coordinator {
    let listings = HttpListings {
        client: reqwest::Client::new(),
    };
    Coordinator::new(
        Box::new(HttpFetcher::new(&config.http).expect("Failed to build fetcher")),
        ListingDiscoverer::new(Box::new(listings), &config.site).expect("Failed to build discoverer"),
        ProductExtractor::new(&config.site).expect("Failed to build extractor"),
        Pacer::disabled(),
        Taxonomy::from_config(config),
    )
}

fn listing_page(hrefs: &[&str]) -> String {
    let cards: String = hrefs
        .iter()
        .map(|href| format!(r#"<div class="card"><a href="{}">product</a></div>"#, href))
        .collect();
    format!(
        r#"<html><body>
        <nav><a href="/{MAIN}/promo.html">promo</a></nav>
        <div class="grid grid-cols-2 gap-3 md:grid-cols-4">{cards}</div>
        </body></html>"#
    )
}

fn detail_page(name: &str, price: &str, rating_block: &str) -> String {
    format!(
        r#"<html><head><title>{name}</title></head><body>
        <h1 data-test="product_name">{name}</h1>
        <span data-test="price">{price}</span>
        {rating_block}
        <table><tr><th>Thương hiệu</th><td>Brand X</td></tr></table>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn target(path: &str) -> CategoryTarget {
    CategoryTarget::parse(path).expect("Failed to parse target")
}

#[tokio::test]
async fn test_single_category_harvest() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());

    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/vitamin-c",
        listing_page(&[
            "/thuc-pham-chuc-nang/vien-sui-c.html",
            "/thuc-pham-chuc-nang/c-500.html",
            "/thuoc/panadol.html",
        ]),
    )
    .await;
    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/vien-sui-c.html",
        detail_page("Viên sủi C", "120.000đ", "<span>4.8 (25 đánh giá)</span>"),
    )
    .await;
    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/c-500.html",
        detail_page("Vitamin C 500", "85.000đ", ""),
    )
    .await;

    let mut coordinator = create_coordinator(&config);
    let added = coordinator
        .crawl_category(&target("thuc-pham-chuc-nang/vitamin-c"), None)
        .await
        .expect("Category crawl failed");

    assert_eq!(added, 2);
    let records = coordinator.state().records();
    assert_eq!(records[0].name, "Viên sủi C");
    assert_eq!(records[0].price, 120000.0);
    assert_eq!(records[0].rating, 4.8);
    assert_eq!(records[0].brand, "Brand X");
    assert!(records[0].url.ends_with("/thuc-pham-chuc-nang/vien-sui-c.html"));

    // No rating block at all
    assert_eq!(records[1].rating, 0.0);

    // Links outside the category prefix are never followed
    assert!(records.iter().all(|r| r.url.contains("/thuc-pham-chuc-nang/")));
}

#[tokio::test]
async fn test_detail_retried_after_server_error() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());

    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/vitamin-c",
        listing_page(&["/thuc-pham-chuc-nang/flaky.html", "/thuc-pham-chuc-nang/down.html"]),
    )
    .await;

    // First attempt fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/thuc-pham-chuc-nang/flaky.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/flaky.html",
        detail_page("Flaky", "10.000đ", ""),
    )
    .await;

    // Always failing: skipped after every retry
    Mock::given(method("GET"))
        .and(path("/thuc-pham-chuc-nang/down.html"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut coordinator = create_coordinator(&config);
    let added = coordinator
        .crawl_category(&target("thuc-pham-chuc-nang/vitamin-c"), None)
        .await
        .expect("Category crawl failed");

    assert_eq!(added, 1);
    assert_eq!(coordinator.state().records()[0].name, "Flaky");
    assert_eq!(coordinator.state().skipped().len(), 1);
    assert!(coordinator.state().skipped()[0].url.ends_with("/down.html"));
}

#[tokio::test]
async fn test_empty_category_completes() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());

    mount_html(&mock_server, "/thuc-pham-chuc-nang/vitamin-c", listing_page(&[])).await;

    let mut coordinator = create_coordinator(&config);
    let added = coordinator
        .crawl_category(&target("thuc-pham-chuc-nang/vitamin-c"), Some(10))
        .await
        .expect("Empty category should not be an error");

    assert_eq!(added, 0);
    assert!(coordinator.state().is_empty());
    assert!(coordinator.state().failed_targets().is_empty());
}

#[tokio::test]
async fn test_missing_subcategory_is_skipped() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/thuc-pham-chuc-nang/vitamin-c"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/vitamin-e",
        listing_page(&["/thuc-pham-chuc-nang/e-400.html"]),
    )
    .await;
    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/e-400.html",
        detail_page("Vitamin E 400", "150.000đ", ""),
    )
    .await;

    let mut coordinator = create_coordinator(&config);
    coordinator
        .run_mode(&CrawlMode::Subcategories {
            main: MAIN.to_string(),
            subcategories: vec!["vitamin-c".to_string(), "vitamin-e".to_string()],
            max_per_category: Some(10),
        })
        .await
        .expect("Subcategory run failed");

    let state = coordinator.state();
    assert_eq!(state.len(), 1);
    assert_eq!(state.records()[0].name, "Vitamin E 400");
    assert_eq!(state.failed_targets().len(), 1);
    assert_eq!(state.failed_targets()[0].target, "thuc-pham-chuc-nang/vitamin-c");
}

#[tokio::test]
async fn test_shared_product_fetched_once() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());

    for sub in ["vitamin-c", "vitamin-e"] {
        mount_html(
            &mock_server,
            &format!("/thuc-pham-chuc-nang/{}", sub),
            listing_page(&["/thuc-pham-chuc-nang/multi.html"]),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/thuc-pham-chuc-nang/multi.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(detail_page("Multivitamin", "99.000đ", "")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut coordinator = create_coordinator(&config);
    coordinator
        .run_mode(&CrawlMode::All {
            max_per_category: None,
        })
        .await
        .expect("Run failed");

    assert_eq!(coordinator.state().len(), 1);
    assert_eq!(coordinator.state().visited().len(), 2);
    assert_eq!(
        coordinator.state().output_stem().as_deref(),
        Some("thuc-pham-chuc-nang_2cats")
    );
}

#[tokio::test]
async fn test_interrupt_flushes_accumulated_records() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());
    let output_dir = tempfile::tempdir().expect("Failed to create temp dir");

    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/vitamin-c",
        listing_page(&["/thuc-pham-chuc-nang/first.html"]),
    )
    .await;
    mount_html(
        &mock_server,
        "/thuc-pham-chuc-nang/first.html",
        detail_page("First", "1.000đ", ""),
    )
    .await;

    // The second listing takes far longer than the interrupt
    Mock::given(method("GET"))
        .and(path("/thuc-pham-chuc-nang/vitamin-e"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&mock_server)
        .await;

    let mut coordinator = create_coordinator(&config);
    let outcome = run_interruptible(
        &mut coordinator,
        &CrawlMode::All {
            max_per_category: None,
        },
        tokio::time::sleep(Duration::from_millis(1500)),
    )
    .await
    .expect("Run failed");

    assert_eq!(outcome, RunOutcome::Interrupted);
    assert_eq!(coordinator.state().len(), 1);

    let paths = save_records(
        coordinator.state(),
        OutputFormat::Jsonl,
        output_dir.path(),
        "longchau_products",
    )
    .expect("Failed to save records");

    assert_eq!(paths.len(), 1);
    let content = std::fs::read_to_string(&paths[0]).expect("Failed to read output");
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("\"First\""));
}
