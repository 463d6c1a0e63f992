//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the traversal loop that ties discovery, fetching,
//! extraction and accumulation together:
//! - Discovering the product URLs of each category listing
//! - Fetching and extracting every detail page sequentially
//! - Isolating failures per URL and per category target
//! - Pacing requests with randomized delays
//! - Stopping cleanly on interrupt so the caller can flush what was gathered

use crate::catalog::{CategoryTarget, CrawlMode, Taxonomy};
use crate::config::Config;
use crate::crawler::browser::ChromeExpander;
use crate::crawler::delay::Pacer;
use crate::crawler::discovery::ListingDiscoverer;
use crate::crawler::fetcher::{DetailFetcher, HttpFetcher};
use crate::extract::ProductExtractor;
use crate::state::RunState;
use crate::HarvestError;
use std::future::Future;
use url::Url;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every target was traversed
    Completed,
    /// The interrupt fired first; the state holds what was gathered until then
    Interrupted,
}

/// Main crawler coordinator structure
///
/// Owns the accumulated [`RunState`]; one instance can serve several
/// independent runs through [`Coordinator::reset`].
pub struct Coordinator {
    fetcher: Box<dyn DetailFetcher>,
    discoverer: ListingDiscoverer,
    extractor: ProductExtractor,
    pacer: Pacer,
    taxonomy: Taxonomy,
    state: RunState,
}

impl Coordinator {
    /// Creates a coordinator from its parts
    pub fn new(
        fetcher: Box<dyn DetailFetcher>,
        discoverer: ListingDiscoverer,
        extractor: ProductExtractor,
        pacer: Pacer,
        taxonomy: Taxonomy,
    ) -> Self {
        Self {
            fetcher,
            discoverer,
            extractor,
            pacer,
            taxonomy,
            state: RunState::new(),
        }
    }

    /// Creates a coordinator backed by reqwest and a headless Chrome
    ///
    /// # Arguments
    ///
    /// * `config` - The validated harvester configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client or a site pattern could not be built
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let expander = ChromeExpander::new(
            &config.browser,
            &config.http,
            &config.site.load_more_pattern,
        );
        let discoverer = ListingDiscoverer::new(Box::new(expander), &config.site)?;
        let fetcher = HttpFetcher::new(&config.http)?;
        let extractor = ProductExtractor::new(&config.site)?;

        Ok(Self::new(
            Box::new(fetcher),
            discoverer,
            extractor,
            Pacer::from_config(&config.delay),
            Taxonomy::from_config(config),
        ))
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Clears accumulated records and visited categories
    pub fn reset(&mut self) {
        tracing::debug!("Resetting run state ({} record(s) dropped)", self.state.len());
        self.state.reset();
    }

    /// Traverses one category
    ///
    /// Discovers the product URLs of `target`, keeps the first `max_products`
    /// of them and processes each sequentially. A URL that fails to fetch or
    /// parse is skipped; a URL already accumulated in this run is not fetched
    /// again.
    ///
    /// # Returns
    ///
    /// * `Ok(n)` - `n` new records were accumulated
    /// * `Err(HarvestError)` - The listing itself could not be discovered
    pub async fn crawl_category(
        &mut self,
        target: &CategoryTarget,
        max_products: Option<usize>,
    ) -> Result<usize, HarvestError> {
        self.state.visit(target);

        let discovered = self.discoverer.discover(target).await;
        self.pacer.pause().await;
        let mut urls = discovered?;

        if let Some(max) = max_products {
            if urls.len() > max {
                tracing::debug!("Keeping {} of {} product URL(s)", max, urls.len());
                urls.truncate(max);
            }
        }

        let total = urls.len();
        let mut added = 0;
        for (index, url) in urls.iter().enumerate() {
            if self.state.contains(url.as_str()) {
                tracing::debug!("Already accumulated {}, skipping", url);
                continue;
            }

            tracing::info!("[{}/{}] {}", index + 1, total, url);
            if self.process_url(url).await {
                added += 1;
            }
            self.pacer.pause().await;
        }

        tracing::info!("{}: {} new record(s) from {} URL(s)", target, added, total);
        Ok(added)
    }

    /// Fetches, extracts and accumulates one detail page
    ///
    /// Returns true if a record was added.
    async fn process_url(&mut self, url: &Url) -> bool {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                self.state.skip_url(url.as_str(), e.to_string());
                return false;
            }
        };

        match self.extractor.extract(&html, url) {
            Ok(record) => self.state.push(record),
            Err(source) => {
                let e = HarvestError::Parse {
                    url: url.to_string(),
                    source,
                };
                tracing::warn!("Skipping {}", e);
                self.state.skip_url(url.as_str(), e.to_string());
                false
            }
        }
    }

    /// Runs [`Coordinator::crawl_category`] and records a failure instead of
    /// returning it
    async fn crawl_isolated(&mut self, target: &CategoryTarget, max_products: Option<usize>) -> usize {
        match self.crawl_category(target, max_products).await {
            Ok(added) => added,
            Err(e) => {
                tracing::error!("Skipping category {}: {}", target, e);
                self.state.fail_target(target.display_path(), e.to_string());
                0
            }
        }
    }

    /// Traverses explicit subcategories of `main`
    ///
    /// A failing subcategory (malformed slug, unreachable listing) is logged
    /// and skipped; the remaining ones still run.
    pub async fn crawl_subcategories(
        &mut self,
        main: &str,
        subcategories: &[String],
        max_per_category: Option<usize>,
    ) -> usize {
        tracing::info!("Crawling {} subcategor(ies) of {}", subcategories.len(), main);

        let mut added = 0;
        for sub in subcategories {
            match CategoryTarget::child(main, sub) {
                Ok(target) => added += self.crawl_isolated(&target, max_per_category).await,
                Err(e) => {
                    tracing::error!("Skipping subcategory '{}' of {}: {}", sub, main, e);
                    self.state.fail_target(format!("{}/{}", main, sub), e.to_string());
                }
            }
        }
        added
    }

    /// Traverses every top-level category of the taxonomy
    ///
    /// Failures are isolated per top-level category and, within one, per
    /// subcategory.
    pub async fn crawl_all_categories(&mut self, max_per_category: Option<usize>) -> usize {
        let mains: Vec<String> = self.taxonomy.mains().map(str::to_string).collect();
        tracing::info!("Crawling all {} top-level categor(ies)", mains.len());

        let mut added = 0;
        for main in &mains {
            let targets = match self.taxonomy.targets_for_main(main) {
                Ok(targets) => targets,
                Err(e) => {
                    tracing::error!("Skipping top-level category {}: {}", main, e);
                    self.state.fail_target(main.clone(), e.to_string());
                    continue;
                }
            };

            let mut from_main = 0;
            for target in &targets {
                from_main += self.crawl_isolated(target, max_per_category).await;
            }
            tracing::info!("{}: {} new record(s)", main, from_main);
            added += from_main;
        }
        added
    }

    /// Runs one traversal mode
    ///
    /// Only a mode that cannot be resolved at all (an unknown group) is an
    /// error; category failures are recorded in the run state.
    pub async fn run_mode(&mut self, mode: &CrawlMode) -> Result<usize, HarvestError> {
        match mode {
            CrawlMode::Single {
                target,
                max_products,
            } => Ok(self.crawl_isolated(target, *max_products).await),
            CrawlMode::Subcategories {
                main,
                subcategories,
                max_per_category,
            } => Ok(self
                .crawl_subcategories(main, subcategories, *max_per_category)
                .await),
            CrawlMode::Group {
                name,
                max_per_category,
            } => {
                let group = self.taxonomy.group(name)?.clone();
                tracing::info!("Crawling group {} ({})", group.name, group.main);
                Ok(self
                    .crawl_subcategories(&group.main, &group.subcategories, *max_per_category)
                    .await)
            }
            CrawlMode::All { max_per_category } => {
                Ok(self.crawl_all_categories(*max_per_category).await)
            }
        }
    }
}

/// Runs `mode` until it completes or `interrupt` resolves
///
/// On interrupt the in-flight traversal is dropped, which releases any live
/// browser session. Records accumulated so far stay in the coordinator's
/// state for the caller to flush.
///
/// # Example
///
/// ```no_run
/// use longchau_harvest::config::builtin_config;
/// use longchau_harvest::{run_interruptible, Coordinator, CrawlMode};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = builtin_config()?;
/// let mut coordinator = Coordinator::from_config(&config)?;
/// let mode = CrawlMode::All { max_per_category: Some(5) };
/// let interrupt = async {
///     let _ = tokio::signal::ctrl_c().await;
/// };
/// run_interruptible(&mut coordinator, &mode, interrupt).await?;
/// println!("{} record(s)", coordinator.state().len());
/// # Ok(())
/// # }
/// ```
pub async fn run_interruptible<F>(
    coordinator: &mut Coordinator,
    mode: &CrawlMode,
    interrupt: F,
) -> Result<RunOutcome, HarvestError>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        result = coordinator.run_mode(mode) => {
            let added = result?;
            tracing::info!("Run completed with {} new record(s)", added);
            Ok(RunOutcome::Completed)
        }
        _ = interrupt => {
            tracing::warn!("Interrupted, stopping traversal");
            Ok(RunOutcome::Interrupted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryEntry, GroupEntry, SiteConfig};
    use crate::crawler::browser::{BrowserError, ListingExpander};
    use crate::crawler::fetcher::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BASE: &str = "https://nhathuoclongchau.com.vn/";

    /// Listing markup that never finishes loading
    const HANG: &str = "hang";

    /// Listings keyed by path; unknown paths answer 404
    struct FakeListings(HashMap<String, String>);

    #[async_trait]
    impl ListingExpander for FakeListings {
        async fn load_and_expand(&self, url: &Url) -> Result<String, BrowserError> {
            if self.0.get(url.path()).map(String::as_str) == Some(HANG) {
                return std::future::pending().await;
            }
            self.0
                .get(url.path())
                .cloned()
                .ok_or_else(|| BrowserError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    /// Detail pages keyed by path; counts every fetch
    struct FakeDetails {
        pages: HashMap<String, String>,
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DetailFetcher for FakeDetails {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(url.path())
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 500,
                    attempts: 3,
                })
        }
    }

    fn listing(paths: &[&str]) -> String {
        let links: String = paths
            .iter()
            .map(|p| format!(r#"<a href="{}">p</a>"#, p))
            .collect();
        format!(r#"<div class="grid grid-cols-2 md:grid-cols-4">{}</div>"#, links)
    }

    fn detail(name: &str) -> String {
        format!(
            r#"<html><body><h1 data-test="product_name">{}</h1>
               <span data-test="price">120.000đ</span></body></html>"#,
            name
        )
    }

    fn coordinator(
        listings: &[(&str, &[&str])],
        details: &[(&str, &str)],
    ) -> (Coordinator, Arc<AtomicUsize>) {
        let site = SiteConfig {
            base_url: BASE.to_string(),
            ..SiteConfig::default()
        };
        let listings = listings
            .iter()
            .map(|(path, links)| {
                let html = if links.first() == Some(&HANG) {
                    HANG.to_string()
                } else {
                    listing(links)
                };
                (path.to_string(), html)
            })
            .collect();
        let fetches = Arc::new(AtomicUsize::new(0));
        let details = FakeDetails {
            pages: details
                .iter()
                .map(|(path, name)| (path.to_string(), detail(name)))
                .collect(),
            fetches: Arc::clone(&fetches),
        };
        let taxonomy = Taxonomy::new(
            vec![CategoryEntry {
                main: "thuc-pham-chuc-nang".to_string(),
                subcategories: vec!["vitamin-c".to_string(), "vitamin-e".to_string()],
            }],
            vec![GroupEntry {
                name: "vitamin".to_string(),
                main: "thuc-pham-chuc-nang".to_string(),
                subcategories: vec!["vitamin-c".to_string(), "missing".to_string()],
            }],
        );

        let coordinator = Coordinator::new(
            Box::new(details),
            ListingDiscoverer::new(Box::new(FakeListings(listings)), &site).unwrap(),
            ProductExtractor::new(&site).unwrap(),
            Pacer::disabled(),
            taxonomy,
        );
        (coordinator, fetches)
    }

    fn target(path: &str) -> CategoryTarget {
        CategoryTarget::parse(path).unwrap()
    }

    #[tokio::test]
    async fn test_crawl_category_truncates_and_skips_failures() {
        let (mut coord, _) = coordinator(
            &[(
                "/thuc-pham-chuc-nang/vitamin-c",
                &[
                    "/thuc-pham-chuc-nang/a.html",
                    "/thuc-pham-chuc-nang/broken.html",
                    "/thuc-pham-chuc-nang/b.html",
                    "/thuc-pham-chuc-nang/c.html",
                ],
            )],
            &[
                ("/thuc-pham-chuc-nang/a.html", "A"),
                ("/thuc-pham-chuc-nang/b.html", "B"),
                ("/thuc-pham-chuc-nang/c.html", "C"),
            ],
        );

        let added = coord
            .crawl_category(&target("thuc-pham-chuc-nang/vitamin-c"), Some(3))
            .await
            .unwrap();

        assert_eq!(added, 2);
        let names: Vec<&str> = coord.state().records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(coord.state().skipped().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_an_error() {
        let (mut coord, fetches) = coordinator(&[("/thuc-pham-chuc-nang/vitamin-c", &[])], &[]);
        let added = coord
            .crawl_category(&target("thuc-pham-chuc-nang/vitamin-c"), None)
            .await
            .unwrap();
        assert_eq!(added, 0);
        assert!(coord.state().is_empty());
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_subcategory_is_isolated() {
        let (mut coord, _) = coordinator(
            &[("/thuc-pham-chuc-nang/vitamin-e", &["/thuc-pham-chuc-nang/e.html"])],
            &[("/thuc-pham-chuc-nang/e.html", "E")],
        );

        let added = coord
            .crawl_subcategories(
                "thuc-pham-chuc-nang",
                &["vitamin-c".to_string(), "bad slug".to_string(), "vitamin-e".to_string()],
                None,
            )
            .await;

        assert_eq!(added, 1);
        assert_eq!(coord.state().failed_targets().len(), 2);
        assert_eq!(coord.state().records()[0].name, "E");
    }

    #[tokio::test]
    async fn test_products_shared_by_categories_fetched_once() {
        let shared = "/thuc-pham-chuc-nang/shared.html";
        let (mut coord, fetches) = coordinator(
            &[
                ("/thuc-pham-chuc-nang/vitamin-c", &[shared]),
                ("/thuc-pham-chuc-nang/vitamin-e", &[shared]),
            ],
            &[(shared, "Shared")],
        );

        let added = coord.crawl_all_categories(None).await;
        assert_eq!(added, 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(coord.state().visited().len(), 2);
    }

    #[tokio::test]
    async fn test_run_mode_unknown_group() {
        let (mut coord, _) = coordinator(&[], &[]);
        let result = coord
            .run_mode(&CrawlMode::Group {
                name: "nope".to_string(),
                max_per_category: None,
            })
            .await;
        assert!(matches!(result, Err(HarvestError::Target(_))));
    }

    #[tokio::test]
    async fn test_reset_allows_reuse() {
        let (mut coord, fetches) = coordinator(
            &[("/thuc-pham-chuc-nang/vitamin-c", &["/thuc-pham-chuc-nang/a.html"])],
            &[("/thuc-pham-chuc-nang/a.html", "A")],
        );
        let mode = CrawlMode::Single {
            target: target("thuc-pham-chuc-nang/vitamin-c"),
            max_products: None,
        };

        coord.run_mode(&mode).await.unwrap();
        coord.reset();
        assert!(coord.state().is_empty());

        coord.run_mode(&mode).await.unwrap();
        assert_eq!(coord.state().len(), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_interrupt_keeps_accumulated_records() {
        let (mut coord, _) = coordinator(
            &[
                ("/thuc-pham-chuc-nang/vitamin-c", &["/thuc-pham-chuc-nang/a.html"]),
                ("/thuc-pham-chuc-nang/vitamin-e", &[HANG]),
            ],
            &[("/thuc-pham-chuc-nang/a.html", "A")],
        );

        let outcome = run_interruptible(
            &mut coord,
            &CrawlMode::All {
                max_per_category: None,
            },
            tokio::time::sleep(std::time::Duration::from_millis(50)),
        )
        .await
        .unwrap();

        assert_eq!(outcome, RunOutcome::Interrupted);
        assert_eq!(coord.state().len(), 1);
        assert_eq!(coord.state().records()[0].name, "A");
    }
}
