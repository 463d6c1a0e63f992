//! Listing discovery
//!
//! Expands a category listing through the browser, isolates the product grid
//! and returns the product detail URLs it links to.

use crate::catalog::CategoryTarget;
use crate::config::SiteConfig;
use crate::crawler::browser::ListingExpander;
use crate::url::{resolve_link, ProductLinkRule};
use crate::{ConfigError, HarvestError};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Responsive breakpoints of the grid utility classes
const BREAKPOINTS: &[&str] = &["sm", "md", "lg", "xl", "2xl"];

/// Returns true if the element carries the product grid signature: a `grid`
/// class, a base column count and a breakpoint-specific column count
fn is_product_grid(element: &ElementRef<'_>) -> bool {
    let mut grid = false;
    let mut columns = false;
    let mut responsive = false;

    for class in element.value().classes() {
        if class == "grid" {
            grid = true;
        } else if class.starts_with("grid-cols-") {
            columns = true;
        } else if let Some((prefix, rest)) = class.split_once(':') {
            if BREAKPOINTS.contains(&prefix) && rest.starts_with("grid-cols-") {
                responsive = true;
            }
        }
    }

    grid && columns && responsive
}

/// Qualifying product links beneath `scope`, in document order, de-duplicated
fn links_in(scope: ElementRef<'_>, anchors: &Selector, page_url: &Url, rule: &ProductLinkRule) -> Vec<Url> {
    let mut seen = HashSet::new();
    scope
        .select(anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .filter(|url| rule.matches(url))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Extracts product detail URLs from an expanded listing page
///
/// The grid with the most qualifying links wins (the first one on a tie). If
/// the page has no element with the grid signature the whole document is
/// scanned instead.
pub fn extract_product_links(html: &str, page_url: &Url, rule: &ProductLinkRule) -> Vec<Url> {
    let document = Html::parse_document(html);
    let (Ok(all), Ok(anchors)) = (Selector::parse("*"), Selector::parse("a[href]")) else {
        return Vec::new();
    };

    let mut best: Option<Vec<Url>> = None;
    let mut grids = 0;
    for element in document.select(&all).filter(is_product_grid) {
        grids += 1;
        let links = links_in(element, &anchors, page_url, rule);
        if best.as_ref().map_or(true, |b| links.len() > b.len()) {
            best = Some(links);
        }
    }

    match best {
        Some(links) => {
            tracing::debug!("{} grid candidate(s), best has {} link(s)", grids, links.len());
            links
        }
        None => {
            tracing::debug!("No product grid on {}, scanning the whole document", page_url);
            links_in(document.root_element(), &anchors, page_url, rule)
        }
    }
}

/// Discovers product URLs of category listings
pub struct ListingDiscoverer {
    expander: Box<dyn ListingExpander>,
    base_url: Url,
    detail_suffix: String,
}

impl ListingDiscoverer {
    pub fn new(expander: Box<dyn ListingExpander>, site: &SiteConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&site.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", site.base_url, e)))?;
        Ok(Self {
            expander,
            base_url,
            detail_suffix: site.detail_suffix.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Link rule for products of `target`
    pub fn rule_for(&self, target: &CategoryTarget) -> Result<ProductLinkRule, HarvestError> {
        let listing = target.listing_url(&self.base_url)?;
        Ok(ProductLinkRule {
            host: self.base_url.host_str().unwrap_or_default().to_string(),
            prefix: target.scoped_prefix(&self.base_url)?,
            listing_path: listing.path().to_string(),
            suffix: self.detail_suffix.clone(),
        })
    }

    /// Expands the listing of `target` and returns its product URLs
    pub async fn discover(&self, target: &CategoryTarget) -> Result<Vec<Url>, HarvestError> {
        let listing = target.listing_url(&self.base_url)?;
        let rule = self.rule_for(target)?;

        tracing::info!("Discovering products of {} at {}", target, listing);
        let html = self.expander.load_and_expand(&listing).await?;
        let links = extract_product_links(&html, &listing, &rule);

        tracing::info!("Found {} product(s) in {}", links.len(), target);
        Ok(links)
    }
}
