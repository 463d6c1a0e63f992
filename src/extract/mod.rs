//! Product detail page extraction
//!
//! This module turns one detail page into a [`ProductRecord`]:
//! - Text fields through per-field strategy chains ([`strategy`], [`fields`])
//! - Prices and counts through digit parsing ([`price`])
//! - The star rating through marker-anchored patterns ([`rating`])
//! - Images through tiered collection and classification ([`images`])
//! - The article block through an allow-list sanitizer ([`rich_content`])
//!
//! A missing field never fails extraction; only a document with no content at
//! all does.

pub mod embedded;
pub mod fields;
pub mod images;
mod price;
pub mod rating;
mod record;
pub mod rich_content;
pub mod strategy;
pub mod table;
pub mod text;

pub use price::{parse_count, parse_price};
pub use record::ProductRecord;

use crate::config::SiteConfig;
use crate::ConfigError;
use chrono::Utc;
use fields::FieldChains;
use images::ImageClassifier;
use rating::{CountLocator, RatingLocator};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use table::LabeledRows;
use thiserror::Error;
use url::Url;

/// Errors for documents that cannot be read at all
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document has no elements or text")]
    NoContent,
}

/// A parsed page with its embedded JSON and specification rows, shared by
/// every strategy of one extraction
pub struct PageContext<'a> {
    pub document: &'a Html,
    pub page_url: &'a Url,
    pub json: Vec<Value>,
    pub rows: LabeledRows,
}

impl<'a> PageContext<'a> {
    pub fn new(document: &'a Html, page_url: &'a Url) -> Self {
        Self {
            document,
            page_url,
            json: embedded::collect_json_blocks(document),
            rows: LabeledRows::from_document(document),
        }
    }
}

/// Extracts product records from detail pages
pub struct ProductExtractor {
    chains: FieldChains,
    rating: RatingLocator,
    reviews: CountLocator,
    comments: CountLocator,
    images: ImageClassifier,
    rich_content: Selector,
}

impl ProductExtractor {
    /// Builds an extractor for the site's markers and selectors
    pub fn new(site: &SiteConfig) -> Result<Self, ConfigError> {
        let rich_content = Selector::parse(&site.rich_content_selector)
            .map_err(|e| invalid("site.rich-content-selector", format!("{:?}", e)))?;

        Ok(Self {
            chains: FieldChains::standard(),
            rating: RatingLocator::new(&site.rating_marker)
                .map_err(|e| invalid("site.rating-marker", e))?,
            reviews: CountLocator::new(&site.reviews_marker)
                .map_err(|e| invalid("site.reviews-marker", e))?,
            comments: CountLocator::new(&site.comments_marker)
                .map_err(|e| invalid("site.comments-marker", e))?,
            images: ImageClassifier::from_site(site).map_err(|e| invalid("site.image-cdn-hosts", e))?,
            rich_content,
        })
    }

    /// Extracts a record from the markup of `url`
    pub fn extract(&self, html: &str, url: &Url) -> Result<ProductRecord, ParseError> {
        if html.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        let document = Html::parse_document(html);
        if !has_content(&document) {
            return Err(ParseError::NoContent);
        }

        let ctx = PageContext::new(&document, url);
        let page_text = text::visible_text(&document);
        let chains = &self.chains;

        let mut record = ProductRecord::empty(url.as_str());
        record.name = chains.name.run(&ctx);
        record.price = parse_price(&chains.price.run(&ctx));
        record.original_price = parse_price(&chains.original_price.run(&ctx));
        record.discount = chains.discount.run(&ctx);
        record.unit = chains.unit.run(&ctx);
        record.sku = chains.sku.run(&ctx);
        record.rating = self.rating.locate(&document).clamp(0.0, rating::MAX_RATING);
        record.reviews_count = count(&chains.reviews_count.run(&ctx), &self.reviews, &page_text);
        record.comments_count = count(&chains.comments_count.run(&ctx), &self.comments, &page_text);
        record.brand = chains.brand.run(&ctx);
        record.official_name = chains.official_name.run(&ctx);
        record.category_path = chains.category_path.run(&ctx);
        record.registration_number = chains.registration_number.run(&ctx);
        record.form = chains.form.run(&ctx);
        record.package_size = chains.package_size.run(&ctx);
        record.origin_brand = chains.origin_brand.run(&ctx);
        record.manufacturer = chains.manufacturer.run(&ctx);
        record.country_of_manufacture = chains.country_of_manufacture.run(&ctx);
        record.ingredients = chains.ingredients.run(&ctx);
        record.usage_instructions = chains.usage_instructions.run(&ctx);
        record.availability = availability_label(&chains.availability.run(&ctx));
        record.description = chains.description.run(&ctx);
        record.rich_content = rich_content::sanitize_block(&document, &self.rich_content);
        record.images = images::collect_images(&document, url, &self.images);
        record.crawled_at = Utc::now();

        tracing::debug!(
            "Extracted '{}' from {} ({} image(s), {} spec row(s))",
            record.name,
            url,
            record.images.len(),
            ctx.rows.len()
        );

        Ok(record)
    }
}

fn invalid(what: &str, e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Validation(format!("{}: {}", what, e))
}

/// Count from a dedicated marker, else from the first phrase in the page text
fn count(marker_value: &str, locator: &CountLocator, page_text: &str) -> u64 {
    if !marker_value.is_empty() {
        return parse_count(marker_value);
    }
    locator.find(page_text).unwrap_or(0)
}

/// Shortens schema.org availability URLs to their last segment
fn availability_label(value: &str) -> String {
    match value.strip_prefix("https://schema.org/").or_else(|| value.strip_prefix("http://schema.org/")) {
        Some(label) => label.to_string(),
        None => value.to_string(),
    }
}

fn has_content(document: &Html) -> bool {
    let has_elements = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|e| !matches!(e.value().name(), "html" | "head" | "body"));
    has_elements || !text::visible_text(document).is_empty()
}
