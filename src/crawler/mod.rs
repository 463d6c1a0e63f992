//! Crawler module for listing expansion and detail page harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of detail pages with retry logic
//! - Scripted browser sessions that expand "load more" listings
//! - Product link discovery on expanded listings
//! - Politeness pacing between requests
//! - Overall crawl coordination

mod browser;
mod coordinator;
mod delay;
mod discovery;
mod fetcher;

pub use browser::{
    await_ready, expand_page, BrowserError, BrowserSession, ChromeExpander, ChromePage, ExpandablePage,
    ExpansionReport, ExpansionSettings, ListingExpander, StopReason,
};
pub use coordinator::{run_interruptible, Coordinator, RunOutcome};
pub use delay::Pacer;
pub use discovery::{extract_product_links, ListingDiscoverer};
pub use fetcher::{backoff_delay, build_http_client, DetailFetcher, FetchError, HttpFetcher};
