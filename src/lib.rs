//! Longchau-Harvest: a product catalog harvester
//!
//! This crate walks category listing pages of an e-commerce pharmacy catalog,
//! expands each listing with a headless browser, discovers product detail
//! pages and turns every detail page into a structured [`ProductRecord`].

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Longchau-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Browser error: {0}")]
    Browser(#[from] crawler::BrowserError),

    #[error("Parse error for {url}: {source}")]
    Parse {
        url: String,
        source: extract::ParseError,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid category slug: {0}")]
    InvalidSlug(String),
}

/// Errors raised while resolving category targets
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("Malformed category path: '{0}'")]
    Malformed(String),

    #[error("Unknown category group: '{0}'")]
    UnknownGroup(String),

    #[error("Unknown main category: '{0}'")]
    UnknownCategory(String),
}

/// Result type alias for Longchau-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{CategoryTarget, CrawlMode, Taxonomy};
pub use config::Config;
pub use crawler::{run_interruptible, Coordinator, RunOutcome};
pub use extract::{ProductExtractor, ProductRecord};
pub use state::RunState;
