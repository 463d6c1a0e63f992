//! Configuration module for Longchau-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to the defaults for the
//! Long Châu catalog. The built-in configuration also carries the category
//! taxonomy.
//!
//! # Example
//!
//! ```no_run
//! use longchau_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config/default.toml")).unwrap();
//! println!("Listing expansion capped at {} clicks", config.browser.max_load_more_clicks);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, CategoryEntry, Config, DelayConfig, GroupEntry, HttpConfig, OutputConfig,
    SiteConfig,
};

// Re-export parser functions
pub use parser::{builtin_config, compute_config_hash, load_config, load_config_with_hash, parse_config};

pub(crate) use validation::validate_slug;
