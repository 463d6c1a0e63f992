//! URL handling module for Longchau-Harvest
//!
//! This module provides link resolution against a page URL and the rule that
//! decides whether a link points at a product detail page of a category.

mod matcher;
mod resolve;

// Re-export main functions
pub use matcher::ProductLinkRule;
pub use resolve::{absolutize, resolve_link};
