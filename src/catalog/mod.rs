//! Catalog structure: category targets, the taxonomy and traversal modes

mod target;
mod taxonomy;

pub use target::CategoryTarget;
pub use taxonomy::Taxonomy;

/// Traversal requested by the caller
///
/// The orchestrator receives these as plain parameters and knows nothing about
/// how they were obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlMode {
    /// One category path
    Single {
        target: CategoryTarget,
        max_products: Option<usize>,
    },

    /// Explicit subcategories of one parent path
    Subcategories {
        main: String,
        subcategories: Vec<String>,
        max_per_category: Option<usize>,
    },

    /// A predefined group from the taxonomy
    Group {
        name: String,
        max_per_category: Option<usize>,
    },

    /// Every top-level category of the taxonomy
    All { max_per_category: Option<usize> },
}
