//! Category targets
//!
//! A target is a path-like identifier such as `thuc-pham-chuc-nang/vitamin-c`
//! that resolves to a listing URL under the catalog root.

use crate::config::validate_slug;
use crate::TargetError;
use std::fmt;
use url::Url;

/// A taxonomy node to crawl, identified by its slug path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryTarget {
    segments: Vec<String>,
}

impl CategoryTarget {
    /// Parses a `main/sub[/...]` path; leading and trailing slashes are ignored
    ///
    /// # Examples
    ///
    /// ```
    /// use longchau_harvest::CategoryTarget;
    ///
    /// let target = CategoryTarget::parse("/thuc-pham-chuc-nang/canxi-vitamin-D").unwrap();
    /// assert_eq!(target.main(), "thuc-pham-chuc-nang");
    /// assert_eq!(target.path_prefix(), "/thuc-pham-chuc-nang/");
    /// ```
    pub fn parse(path: &str) -> Result<Self, TargetError> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(TargetError::Malformed(path.to_string()));
        }

        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        for segment in &segments {
            validate_slug(segment).map_err(|_| TargetError::Malformed(path.to_string()))?;
        }

        Ok(Self { segments })
    }

    /// Builds the target `parent/sub`
    pub fn child(parent: &str, sub: &str) -> Result<Self, TargetError> {
        Self::parse(&format!("{}/{}", parent.trim_matches('/'), sub.trim_matches('/')))
    }

    /// Top-level category slug
    pub fn main(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Slash-separated path without leading slash
    pub fn display_path(&self) -> String {
        self.segments.join("/")
    }

    /// Path prefix every product link of this category must start with
    ///
    /// Detail pages live directly beneath the top-level category, so the prefix
    /// is derived from the main slug rather than the full path.
    pub fn path_prefix(&self) -> String {
        format!("/{}/", self.main())
    }

    /// [`path_prefix`](Self::path_prefix) resolved beneath the path of `base`
    pub fn scoped_prefix(&self, base: &Url) -> Result<String, url::ParseError> {
        let main = Self {
            segments: vec![self.main().to_string()],
        };
        let url = main.listing_url(base)?;
        Ok(format!("{}/", url.path().trim_end_matches('/')))
    }

    /// Resolves the listing page URL against the catalog root
    pub fn listing_url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut root = base.clone();
        root.set_query(None);
        root.set_fragment(None);
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        root.join(&self.display_path())
    }
}

impl fmt::Display for CategoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_path())
    }
}
