use crate::catalog::CategoryTarget;
use crate::extract::ProductRecord;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use url::Url;

/// A detail URL that produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: String,
}

/// A category whose traversal failed as a whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTarget {
    pub target: String,
    pub reason: String,
}

/// Everything accumulated by one logical run
///
/// Owned by the coordinator and mutated only from its sequential loop.
#[derive(Debug, Clone)]
pub struct RunState {
    records: Vec<ProductRecord>,
    seen: HashSet<String>,
    visited: Vec<CategoryTarget>,
    skipped: Vec<SkippedUrl>,
    failed_targets: Vec<FailedTarget>,
    started_at: DateTime<Utc>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            seen: HashSet::new(),
            visited: Vec::new(),
            skipped: Vec::new(),
            failed_targets: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Adds a record; refuses records whose url is empty, relative or
    /// already accumulated in this run
    pub fn push(&mut self, record: ProductRecord) -> bool {
        if Url::parse(&record.url).is_err() {
            tracing::warn!("Refusing record with non-absolute url '{}'", record.url);
            return false;
        }
        if !self.seen.insert(record.url.clone()) {
            tracing::debug!("Record for {} already accumulated", record.url);
            return false;
        }
        self.records.push(record);
        true
    }

    /// Returns true if a record for `url` was already accumulated
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Notes that traversal of `target` started
    pub fn visit(&mut self, target: &CategoryTarget) {
        if !self.visited.contains(target) {
            self.visited.push(target.clone());
        }
    }

    pub fn skip_url(&mut self, url: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedUrl {
            url: url.into(),
            reason: reason.into(),
        });
    }

    pub fn fail_target(&mut self, target: impl Into<String>, reason: impl Into<String>) {
        self.failed_targets.push(FailedTarget {
            target: target.into(),
            reason: reason.into(),
        });
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn visited(&self) -> &[CategoryTarget] {
        &self.visited
    }

    pub fn skipped(&self) -> &[SkippedUrl] {
        &self.skipped
    }

    pub fn failed_targets(&self) -> &[FailedTarget] {
        &self.failed_targets
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clears everything for a new run
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// File name stem derived from the visited categories
    ///
    /// One category gives its path with '/' replaced by '_'; several under
    /// one main give `{main}_{n}cats`; otherwise `multi_{n}cats`.
    pub fn output_stem(&self) -> Option<String> {
        match self.visited.as_slice() {
            [] => None,
            [only] => Some(only.display_path().replace('/', "_")),
            [first, rest @ ..] => {
                let n = self.visited.len();
                if rest.iter().all(|t| t.main() == first.main()) {
                    Some(format!("{}_{}cats", first.main(), n))
                } else {
                    Some(format!("multi_{}cats", n))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(path: &str) -> CategoryTarget {
        CategoryTarget::parse(path).unwrap()
    }

    #[test]
    fn test_push_refuses_bad_and_duplicate_urls() {
        let mut state = RunState::new();
        assert!(state.push(ProductRecord::empty("https://nhathuoclongchau.com.vn/thuoc/a.html")));
        assert!(!state.push(ProductRecord::empty("https://nhathuoclongchau.com.vn/thuoc/a.html")));
        assert!(!state.push(ProductRecord::empty("")));
        assert!(!state.push(ProductRecord::empty("/thuoc/b.html")));
        assert_eq!(state.len(), 1);
        assert!(state.contains("https://nhathuoclongchau.com.vn/thuoc/a.html"));
    }

    #[test]
    fn test_output_stem() {
        let mut state = RunState::new();
        assert_eq!(state.output_stem(), None);

        state.visit(&target("thuc-pham-chuc-nang/vitamin-c"));
        assert_eq!(state.output_stem().as_deref(), Some("thuc-pham-chuc-nang_vitamin-c"));

        state.visit(&target("thuc-pham-chuc-nang/vitamin-e"));
        state.visit(&target("thuc-pham-chuc-nang/vitamin-e"));
        assert_eq!(state.output_stem().as_deref(), Some("thuc-pham-chuc-nang_2cats"));

        state.visit(&target("thuoc"));
        assert_eq!(state.output_stem().as_deref(), Some("multi_3cats"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = RunState::new();
        state.push(ProductRecord::empty("https://nhathuoclongchau.com.vn/thuoc/a.html"));
        state.visit(&target("thuoc"));
        state.skip_url("https://nhathuoclongchau.com.vn/thuoc/b.html", "HTTP 500");
        state.fail_target("thuoc/x", "HTTP 404");

        state.reset();
        assert!(state.is_empty());
        assert!(state.visited().is_empty());
        assert!(state.skipped().is_empty());
        assert!(state.failed_targets().is_empty());
        assert!(!state.contains("https://nhathuoclongchau.com.vn/thuoc/a.html"));
    }
}
