use url::Url;

/// Query keys that mark listing navigation rather than a product page
const NAVIGATION_PARAMS: &[&str] = &["page", "sort", "order", "limit", "offset", "filter"];

/// Rule deciding whether a resolved link looks like a product detail page
/// of one category
#[derive(Debug, Clone)]
pub struct ProductLinkRule {
    /// Host the link must share with the catalog
    pub host: String,

    /// Path prefix the link must stay within (e.g., "/thuoc/")
    pub prefix: String,

    /// Path of the listing page itself, never a product
    pub listing_path: String,

    /// Suffix carried by detail pages (e.g., ".html")
    pub suffix: String,
}

impl ProductLinkRule {
    /// Returns true if `url` passes every detail-page criterion:
    /// same host, inside the prefix, at least three path parts (counting the
    /// leading empty one, so `/main/product.html` qualifies), detail suffix,
    /// no query string and not the listing page itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use longchau_harvest::url::ProductLinkRule;
    /// use url::Url;
    ///
    /// let rule = ProductLinkRule {
    ///     host: "nhathuoclongchau.com.vn".to_string(),
    ///     prefix: "/thuoc/".to_string(),
    ///     listing_path: "/thuoc/thuoc-di-ung".to_string(),
    ///     suffix: ".html".to_string(),
    /// };
    /// let url = Url::parse("https://nhathuoclongchau.com.vn/thuoc/telfast-180mg.html").unwrap();
    /// assert!(rule.matches(&url));
    /// ```
    pub fn matches(&self, url: &Url) -> bool {
        if url.host_str() != Some(self.host.as_str()) {
            return false;
        }

        if url.query().is_some() || has_navigation_marker(url) {
            return false;
        }

        let path = url.path();
        if !path.starts_with(&self.prefix) {
            return false;
        }

        if path.trim_end_matches('/') == self.listing_path.trim_end_matches('/') {
            return false;
        }

        if path.split('/').count() < 3 {
            return false;
        }

        path.ends_with(&self.suffix)
    }
}

/// Detects pagination/sort markers smuggled into the path (e.g. `/page/2`)
fn has_navigation_marker(url: &Url) -> bool {
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
    segments
        .windows(2)
        .any(|w| NAVIGATION_PARAMS.contains(&w[0]) && w[1].chars().all(|c| c.is_ascii_digit()))
}
