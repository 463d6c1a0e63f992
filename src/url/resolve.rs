use url::Url;

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// The fragment of the resolved URL is dropped.
///
/// # Examples
///
/// ```
/// use longchau_harvest::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://nhathuoclongchau.com.vn/thuoc").unwrap();
/// let url = resolve_link("/thuoc/panadol.html#top", &base).unwrap();
/// assert_eq!(url.as_str(), "https://nhathuoclongchau.com.vn/thuoc/panadol.html");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute)
}

/// Like [`resolve_link`] but yields the URL as a string
pub fn absolutize(href: &str, base_url: &Url) -> Option<String> {
    resolve_link(href, base_url).map(String::from)
}
