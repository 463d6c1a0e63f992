use crate::config::types::{
    BrowserConfig, CategoryEntry, Config, DelayConfig, GroupEntry, HttpConfig, OutputConfig,
    SiteConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_http_config(&config.http)?;
    validate_browser_config(&config.browser)?;
    validate_delay_config(&config.delay)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    validate_groups(&config.groups, &config.categories)?;
    Ok(())
}

/// Validates the site profile
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.detail_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "detail-suffix cannot be empty".to_string(),
        ));
    }

    regex::Regex::new(&config.load_more_pattern).map_err(|e| {
        ConfigError::Validation(format!("load-more-pattern is not a valid regex: {}", e))
    })?;

    if config.rating_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "rating-marker cannot be empty".to_string(),
        ));
    }

    scraper::Selector::parse(&config.rich_content_selector).map_err(|e| {
        ConfigError::Validation(format!("rich-content-selector is invalid: {:?}", e))
    })?;

    Ok(())
}

/// Validates HTTP fetcher settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than zero".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates headless browser settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-empty, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    if config.max_load_more_clicks < 1 || config.max_load_more_clicks > 100 {
        return Err(ConfigError::Validation(format!(
            "max-load-more-clicks must be between 1 and 100, got {}",
            config.max_load_more_clicks
        )));
    }

    Ok(())
}

/// Validates the politeness delay bounds
fn validate_delay_config(config: &DelayConfig) -> Result<(), ConfigError> {
    if config.min_ms > config.max_ms {
        return Err(ConfigError::Validation(format!(
            "delay min-ms ({}) must not exceed max-ms ({})",
            config.min_ms, config.max_ms
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.file_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "file-prefix cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the static taxonomy
fn validate_categories(categories: &[CategoryEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in categories {
        validate_slug(&entry.main)?;

        if !seen.insert(entry.main.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Category '{}' is declared more than once",
                entry.main
            )));
        }

        for sub in &entry.subcategories {
            validate_slug(sub)?;
        }
    }

    Ok(())
}

/// Validates predefined groups against the taxonomy
fn validate_groups(groups: &[GroupEntry], categories: &[CategoryEntry]) -> Result<(), ConfigError> {
    let mains: HashSet<&str> = categories.iter().map(|c| c.main.as_str()).collect();
    let mut names = HashSet::new();

    for group in groups {
        if group.name.is_empty() {
            return Err(ConfigError::Validation(
                "Group name cannot be empty".to_string(),
            ));
        }

        if !names.insert(group.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Group '{}' is declared more than once",
                group.name
            )));
        }

        for segment in group.main.split('/') {
            validate_slug(segment)?;
        }

        let root = group.main.split('/').next().unwrap_or_default();
        if !mains.contains(root) {
            return Err(ConfigError::Validation(format!(
                "Group '{}' refers to unknown category '{}'",
                group.name, root
            )));
        }

        if group.subcategories.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Group '{}' must list at least one subcategory",
                group.name
            )));
        }

        for sub in &group.subcategories {
            validate_slug(sub)?;
        }
    }

    Ok(())
}

/// Validates a single path segment of the taxonomy
pub(crate) fn validate_slug(slug: &str) -> Result<(), ConfigError> {
    if slug.is_empty() {
        return Err(ConfigError::InvalidSlug(
            "Category slug cannot be empty".to_string(),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::InvalidSlug(format!(
            "Slug '{}' contains invalid characters",
            slug
        )));
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(ConfigError::InvalidSlug(format!(
            "Slug '{}' cannot start or end with '-'",
            slug
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(main: &str, subs: &[&str]) -> CategoryEntry {
        CategoryEntry {
            main: main.to_string(),
            subcategories: subs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("thuc-pham-chuc-nang").is_ok());
        assert!(validate_slug("canxi-vitamin-D").is_ok());
        assert!(validate_slug("sub_cat").is_ok());

        assert!(validate_slug("").is_err());
        assert!(validate_slug("has space").is_err());
        assert!(validate_slug("a/b").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let categories = vec![category("thuoc", &[]), category("thuoc", &["x"])];
        assert!(validate_categories(&categories).is_err());
    }

    #[test]
    fn test_group_must_reference_known_category() {
        let categories = vec![category("thuoc", &["thuoc-di-ung"])];
        let ok = vec![GroupEntry {
            name: "di-ung".to_string(),
            main: "thuoc/thuoc-di-ung".to_string(),
            subcategories: vec!["thuoc-chong-di-ung".to_string()],
        }];
        assert!(validate_groups(&ok, &categories).is_ok());

        let unknown = vec![GroupEntry {
            name: "ghost".to_string(),
            main: "khong-ton-tai".to_string(),
            subcategories: vec!["x".to_string()],
        }];
        assert!(validate_groups(&unknown, &categories).is_err());
    }

    #[test]
    fn test_browser_click_cap_bounds() {
        let mut browser = BrowserConfig::default();
        assert!(validate_browser_config(&browser).is_ok());

        browser.max_load_more_clicks = 0;
        assert!(validate_browser_config(&browser).is_err());

        browser.max_load_more_clicks = 101;
        assert!(validate_browser_config(&browser).is_err());
    }

    #[test]
    fn test_base_url_scheme() {
        let mut site = SiteConfig::default();
        assert!(validate_site_config(&site).is_ok());

        site.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            validate_site_config(&site),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
