use serde::Deserialize;

/// Main configuration structure for Longchau-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub delay: DelayConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Static taxonomy: top-level categories and their subcategory slugs
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryEntry>,
    /// Predefined groups of subcategories
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupEntry>,
}

/// Target site profile
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root URL of the catalog
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path suffix carried by every product detail page
    #[serde(rename = "detail-suffix")]
    pub detail_suffix: String,

    /// Regex source matched against the text of the "load more" control
    #[serde(rename = "load-more-pattern")]
    pub load_more_pattern: String,

    /// Literal word that sits next to the rating value
    #[serde(rename = "rating-marker")]
    pub rating_marker: String,

    /// Word following the number of reviews
    #[serde(rename = "reviews-marker")]
    pub reviews_marker: String,

    /// Word following the number of comments
    #[serde(rename = "comments-marker")]
    pub comments_marker: String,

    /// CSS selector of the rich description container
    #[serde(rename = "rich-content-selector")]
    pub rich_content_selector: String,

    /// Hosts that serve genuine product imagery
    #[serde(rename = "image-cdn-hosts")]
    pub image_cdn_hosts: Vec<String>,

    /// Path fragments that mark non-product imagery (logos, badges, icons)
    #[serde(rename = "image-reject-fragments")]
    pub image_reject_fragments: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nhathuoclongchau.com.vn".to_string(),
            detail_suffix: ".html".to_string(),
            load_more_pattern: r"xem\s+thêm\s*\d*\s*sản\s+phẩm".to_string(),
            rating_marker: "đánh giá".to_string(),
            reviews_marker: "đánh giá".to_string(),
            comments_marker: "bình luận".to_string(),
            rich_content_selector: "div.content-detail".to_string(),
            image_cdn_hosts: vec![
                "cdn.nhathuoclongchau.com.vn".to_string(),
                "cms-prod.s3-sgn09.fptcloud.com".to_string(),
            ],
            image_reject_fragments: vec![
                "logo".to_string(),
                "icon".to_string(),
                "favicon".to_string(),
                "payment".to_string(),
                "badge".to_string(),
                "banner".to_string(),
                "avatar".to_string(),
                "sprite".to_string(),
                "placeholder".to_string(),
                "bocongthuong".to_string(),
                "dmca".to_string(),
            ],
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub accept: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Total attempts per URL, including the first one
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before the second attempt; doubles for each further attempt
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "vi-VN,vi;q=0.8,en-US;q=0.5,en;q=0.3".to_string(),
            timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,

    #[serde(rename = "viewport-width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height")]
    pub viewport_height: u32,

    /// Upper bound on the initial wait for `document.readyState == "complete"`
    #[serde(rename = "dom-ready-timeout-ms")]
    pub dom_ready_timeout_ms: u64,

    /// How long to look for the "load more" control before concluding it is gone
    #[serde(rename = "load-more-timeout-ms")]
    pub load_more_timeout_ms: u64,

    /// Pause after each click so new products can attach
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Hard cap on expansion iterations
    #[serde(rename = "max-load-more-clicks")]
    pub max_load_more_clicks: u32,

    /// Explicit Chrome/Chromium binary; auto-detected when absent
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            dom_ready_timeout_ms: 10_000,
            load_more_timeout_ms: 3_000,
            settle_delay_ms: 2_000,
            max_load_more_clicks: 20,
            chrome_executable: None,
        }
    }
}

/// Random politeness delay bounds (milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    #[serde(rename = "min-ms")]
    pub min_ms: u64,

    #[serde(rename = "max-ms")]
    pub max_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            min_ms: 500,
            max_ms: 2_000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the record files
    pub directory: String,

    /// Leading part of every output file name
    #[serde(rename = "file-prefix")]
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "data".to_string(),
            file_prefix: "longchau_products".to_string(),
        }
    }
}

/// Top-level category with its subcategory slugs
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Top-level category slug (e.g., "thuc-pham-chuc-nang")
    pub main: String,

    #[serde(default)]
    pub subcategories: Vec<String>,
}

/// Named group of subcategories crawled together
#[derive(Debug, Clone, Deserialize)]
pub struct GroupEntry {
    pub name: String,

    /// Parent path of the group (e.g., "thuc-pham-chuc-nang" or "thuoc/thuoc-di-ung")
    pub main: String,

    pub subcategories: Vec<String>,
}
