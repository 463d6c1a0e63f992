//! Scripted browser session
//!
//! Listing pages only reveal their full product grid after the "load more"
//! control has been clicked repeatedly. This module drives a headless Chrome
//! through that loop:
//! - [`BrowserSession`] owns the Chrome process and releases it on every exit path
//! - [`ExpandablePage`] is the seam between the loop and the live page
//! - [`expand_page`] runs the bounded click loop
//! - [`ChromeExpander`] ties them together behind [`ListingExpander`]

use crate::config::{BrowserConfig, HttpConfig};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

/// Attribute used to tag the control located by the last reveal
const LOAD_MORE_ATTR: &str = "data-harvest-load-more";

/// Interval between polls while waiting on the page
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Errors raised by the browser session
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("{url} answered HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("load-more interaction failed: {0}")]
    Interaction(String),

    #[error("failed to read page content: {0}")]
    Content(String),
}

/// Produces the fully expanded markup of a listing page
#[async_trait]
pub trait ListingExpander: Send + Sync {
    async fn load_and_expand(&self, url: &Url) -> Result<String, BrowserError>;
}

/// Operations the expansion loop needs from a loaded page
#[async_trait]
pub trait ExpandablePage: Send {
    /// Waits for DOM readiness; Ok(false) if `timeout` elapsed first
    async fn wait_until_ready(&mut self, timeout: Duration) -> Result<bool, BrowserError>;

    /// Locates a visible "load more" control and scrolls it into view;
    /// Ok(false) if none appeared within `timeout`
    async fn reveal_load_more(&mut self, timeout: Duration) -> Result<bool, BrowserError>;

    /// Clicks the control located by the last successful reveal
    async fn click_load_more(&mut self) -> Result<(), BrowserError>;

    /// Current markup of the page
    async fn html(&mut self) -> Result<String, BrowserError>;
}

/// Bounds of the expansion loop
#[derive(Debug, Clone)]
pub struct ExpansionSettings {
    pub max_clicks: u32,
    pub load_more_timeout: Duration,
    pub settle_delay: Duration,
}

impl ExpansionSettings {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            max_clicks: config.max_load_more_clicks,
            load_more_timeout: Duration::from_millis(config.load_more_timeout_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }
}

/// Why the expansion loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The control no longer appeared
    Exhausted,
    /// The click cap was reached
    IterationCap,
    /// An interaction failed; the content loaded so far is kept
    Interaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionReport {
    pub clicks: u32,
    pub stop: StopReason,
}

/// Waits for DOM readiness, logging instead of failing
///
/// Returns true when the page reported ready. A timeout or a failed check
/// only means the listing is read in whatever state it reached.
pub async fn await_ready<P>(page: &mut P, timeout: Duration, url: &Url) -> bool
where
    P: ExpandablePage + ?Sized,
{
    match page.wait_until_ready(timeout).await {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!("{} not ready after {:?}, continuing", url, timeout);
            false
        }
        Err(e) => {
            tracing::warn!("Readiness check on {} failed: {}, continuing", url, e);
            false
        }
    }
}

/// Clicks "load more" until it disappears, fails, or the cap is reached
///
/// Never returns an error: interaction failures end the loop and whatever has
/// loaded is used.
pub async fn expand_page<P>(page: &mut P, settings: &ExpansionSettings) -> ExpansionReport
where
    P: ExpandablePage + ?Sized,
{
    let mut clicks = 0;

    while clicks < settings.max_clicks {
        match page.reveal_load_more(settings.load_more_timeout).await {
            Ok(true) => {}
            Ok(false) => {
                return ExpansionReport {
                    clicks,
                    stop: StopReason::Exhausted,
                }
            }
            Err(e) => {
                tracing::warn!("Stopping expansion after {} click(s): {}", clicks, e);
                return ExpansionReport {
                    clicks,
                    stop: StopReason::Interaction,
                };
            }
        }

        if let Err(e) = page.click_load_more().await {
            tracing::warn!("Stopping expansion after {} click(s): {}", clicks, e);
            return ExpansionReport {
                clicks,
                stop: StopReason::Interaction,
            };
        }

        clicks += 1;
        tracing::debug!("Clicked load-more ({}/{})", clicks, settings.max_clicks);
        tokio::time::sleep(settings.settle_delay).await;
    }

    tracing::warn!(
        "Load-more control still present after {} clicks, using loaded content",
        clicks
    );
    ExpansionReport {
        clicks,
        stop: StopReason::IterationCap,
    }
}

/// A running Chrome process with its CDP handler
///
/// Dropping the session without [`shutdown`](Self::shutdown) still closes the
/// browser: the close is spawned on the runtime that launched it.
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    runtime: tokio::runtime::Handle,
}

impl BrowserSession {
    pub async fn launch(config: &BrowserConfig, http: &HttpConfig) -> Result<Self, BrowserError> {
        let mut builder = ChromeConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", http.user_agent))
            .arg(format!("--lang={}", primary_language(&http.accept_language)))
            .arg(format!("--accept-lang={}", http.accept_language));

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        let chrome_config = builder.build().map_err(BrowserError::Launch)?;
        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {}", e);
                }
            }
        });

        tracing::debug!("Browser launched");
        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            runtime: tokio::runtime::Handle::current(),
        })
    }

    /// Opens `url` in a new tab and waits for the load event
    pub async fn open(&self, url: &Url) -> Result<Page, BrowserError> {
        let browser = self.browser.as_ref().ok_or_else(|| BrowserError::Navigation {
            url: url.to_string(),
            message: "browser already closed".to_string(),
        })?;

        browser
            .new_page(url.as_str())
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// Closes the browser and waits for the process to exit
    pub async fn shutdown(mut self) {
        if let Some(browser) = self.browser.take() {
            close_browser(browser, self.handler.take()).await;
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(browser) = self.browser.take() {
            let handler = self.handler.take();
            tracing::debug!("Browser session dropped, closing in background");
            self.runtime.spawn(close_browser(browser, handler));
        }
    }
}

async fn close_browser(mut browser: Browser, handler: Option<JoinHandle<()>>) {
    if let Err(e) = browser.close().await {
        tracing::warn!("Browser close error: {}", e);
    }
    if let Err(e) = browser.wait().await {
        tracing::warn!("Browser wait error: {}", e);
    }
    if let Some(handler) = handler {
        handler.abort();
    }
    tracing::debug!("Browser closed");
}

/// "vi-VN,vi;q=0.8" -> "vi-VN"
fn primary_language(accept_language: &str) -> &str {
    accept_language
        .split([',', ';'])
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("vi-VN")
}

/// A live Chrome tab driven through injected scripts
pub struct ChromePage {
    page: Page,
    reveal_script: String,
}

impl ChromePage {
    /// Wraps `page`; `load_more_pattern` is the label regex of the control
    pub fn new(page: Page, load_more_pattern: &str) -> Self {
        Self {
            page,
            reveal_script: reveal_script(load_more_pattern),
        }
    }

    /// HTTP status of the main document, if the browser exposes it
    pub async fn response_status(&self) -> Option<u16> {
        let script = r#"(() => {
            const nav = performance.getEntriesByType('navigation')[0];
            return nav && typeof nav.responseStatus === 'number' ? nav.responseStatus : 0;
        })()"#;
        let status = self.page.evaluate(script).await.ok()?.into_value::<u16>().ok()?;
        (status > 0).then_some(status)
    }

    async fn eval_bool(&self, script: &str) -> Result<bool, BrowserError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Interaction(e.to_string()))?
            .into_value::<bool>()
            .map_err(|e| BrowserError::Interaction(e.to_string()))
    }
}

/// Script that tags the first visible control whose label matches `pattern`
fn reveal_script(pattern: &str) -> String {
    let pattern = serde_json::to_string(pattern).unwrap_or_else(|_| "\"$^\"".to_string());
    format!(
        r#"(() => {{
            const pattern = new RegExp({pattern}, 'i');
            const attr = '{attr}';
            document.querySelectorAll('[' + attr + ']').forEach(e => e.removeAttribute(attr));
            for (const el of document.querySelectorAll('button, a, [role="button"]')) {{
                const label = (el.innerText || el.textContent || '').replace(/\s+/g, ' ').trim();
                if (!pattern.test(label) || el.disabled) continue;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                if (rect.width === 0 || rect.height === 0) continue;
                if (style.visibility === 'hidden' || style.display === 'none') continue;
                el.scrollIntoView({{ block: 'center' }});
                el.setAttribute(attr, '1');
                return true;
            }}
            return false;
        }})()"#,
        pattern = pattern,
        attr = LOAD_MORE_ATTR,
    )
}

#[async_trait]
impl ExpandablePage for ChromePage {
    async fn wait_until_ready(&mut self, timeout: Duration) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            let ready = self
                .eval_bool("['interactive', 'complete'].includes(document.readyState)")
                .await?;
            if ready {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn reveal_load_more(&mut self, timeout: Duration) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.eval_bool(&self.reveal_script).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click_load_more(&mut self) -> Result<(), BrowserError> {
        let interaction = |e: chromiumoxide::error::CdpError| BrowserError::Interaction(e.to_string());
        let element = self
            .page
            .find_element(format!("[{}]", LOAD_MORE_ATTR))
            .await
            .map_err(interaction)?;
        element.scroll_into_view().await.map_err(interaction)?;
        element.click().await.map_err(interaction)?;
        Ok(())
    }

    async fn html(&mut self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Content(e.to_string()))
    }
}

/// [`ListingExpander`] backed by a fresh Chrome process per listing
pub struct ChromeExpander {
    browser: BrowserConfig,
    http: HttpConfig,
    load_more_pattern: String,
    settings: ExpansionSettings,
}

impl ChromeExpander {
    pub fn new(browser: &BrowserConfig, http: &HttpConfig, load_more_pattern: &str) -> Self {
        Self {
            browser: browser.clone(),
            http: http.clone(),
            load_more_pattern: load_more_pattern.to_string(),
            settings: ExpansionSettings::from_config(browser),
        }
    }

    async fn expand_in(&self, session: &BrowserSession, url: &Url) -> Result<String, BrowserError> {
        let page = session.open(url).await?;
        let mut page = ChromePage::new(page, &self.load_more_pattern);

        let dom_timeout = Duration::from_millis(self.browser.dom_ready_timeout_ms);
        await_ready(&mut page, dom_timeout, url).await;

        if let Some(status) = page.response_status().await {
            if status >= 400 {
                return Err(BrowserError::HttpStatus {
                    url: url.to_string(),
                    status,
                });
            }
        }

        let report = expand_page(&mut page, &self.settings).await;
        tracing::info!(
            "Expanded {} with {} load-more click(s) ({:?})",
            url,
            report.clicks,
            report.stop
        );

        page.html().await
    }
}

#[async_trait]
impl ListingExpander for ChromeExpander {
    async fn load_and_expand(&self, url: &Url) -> Result<String, BrowserError> {
        let session = BrowserSession::launch(&self.browser, &self.http).await?;
        let result = self.expand_in(&session, url).await;
        session.shutdown().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Page whose control stays visible for `visible_for` reveals (forever if None)
    struct ScriptedPage {
        visible_for: Option<u32>,
        reveals: u32,
        clicks: u32,
        fail_click_at: Option<u32>,
        /// Outcome of the readiness check; None makes it fail
        ready: Option<bool>,
    }

    impl ScriptedPage {
        fn new(visible_for: Option<u32>) -> Self {
            Self {
                visible_for,
                reveals: 0,
                clicks: 0,
                fail_click_at: None,
                ready: Some(true),
            }
        }
    }

    #[async_trait]
    impl ExpandablePage for ScriptedPage {
        async fn wait_until_ready(&mut self, _timeout: Duration) -> Result<bool, BrowserError> {
            self.ready
                .ok_or_else(|| BrowserError::Interaction("execution context destroyed".to_string()))
        }

        async fn reveal_load_more(&mut self, _timeout: Duration) -> Result<bool, BrowserError> {
            self.reveals += 1;
            Ok(self.visible_for.map_or(true, |n| self.reveals <= n))
        }

        async fn click_load_more(&mut self) -> Result<(), BrowserError> {
            if self.fail_click_at == Some(self.clicks + 1) {
                return Err(BrowserError::Interaction("click intercepted".to_string()));
            }
            self.clicks += 1;
            Ok(())
        }

        async fn html(&mut self) -> Result<String, BrowserError> {
            Ok(format!("<p>{} clicks</p>", self.clicks))
        }
    }

    fn settings(max_clicks: u32) -> ExpansionSettings {
        ExpansionSettings {
            max_clicks,
            load_more_timeout: Duration::from_millis(1),
            settle_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_stops_when_control_disappears() {
        let mut page = ScriptedPage::new(Some(3));
        let report = expand_page(&mut page, &settings(20)).await;
        assert_eq!(report, ExpansionReport { clicks: 3, stop: StopReason::Exhausted });
        assert_eq!(page.html().await.unwrap(), "<p>3 clicks</p>");
    }

    #[tokio::test]
    async fn test_bounded_when_control_never_disappears() {
        let mut page = ScriptedPage::new(None);
        let report = expand_page(&mut page, &settings(20)).await;
        assert_eq!(report, ExpansionReport { clicks: 20, stop: StopReason::IterationCap });
        assert_eq!(page.reveals, 20);
    }

    #[tokio::test]
    async fn test_click_failure_keeps_partial_content() {
        let mut page = ScriptedPage::new(None);
        page.fail_click_at = Some(2);
        let report = expand_page(&mut page, &settings(20)).await;
        assert_eq!(report, ExpansionReport { clicks: 1, stop: StopReason::Interaction });
    }

    #[tokio::test]
    async fn test_no_control_means_no_clicks() {
        let mut page = ScriptedPage::new(Some(0));
        let report = expand_page(&mut page, &settings(20)).await;
        assert_eq!(report.clicks, 0);
        assert_eq!(report.stop, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_failed_readiness_check_does_not_abort() {
        let url = Url::parse("https://nhathuoclongchau.com.vn/thuoc/thuoc-di-ung").unwrap();
        let mut page = ScriptedPage::new(Some(2));
        page.ready = None;

        assert!(!await_ready(&mut page, Duration::from_millis(1), &url).await);
        let report = expand_page(&mut page, &settings(20)).await;
        assert_eq!(report, ExpansionReport { clicks: 2, stop: StopReason::Exhausted });
        assert_eq!(page.html().await.unwrap(), "<p>2 clicks</p>");
    }

    #[tokio::test]
    async fn test_readiness_outcomes() {
        let url = Url::parse("https://nhathuoclongchau.com.vn/thuoc/thuoc-di-ung").unwrap();
        let mut page = ScriptedPage::new(Some(0));
        assert!(await_ready(&mut page, Duration::from_millis(1), &url).await);
        page.ready = Some(false);
        assert!(!await_ready(&mut page, Duration::from_millis(1), &url).await);
    }

    #[test]
    fn test_reveal_script_embeds_pattern() {
        let script = reveal_script(r"xem\s+thêm\s*\d*\s*sản\s+phẩm");
        assert!(script.contains(r#"new RegExp("xem\\s+thêm\\s*\\d*\\s*sản\\s+phẩm", 'i')"#));
        assert!(script.contains(LOAD_MORE_ATTR));
    }

    #[test]
    fn test_primary_language() {
        assert_eq!(primary_language("vi-VN,vi;q=0.8,en-US;q=0.5"), "vi-VN");
        assert_eq!(primary_language(""), "vi-VN");
    }

    #[test]
    fn test_settings_from_config() {
        let settings = ExpansionSettings::from_config(&BrowserConfig::default());
        assert_eq!(settings.max_clicks, 20);
        assert_eq!(settings.load_more_timeout, Duration::from_millis(3000));
        assert_eq!(settings.settle_delay, Duration::from_millis(2000));
    }
}
