use super::markers::{MarkerVariant, NeighborMarker};
use super::{FetchError, RenderFetcher, RenderedDocument};
use crate::extractor::numeric::first_integer;
use crate::platform::PlatformTag;
use crate::resolver::CanonicalTarget;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use thirtyfour::prelude::*;
use thirtyfour::ChromeCapabilities;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);
const MOBILE_NEIGHBOR_SELECTOR: &str = "[class*='buddy']";
const DESKTOP_FRAME_ID: &str = "mainFrame";
/// Lookups tried in order inside the desktop frame; the first positive integer wins.
const DESKTOP_NEIGHBOR_LOOKUPS: [NeighborLookup; 5] = [
    NeighborLookup::Css("#buddyCount"),
    NeighborLookup::Css(".cm-col1 em"),
    NeighborLookup::Css("a[href*='BuddyList'] em"),
    NeighborLookup::Css("a[href*='BuddyList']"),
    NeighborLookup::XPath("//a[contains(., '이웃')]"),
];
const INSTAGRAM_READY_SELECTOR: &str = "meta[name='description'], meta[property='og:description']";
const THREADS_READY_SELECTOR: &str = "meta[property='og:description'], span[title]";

/// Browser launch and pacing options for [`WebDriverFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub locale: String,
    /// Fixed delay after the document reports complete.
    pub settle_delay: Duration,
    /// Upper bound for each in-page readiness wait.
    pub ready_wait: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: "ko-KR".to_string(),
            settle_delay: Duration::from_millis(1500),
            ready_wait: Duration::from_secs(10),
        }
    }
}

/// Fetcher that opens a fresh ChromeDriver session per target.
pub struct WebDriverFetcher {
    settings: BrowserSettings,
}

impl WebDriverFetcher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    fn capabilities(&self) -> WebDriverResult<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--window-size=1920,1080".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--incognito".to_string(),
            format!("--user-agent={}", self.settings.user_agent),
            format!("--lang={}", self.settings.locale),
        ];
        if self.settings.headless {
            args.insert(0, "--headless=new".to_string());
        }
        caps.add_chrome_option("args", args)?;
        caps.add_chrome_option(
            "prefs",
            json!({ "intl.accept_languages": self.settings.locale }),
        )?;
        Ok(caps)
    }

    async fn launch(&self) -> Result<WebDriver, FetchError> {
        let caps = self
            .capabilities()
            .map_err(|err| FetchError::Launch(err.to_string()))?;
        WebDriver::new(self.settings.webdriver_url.as_str(), caps)
            .await
            .map_err(|err| FetchError::Launch(err.to_string()))
    }

    async fn capture(
        &self,
        driver: &WebDriver,
        target: &CanonicalTarget,
        platform: PlatformTag,
    ) -> Result<String, FetchError> {
        driver
            .goto(target.url.as_str())
            .await
            .map_err(|err| navigation_error(target, err))?;

        self.wait_for_document_complete(driver, target).await;
        tokio::time::sleep(self.settings.settle_delay).await;

        match platform {
            PlatformTag::Blog if target.is_mobile_blog() => {
                self.capture_mobile_blog(driver, target).await
            }
            PlatformTag::Blog => self.capture_desktop_blog(driver, target).await,
            PlatformTag::Instagram => {
                self.wait_for(driver, By::Css(INSTAGRAM_READY_SELECTOR), target, "description meta")
                    .await;
                page_source(driver, target).await
            }
            PlatformTag::Threads => {
                self.wait_for(driver, By::Css(THREADS_READY_SELECTOR), target, "profile title")
                    .await;
                page_source(driver, target).await
            }
        }
    }

    /// WebDriver has no network-idle signal, so poll `document.readyState` instead.
    async fn wait_for_document_complete(&self, driver: &WebDriver, target: &CanonicalTarget) {
        let deadline = Instant::now() + self.settings.ready_wait;
        loop {
            match driver.execute("return document.readyState;", Vec::new()).await {
                Ok(ret) if ret.json().as_str() == Some("complete") => return,
                Ok(_) => {}
                Err(err) => {
                    debug!(url = %target.url, error = %err, "readyState probe failed");
                }
            }
            if Instant::now() >= deadline {
                warn!(url = %target.url, "document never reported complete; capturing anyway");
                return;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Wait for an element, logging instead of failing when it never shows up.
    async fn wait_for(
        &self,
        driver: &WebDriver,
        by: By,
        target: &CanonicalTarget,
        what: &str,
    ) -> Option<WebElement> {
        match driver
            .query(by)
            .wait(self.settings.ready_wait, READY_POLL_INTERVAL)
            .first()
            .await
        {
            Ok(element) => Some(element),
            Err(err) => {
                warn!(url = %target.url, element = what, error = %err, "readiness wait timed out; using partial markup");
                None
            }
        }
    }

    async fn capture_mobile_blog(
        &self,
        driver: &WebDriver,
        target: &CanonicalTarget,
    ) -> Result<String, FetchError> {
        let count = match self
            .wait_for(driver, By::Css(MOBILE_NEIGHBOR_SELECTOR), target, "neighbor count")
            .await
        {
            Some(element) => element
                .text()
                .await
                .ok()
                .and_then(|text| first_integer(&text)),
            None => None,
        };

        let mut markup = page_source(driver, target).await?;
        match count {
            Some(count) => {
                info!(url = %target.url, count, "read mobile neighbor count in-page");
                NeighborMarker::new(MarkerVariant::Mobile, count).append_to(&mut markup);
            }
            None => warn!(url = %target.url, "mobile neighbor count not readable in-page"),
        }
        Ok(markup)
    }

    async fn capture_desktop_blog(
        &self,
        driver: &WebDriver,
        target: &CanonicalTarget,
    ) -> Result<String, FetchError> {
        let Some(frame) = self
            .wait_for(driver, By::Id(DESKTOP_FRAME_ID), target, "blog main frame")
            .await
        else {
            return page_source(driver, target).await;
        };

        if let Err(err) = frame.enter_frame().await {
            warn!(url = %target.url, error = %err, "could not enter blog main frame");
            return page_source(driver, target).await;
        }

        // The frame body is populated after the outer document settles.
        self.wait_for(driver, By::Tag("body"), target, "frame body").await;
        tokio::time::sleep(self.settings.settle_delay).await;

        let count = desktop_neighbor_count(driver).await;
        let mut markup = page_source(driver, target).await?;
        match count {
            Some(count) => {
                info!(url = %target.url, count, "read desktop neighbor count inside frame");
                NeighborMarker::new(MarkerVariant::Desktop, count).append_to(&mut markup);
            }
            None => warn!(url = %target.url, "desktop neighbor count not found inside frame"),
        }
        Ok(markup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NeighborLookup {
    Css(&'static str),
    /// Partial link-text matches go through XPath `contains`.
    XPath(&'static str),
}

impl NeighborLookup {
    fn by(self) -> By {
        match self {
            NeighborLookup::Css(selector) => By::Css(selector),
            NeighborLookup::XPath(path) => By::XPath(path),
        }
    }
}

async fn desktop_neighbor_count(driver: &WebDriver) -> Option<u64> {
    for lookup in DESKTOP_NEIGHBOR_LOOKUPS {
        if let Some(count) = first_count_in(driver, lookup.by()).await {
            return Some(count);
        }
    }
    None
}

async fn first_count_in(driver: &WebDriver, by: By) -> Option<u64> {
    let elements = driver.find_all(by).await.ok()?;
    for element in elements {
        if let Ok(text) = element.text().await {
            if let Some(count) = first_integer(&text).filter(|count| *count > 0) {
                return Some(count);
            }
        }
    }
    None
}

async fn page_source(driver: &WebDriver, target: &CanonicalTarget) -> Result<String, FetchError> {
    driver
        .source()
        .await
        .map_err(|err| navigation_error(target, err))
}

fn navigation_error(target: &CanonicalTarget, err: WebDriverError) -> FetchError {
    FetchError::Navigation {
        url: target.url.clone(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl RenderFetcher for WebDriverFetcher {
    async fn fetch(
        &self,
        target: &CanonicalTarget,
        timeout: Duration,
    ) -> Result<RenderedDocument, FetchError> {
        let platform = target
            .platform
            .ok_or_else(|| FetchError::Unsupported(target.raw_input.clone()))?;
        let deadline = Instant::now() + timeout;
        let timed_out = || FetchError::Timeout {
            url: target.url.clone(),
            timeout,
        };

        info!(url = %target.url, %platform, "opening browser session");
        let driver = timeout_at(deadline, self.launch())
            .await
            .map_err(|_| timed_out())??;

        let captured = timeout_at(deadline, self.capture(&driver, target, platform)).await;

        if let Err(err) = driver.quit().await {
            warn!(url = %target.url, error = %err, "failed to close browser session");
        }

        let markup = captured.map_err(|_| timed_out())??;
        Ok(RenderedDocument::new(target.clone(), markup))
    }
}
