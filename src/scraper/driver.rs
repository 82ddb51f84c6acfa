use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCacheParams, ClearBrowserCookiesParams,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::page::Page;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::NavigationSection;

use super::error::{ScrapeError, ScrapeResult};

#[derive(Debug, Clone)]
pub struct NavigateOptions {
    /// Driver hint for what "navigation finished" means ("load",
    /// "networkidle2", ...). "none" skips the settle wait entirely.
    pub wait_until: String,
    pub timeout: Duration,
}

impl NavigateOptions {
    pub fn from_section(section: &NavigationSection) -> Self {
        Self {
            wait_until: section.wait_until.clone(),
            timeout: Duration::from_millis(section.timeout_ms),
        }
    }
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            wait_until: "networkidle2".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub final_url: String,
    pub http_status: Option<u16>,
}

/// Browser capability consumed by the engine. Implemented for CDP pages by
/// [`CdpDriver`]; tests provide scripted implementations.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate_to(&self, url: &str, opts: &NavigateOptions)
        -> ScrapeResult<NavigationResult>;
    async fn current_url(&self) -> ScrapeResult<String>;
    async fn body_text(&self) -> ScrapeResult<String>;
    async fn count_matches(&self, selector: &str) -> ScrapeResult<u32>;
    async fn scroll_by(&self, delta_px: f64) -> ScrapeResult<()>;
    async fn viewport_height(&self) -> ScrapeResult<f64>;
    async fn scroll_depth_px(&self) -> ScrapeResult<u32>;
    async fn clear_cookies_and_cache(&self) -> ScrapeResult<()>;
}

/// [`PageDriver`] over an already-launched `chromiumoxide` page. Launching
/// and tab management belong to the embedding task runner.
#[derive(Debug)]
pub struct CdpDriver {
    page: Page,
}

impl CdpDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn evaluate_into<T: DeserializeOwned>(&self, script: &str) -> ScrapeResult<T> {
        self.page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|err| ScrapeError::Unexpected(format!("failed to decode page value: {err}")))
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn navigate_to(
        &self,
        url: &str,
        opts: &NavigateOptions,
    ) -> ScrapeResult<NavigationResult> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(ScrapeError::Configuration)?;
        let navigation = async {
            self.page.goto(params).await?;
            if opts.wait_until != "none" {
                self.page.wait_for_navigation().await?;
            }
            Ok::<_, ScrapeError>(())
        };
        tokio::time::timeout(opts.timeout, navigation)
            .await
            .map_err(|_| {
                ScrapeError::NavigationTimeout(format!(
                    "{url} did not reach {} within {:?}",
                    opts.wait_until, opts.timeout
                ))
            })??;

        let final_url = self.current_url().await?;
        // responseStatus is absent on older Chromium builds; classification
        // falls back to body signals when it is.
        let http_status = self
            .page
            .evaluate(
                "(() => { const entries = performance.getEntriesByType('navigation'); \
                 if (!entries.length) return null; \
                 const status = entries[entries.length - 1].responseStatus; \
                 return status && status > 0 ? status : null; })()",
            )
            .await?
            .into_value::<Option<u16>>()
            .unwrap_or(None);
        if http_status.is_none() {
            debug!(url = %final_url, "no http status available from navigation timing");
        }
        Ok(NavigationResult {
            final_url,
            http_status,
        })
    }

    async fn current_url(&self) -> ScrapeResult<String> {
        let url = self.page.url().await?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn body_text(&self) -> ScrapeResult<String> {
        self.evaluate_into("document.body ? document.body.innerText : ''")
            .await
    }

    async fn count_matches(&self, selector: &str) -> ScrapeResult<u32> {
        let script = format!(
            "document.querySelectorAll({}).length",
            serde_json::to_string(selector)
                .map_err(|err| ScrapeError::Unexpected(err.to_string()))?
        );
        self.evaluate_into(&script).await
    }

    async fn scroll_by(&self, delta_px: f64) -> ScrapeResult<()> {
        let script = format!("window.scrollBy({{ top: {delta_px}, behavior: 'smooth' }});");
        self.page.evaluate(script.as_str()).await?;
        Ok(())
    }

    async fn viewport_height(&self) -> ScrapeResult<f64> {
        self.evaluate_into("window.innerHeight").await
    }

    async fn scroll_depth_px(&self) -> ScrapeResult<u32> {
        self.evaluate_into("Math.round(window.scrollY || window.pageYOffset || 0)")
            .await
    }

    async fn clear_cookies_and_cache(&self) -> ScrapeResult<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await?;
        self.page
            .execute(ClearBrowserCacheParams::default())
            .await?;
        Ok(())
    }
}
