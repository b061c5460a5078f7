use crate::config::Settings;
use crate::error::ScoutError;
use crate::models::ObservedRequest;
use crate::scrapers::network::NetworkRecorder;
use crate::scrapers::traits::{BrowserHandle, PageSession};
use anyhow::{Context, Result};
use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision};
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Keeps a resident browser alive across quiet periods
const RESIDENT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365);
const WINDOW_SIZE: (u32, u32) = (1366, 768);

/// Headless Chrome instance shared by every session of the process
pub struct ChromeBrowser {
    browser: Browser,
    navigation_timeout: Duration,
}

impl ChromeBrowser {
    pub fn launch(settings: &Settings) -> Result<Self> {
        info!(
            "Launching {} Chrome...",
            if settings.nonheadless { "visible" } else { "headless" }
        );

        let args = vec![
            OsStr::new("--disable-sync"),
            OsStr::new("--lang=en-US,en;q=0.9"),
            OsStr::new("--disable-gpu"),
        ];
        let options = LaunchOptions::default_builder()
            .headless(!settings.nonheadless)
            .sandbox(false)
            .ignore_certificate_errors(true)
            .window_size(Some(WINDOW_SIZE))
            .idle_browser_timeout(RESIDENT_IDLE_TIMEOUT)
            .args(args)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self {
            browser,
            navigation_timeout: settings.navigation_timeout(),
        })
    }
}

impl BrowserHandle for ChromeBrowser {
    type Page = ChromePage;

    fn open_page(&self) -> Result<Self::Page, ScoutError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| ScoutError::Browser(format!("failed to open tab: {}", e)))?;
        tab.set_default_timeout(self.navigation_timeout);
        Ok(ChromePage { tab })
    }
}

/// One browser tab, owned by a single session
pub struct ChromePage {
    tab: Arc<Tab>,
}

impl PageSession for ChromePage {
    fn observe_requests(&self, recorder: Arc<NetworkRecorder>) -> Result<(), ScoutError> {
        self.tab
            .enable_fetch(None, None)
            .map_err(|e| ScoutError::Browser(format!("failed to enable interception: {}", e)))?;
        self.tab
            .enable_request_interception(Arc::new(SideChannelInterceptor { recorder }))
            .map_err(|e| ScoutError::Browser(format!("failed to install interceptor: {}", e)))?;
        Ok(())
    }

    fn navigate(&self, url: &str) -> Result<(), ScoutError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|e| ScoutError::Navigation(e.to_string()))
    }

    fn wait_for_any(&self, selectors: &str) -> Result<(), ScoutError> {
        self.tab
            .wait_for_element(selectors)
            .map(|_| ())
            .map_err(|e| ScoutError::Navigation(format!("results never rendered: {}", e)))
    }

    fn content(&self) -> Result<String, ScoutError> {
        self.tab
            .get_content()
            .map_err(|e| ScoutError::Browser(format!("failed to read page content: {}", e)))
    }

    fn close(&self) -> Result<(), ScoutError> {
        self.tab
            .close(true)
            .map(|_| ())
            .map_err(|e| ScoutError::Browser(e.to_string()))
    }
}

/// Hands each paused request to the recorder and lets it through untouched
struct SideChannelInterceptor {
    recorder: Arc<NetworkRecorder>,
}

impl RequestInterceptor for SideChannelInterceptor {
    fn intercept(
        &self,
        _transport: Arc<Transport>,
        _session_id: SessionId,
        event: RequestPausedEvent,
    ) -> RequestPausedDecision {
        let request = event.params.request;
        debug!(method = %request.method, url = %request.url, "Request paused");
        self.recorder.observe(ObservedRequest {
            headers: serde_json::to_value(&request.headers).unwrap_or_default(),
            url: request.url,
            post_data: request.post_data,
        });
        RequestPausedDecision::Continue(None)
    }
}
