//! Headless browser sessions.
//!
//! Verification talks to the browser through [`BrowserSession`] and
//! [`BrowserLauncher`], so scans can run against a fake in tests. The Chrome
//! implementation drives `headless_chrome`, which is synchronous, from
//! blocking tasks.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use headless_chrome::{Browser, LaunchOptions, Tab};
use log::{debug, warn};

use super::js_analysis::NetworkRequest;
use crate::config::{
    BROWSER_IDLE_TIMEOUT, BROWSER_NAVIGATION_TIMEOUT, BROWSER_SETTLE_DELAY, DEFAULT_USER_AGENT,
    MAX_INTERCEPTED_BODY_SIZE,
};
use crate::error_handling::InitializationError;

const RESPONSE_HANDLER: &str = "seo_poison_scanner_capture";

/// A fully rendered page.
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    /// URL after redirects
    pub final_url: String,
    /// Rendered DOM serialized as HTML
    pub html: String,
    /// Every response received while rendering
    pub requests: Vec<NetworkRequest>,
}

/// One browser, used sequentially by one scan.
pub trait BrowserSession: Send {
    /// Navigates to `url`, waits for DOM ready plus a settle delay, and returns
    /// the rendered page.
    fn render<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<RenderedPage>>;

    /// Releases the browser. Called once, from [`ScopedSession`]'s drop.
    fn close(&mut self);
}

/// Starts browser sessions.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserSession>, InitializationError>>;
}

/// Owns a session for the length of a scan and closes it on every exit path.
#[derive(Default)]
pub struct ScopedSession {
    session: Option<Box<dyn BrowserSession>>,
}

impl ScopedSession {
    pub fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// No browser: verification stays on the quick path.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The session, if one was acquired.
    pub fn get(&mut self) -> Option<&mut (dyn BrowserSession + 'static)> {
        self.session.as_deref_mut()
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!("Closing browser session");
            session.close();
        }
    }
}

/// Launches headless Chrome.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    /// Chrome binary; `None` lets headless_chrome locate one
    pub chrome_path: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path }
    }
}

impl BrowserLauncher for ChromeLauncher {
    fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserSession>, InitializationError>> {
        let path = self.chrome_path.clone();
        Box::pin(async move {
            let session = tokio::task::spawn_blocking(move || ChromeSession::launch_blocking(path))
                .await
                .map_err(|e| InitializationError::BrowserLaunchError(format!("launch task failed: {}", e)))??;
            Ok(Box::new(session) as Box<dyn BrowserSession>)
        })
    }
}

/// A Chrome process with one tab.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl ChromeSession {
    fn launch_blocking(path: Option<PathBuf>) -> Result<Self, InitializationError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .idle_browser_timeout(BROWSER_IDLE_TIMEOUT)
            .path(path)
            .build()
            .map_err(|e| InitializationError::BrowserLaunchError(format!("invalid launch options: {}", e)))?;
        let browser = Browser::new(options).map_err(|e| InitializationError::BrowserLaunchError(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| InitializationError::BrowserLaunchError(e.to_string()))?;
        tab.set_default_timeout(BROWSER_NAVIGATION_TIMEOUT);
        tab.set_user_agent(DEFAULT_USER_AGENT, None, None)
            .map_err(|e| InitializationError::BrowserLaunchError(e.to_string()))?;
        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
        })
    }
}

/// Runs browser teardown on the blocking pool when called from inside a
/// runtime, inline otherwise.
fn run_blocking_teardown(teardown: impl FnOnce() + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(teardown);
        }
        Err(_) => teardown(),
    }
}

fn is_textual(mime: &str) -> bool {
    mime.starts_with("text/") || mime.contains("javascript") || mime.contains("json") || mime.contains("xml")
}

fn render_blocking(tab: &Tab, url: &str) -> Result<RenderedPage> {
    let captured: Arc<Mutex<Vec<NetworkRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    tab.register_response_handling(
        RESPONSE_HANDLER,
        Box::new(move |params, fetch_body| {
            let response = &params.response;
            let body = if is_textual(&response.mime_type) {
                fetch_body()
                    .ok()
                    .map(|b| b.body)
                    .filter(|b| b.len() <= MAX_INTERCEPTED_BODY_SIZE)
            } else {
                None
            };
            if let Ok(mut requests) = sink.lock() {
                requests.push(NetworkRequest {
                    url: response.url.clone(),
                    status: u16::try_from(response.status).ok(),
                    mime_type: Some(response.mime_type.clone()),
                    body,
                });
            }
        }),
    )
    .context("registering response handler failed")?;

    let outcome: Result<(String, String)> = (|| {
        tab.navigate_to(url).context("navigation failed")?;
        tab.wait_until_navigated().context("page load timed out")?;
        std::thread::sleep(BROWSER_SETTLE_DELAY);
        let html = tab.get_content().context("reading rendered DOM failed")?;
        Ok((tab.get_url(), html))
    })();
    if let Err(e) = tab.deregister_response_handling(RESPONSE_HANDLER) {
        debug!("Deregistering response handler failed: {}", e);
    }
    let (final_url, html) = outcome?;

    let requests = captured.lock().map(|r| r.clone()).unwrap_or_default();
    Ok(RenderedPage {
        final_url,
        html,
        requests,
    })
}

impl BrowserSession for ChromeSession {
    fn render<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<RenderedPage>> {
        let tab = self.tab.clone();
        let url = url.to_string();
        Box::pin(async move {
            let tab = tab.context("browser session already closed")?;
            tokio::task::spawn_blocking(move || render_blocking(&tab, &url))
                .await
                .context("browser render task failed")?
        })
    }

    fn close(&mut self) {
        let (tab, browser) = (self.tab.take(), self.browser.take());
        if tab.is_none() && browser.is_none() {
            return;
        }
        // Both calls block on a reply from Chrome
        run_blocking_teardown(move || {
            if let Some(tab) = tab {
                if let Err(e) = tab.close(true) {
                    warn!("Closing browser tab failed: {}", e);
                }
            }
            // Dropping the Browser terminates the Chrome process
            drop(browser);
        });
    }
}
