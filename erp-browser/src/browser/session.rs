//! Browser session lifecycle.
//!
//! A [`BrowserScope`] owns the Chrome process and the task driving its CDP
//! handler. [`with_browser`] runs a closure against a fresh page and closes
//! the scope afterwards whatever the closure returned; dropping a scope that
//! was never closed still aborts the handler and lets the process be killed.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::BrowserError;

/// Browser launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Chrome binary; chromiumoxide auto-detects when unset
    pub executable: Option<PathBuf>,
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,
    /// CDP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_headless() -> bool {
    true
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            viewport: default_viewport(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SessionConfig {
    /// Translate into a chromiumoxide launch config.
    pub fn to_browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(self.viewport.width, self.viewport.height)
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .arg("--disable-blink-features=AutomationControlled");

        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = self.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(BrowserError::LaunchFailed)
    }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A running browser plus its CDP handler task.
#[derive(Debug)]
pub struct BrowserScope {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
}

impl BrowserScope {
    /// Launch Chrome and start driving its event loop.
    pub async fn launch(config: &SessionConfig) -> Result<Self, BrowserError> {
        let browser_config = config.to_browser_config()?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        tracing::debug!(headless = config.headless, "Browser launched");

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
        })
    }

    /// Open a blank page.
    pub async fn new_page(&self) -> Result<Page, BrowserError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| BrowserError::LaunchFailed("browser already closed".into()))?;
        Ok(browser.new_page("about:blank").await?)
    }

    /// Close the browser and wait for the process to exit.
    ///
    /// Close failures are logged; the process is reaped either way.
    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "Browser close command failed, killing process");
                let _ = browser.kill().await;
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!(error = %e, "Failed to reap browser process");
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        tracing::debug!("Browser closed");
    }
}

impl Drop for BrowserScope {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        if self.browser.is_some() {
            tracing::warn!("Browser scope dropped without close; process is killed on drop");
        }
    }
}

/// Run `f` against a fresh page, closing the browser on every exit path.
pub async fn with_browser<F, Fut, T>(config: &SessionConfig, f: F) -> Result<T, BrowserError>
where
    F: FnOnce(Page) -> Fut,
    Fut: Future<Output = T>,
{
    let scope = BrowserScope::launch(config).await?;

    let page = match scope.new_page().await {
        Ok(page) => page,
        Err(e) => {
            scope.close().await;
            return Err(e);
        }
    };

    let output = f(page).await;
    scope.close().await;
    Ok(output)
}
