// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based renderer using chromiumoxide.

use super::{BrowserLauncher, ControlState, NavigationResult, RenderContext, Renderer};
use crate::locator::Locator;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Environment variable naming an explicit Chromium binary.
pub const CHROMIUM_PATH_ENV: &str = "LISTSCRAPE_CHROMIUM_PATH";

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. LISTSCRAPE_CHROMIUM_PATH env
    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. ~/.listscrape/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".listscrape/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".listscrape/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".listscrape/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".listscrape/chromium/chrome-linux64/chrome"),
                home.join(".listscrape/chromium/chrome"),
            ]
        };
        if let Some(c) = candidates.into_iter().find(|c| c.exists()) {
            return Some(c);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches one headless Chromium per job.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    /// Explicit binary; falls back to [`find_chromium`].
    pub chromium_path: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(chromium_path: Option<PathBuf>) -> Self {
        Self { chromium_path }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>> {
        let path = match &self.chromium_path {
            Some(p) => p.clone(),
            None => find_chromium().context(format!(
                "Chromium not found. Install Chrome/Chromium or set {CHROMIUM_PATH_ENV}."
            ))?,
        };
        Ok(Box::new(ChromiumRenderer::launch(path).await?))
    }
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance from the given binary.
    pub async fn launch(chrome_path: PathBuf) -> Result<Self> {
        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1920, 1080)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drive the CDP connection until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::debug!("Chromium launched");

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await;
        let _ = browser.wait().await;
        self.handler.abort();
        closed.context("failed to close Chromium")?;
        tracing::debug!("Chromium shut down");
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumContext {
    /// Execute JavaScript in the page context and return the result.
    pub async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    /// Execute JavaScript for its side effects only.
    async fn run_js(&self, script: &str) -> Result<()> {
        self.page
            .evaluate(script)
            .await
            .context("JS execution failed")?;
        Ok(())
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => {
                // Wait for the load to finish, bounded by what is left of the budget
                let left = Duration::from_millis(timeout_ms).saturating_sub(start.elapsed());
                let _ = tokio::time::timeout(left, self.page.wait_for_navigation()).await;

                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms: start.elapsed().as_millis() as u64,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn go_back(&mut self, timeout_ms: u64) -> Result<()> {
        self.run_js("window.history.back()")
            .await
            .context("history.back failed")?;
        // history.back() resolves before the navigation it schedules
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.wait_for_navigation(),
        )
        .await;
        Ok(())
    }

    async fn get_html(&self) -> Result<String> {
        let html = self.execute_js("document.documentElement.outerHTML").await?;
        html.as_str()
            .map(str::to_string)
            .context("page HTML was not a string")
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .unwrap_or_default();
        Ok(url)
    }

    async fn probe(&self, locator: &Locator) -> Result<ControlState> {
        let value = self
            .execute_js(&locate_script(locator, PROBE_ACTION))
            .await?;
        serde_json::from_value(value).context("unexpected probe result")
    }

    async fn click(&mut self, locator: &Locator) -> Result<bool> {
        let value = self
            .execute_js(&locate_script(locator, CLICK_ACTION))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn wait_for_settle(&mut self, timeout_ms: u64) -> Result<()> {
        let _ = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.wait_for_navigation(),
        )
        .await;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        let v = self.execute_js("document.body.scrollHeight").await?;
        v.as_u64()
            .or_else(|| v.as_f64().map(|f| f.max(0.0) as u64))
            .context("scrollHeight was not a number")
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.run_js("window.scrollTo(0, document.body.scrollHeight)")
            .await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

const PROBE_ACTION: &str = r#"
  if (!el) return matched ? 'hidden' : 'missing';
  return disabled(el) ? 'disabled' : 'ready';"#;

const CLICK_ACTION: &str = r#"
  if (!el || disabled(el)) return false;
  el.scrollIntoView({ block: 'center' });
  el.click();
  return true;"#;

/// Build an in-page script resolving `locator` with the same rules as
/// [`Locator::visible_in`], then running `action` over `el` (the control,
/// or `null`) and `matched` (whether anything matched at all).
fn locate_script(locator: &Locator, action: &str) -> String {
    let targets = locator.script_targets();
    format!(
        r#"(() => {{
  const targets = {targets};
  const visible = (el) => {{
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 || rect.height > 0;
  }};
  const disabled = (el) => el.disabled === true
    || el.hasAttribute('disabled')
    || el.getAttribute('aria-disabled') === 'true'
    || el.classList.contains('disabled');
  let el = null;
  let matched = false;
  for (const t of targets) {{
    let found;
    try {{ found = Array.from(document.querySelectorAll(t.css)); }} catch (e) {{ continue; }}
    if (t.text !== null) {{
      found = found.filter((e) => (e.textContent || '').replace(/\s+/g, ' ').toLowerCase().includes(t.text));
    }}
    if (found.length) matched = true;
    el = found.find(visible) || null;
    if (el) break;
  }}
{action}
}})()"#
    )
}
