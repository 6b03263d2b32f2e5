// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory renderer serving static HTML pages.
//!
//! Used by tests and dry runs to drive the crawl without a browser. Each page
//! is a fixed HTML document plus an optional queue of "expansions": chunks of
//! markup appended before `</body>` when a non-link control is clicked or the
//! page is scrolled to the bottom, which is how load-more and infinite-scroll
//! listings are modelled. Clicking a control with an `href` (or `data-href`)
//! navigates, pushing onto the tab's history like a real browser.

use super::{BrowserLauncher, ControlState, NavigationResult, RenderContext, Renderer};
use crate::locator::{is_disabled, Locator};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use scraper::Html;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct FixturePage {
    html: String,
    expansions: Vec<String>,
}

/// A set of pages keyed by absolute URL, plus a log of navigations.
#[derive(Debug, Default)]
pub struct FixtureSite {
    pages: HashMap<String, FixturePage>,
    navigations: Mutex<Vec<String>>,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static page.
    pub fn page(self, url: &str, html: impl Into<String>) -> Self {
        self.expandable_page(url, html, Vec::<String>::new())
    }

    /// Add a page whose content grows on load-more clicks or scrolling.
    pub fn expandable_page(
        mut self,
        url: &str,
        html: impl Into<String>,
        expansions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.pages.insert(
            normalize(url),
            FixturePage {
                html: html.into(),
                expansions: expansions.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Every URL navigated to so far, in order (history moves excluded).
    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// How many times `url` was navigated to.
    pub fn visit_count(&self, url: &str) -> usize {
        let key = normalize(url);
        self.navigations().iter().filter(|u| **u == key).count()
    }

    fn load(&self, url: &str) -> Result<LoadedPage> {
        let key = normalize(url);
        if let Ok(mut log) = self.navigations.lock() {
            log.push(key.clone());
        }
        let page = self
            .pages
            .get(&key)
            .with_context(|| format!("404: no fixture page for {key}"))?;
        Ok(LoadedPage {
            url: key,
            html: page.html.clone(),
            pending: page.expansions.iter().cloned().collect(),
        })
    }
}

/// Launches [`FixtureRenderer`]s over a shared site and counts lifecycles.
#[derive(Debug, Clone)]
pub struct FixtureLauncher {
    site: Arc<FixtureSite>,
    stats: Arc<LifecycleStats>,
    fail_launch: bool,
}

#[derive(Debug, Default)]
struct LifecycleStats {
    launches: AtomicUsize,
    shutdowns: AtomicUsize,
    open_contexts: Arc<AtomicUsize>,
}

impl FixtureLauncher {
    pub fn new(site: FixtureSite) -> Self {
        Self {
            site: Arc::new(site),
            stats: Arc::new(LifecycleStats::default()),
            fail_launch: false,
        }
    }

    /// A launcher whose every launch fails, like a missing browser binary.
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(FixtureSite::new())
        }
    }

    pub fn site(&self) -> &FixtureSite {
        &self.site
    }

    pub fn launches(&self) -> usize {
        self.stats.launches.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.stats.shutdowns.load(Ordering::SeqCst)
    }

    pub fn open_contexts(&self) -> usize {
        self.stats.open_contexts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FixtureLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>> {
        if self.fail_launch {
            bail!("fixture browser unavailable");
        }
        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureRenderer {
            site: Arc::clone(&self.site),
            stats: Arc::clone(&self.stats),
        }))
    }
}

/// Renderer over a [`FixtureSite`].
pub struct FixtureRenderer {
    site: Arc<FixtureSite>,
    stats: Arc<LifecycleStats>,
}

impl FixtureRenderer {
    /// A standalone renderer, for driving a context directly.
    pub fn new(site: Arc<FixtureSite>) -> Self {
        Self {
            site,
            stats: Arc::new(LifecycleStats::default()),
        }
    }

    /// Open a concrete context without boxing.
    pub fn context(&self) -> FixtureContext {
        self.stats.open_contexts.fetch_add(1, Ordering::SeqCst);
        FixtureContext {
            site: Arc::clone(&self.site),
            history: Vec::new(),
            open_contexts: Arc::clone(&self.stats.open_contexts),
        }
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Ok(Box::new(self.context()))
    }

    async fn shutdown(&self) -> Result<()> {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.stats.open_contexts.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    html: String,
    pending: VecDeque<String>,
}

impl LoadedPage {
    fn expand(&mut self) -> bool {
        let Some(chunk) = self.pending.pop_front() else {
            return false;
        };
        match self.html.rfind("</body>") {
            Some(idx) => self.html.insert_str(idx, &chunk),
            None => self.html.push_str(&chunk),
        }
        true
    }
}

/// One tab over a fixture site.
pub struct FixtureContext {
    site: Arc<FixtureSite>,
    history: Vec<LoadedPage>,
    open_contexts: Arc<AtomicUsize>,
}

/// What clicking the first visible match does.
enum ClickEffect {
    None,
    Navigate(String),
    Expand,
}

impl FixtureContext {
    fn current(&self) -> Option<&LoadedPage> {
        self.history.last()
    }

    fn current_mut(&mut self) -> Option<&mut LoadedPage> {
        self.history.last_mut()
    }

    fn click_effect(&self, locator: &Locator) -> ClickEffect {
        let Some(page) = self.current() else {
            return ClickEffect::None;
        };
        let doc = Html::parse_document(&page.html);
        let Some(el) = locator.visible_in(&doc) else {
            return ClickEffect::None;
        };
        if is_disabled(el) {
            return ClickEffect::None;
        }
        let href = el
            .value()
            .attr("href")
            .or_else(|| el.value().attr("data-href"))
            .map(str::trim)
            .filter(|h| !h.is_empty() && !h.starts_with('#') && !h.starts_with("javascript:"));
        match href {
            Some(h) => {
                let target = url::Url::parse(&page.url)
                    .and_then(|base| base.join(h))
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| h.to_string());
                ClickEffect::Navigate(target)
            }
            None => ClickEffect::Expand,
        }
    }
}

#[async_trait]
impl RenderContext for FixtureContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        let page = self.site.load(url)?;
        let final_url = page.url.clone();
        self.history.push(page);
        Ok(NavigationResult {
            final_url,
            load_time_ms: 0,
        })
    }

    async fn go_back(&mut self, _timeout_ms: u64) -> Result<()> {
        if self.history.len() < 2 {
            bail!("no history entry to go back to");
        }
        self.history.pop();
        Ok(())
    }

    async fn get_html(&self) -> Result<String> {
        Ok(self.current().map(|p| p.html.clone()).unwrap_or_default())
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self
            .current()
            .map(|p| p.url.clone())
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn probe(&self, locator: &Locator) -> Result<ControlState> {
        Ok(match self.current() {
            Some(page) => locator.state_in(&Html::parse_document(&page.html)),
            None => ControlState::Missing,
        })
    }

    async fn click(&mut self, locator: &Locator) -> Result<bool> {
        match self.click_effect(locator) {
            ClickEffect::None => Ok(false),
            ClickEffect::Navigate(url) => {
                self.navigate(&url, 0).await?;
                Ok(true)
            }
            ClickEffect::Expand => {
                if let Some(page) = self.current_mut() {
                    page.expand();
                }
                Ok(true)
            }
        }
    }

    async fn wait_for_settle(&mut self, _timeout_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        Ok(self.current().map(|p| p.html.len() as u64).unwrap_or(0))
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        if let Some(page) = self.current_mut() {
            page.expand();
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.open_contexts.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Canonical form used as the page key: parsed, fragment dropped.
fn normalize(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut u) => {
            u.set_fragment(None);
            u.to_string()
        }
        Err(_) => url.to_string(),
    }
}
