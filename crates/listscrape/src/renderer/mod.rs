// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Renderer abstraction for browser-based page control.
//!
//! Defines the `BrowserLauncher`, `Renderer` and `RenderContext` traits that
//! abstract over the browser engine (Chromium via chromiumoxide, or the
//! in-memory fixture renderer used by tests).

pub mod chromium;
pub mod fixture;

use crate::locator::Locator;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::locator::ControlState;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Starts a fresh browser for one job.
///
/// Jobs never share a browser: the click-through crawl depends on the
/// navigation history of a single tab.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Renderer>>;
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab).
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Go back one entry in the tab's history.
    async fn go_back(&mut self, timeout_ms: u64) -> Result<()>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Interaction state of the first visible element the locator matches.
    async fn probe(&self, locator: &Locator) -> Result<ControlState>;
    /// Click the first visible, enabled match. `Ok(false)` when there is none.
    async fn click(&mut self, locator: &Locator) -> Result<bool>;
    /// Wait for in-flight navigation or network activity to finish.
    async fn wait_for_settle(&mut self, timeout_ms: u64) -> Result<()>;
    /// Current document scroll height in pixels.
    async fn scroll_height(&self) -> Result<u64>;
    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<()>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}
