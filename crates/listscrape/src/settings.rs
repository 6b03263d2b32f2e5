// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Timeouts and settle delays for one crawl.

use std::time::Duration;

/// Every wait the crawl performs, in one place.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Initial navigation to the target listing page.
    pub navigation_timeout_ms: u64,
    /// Navigation to a single detail page (and listing restoration).
    pub detail_timeout_ms: u64,
    /// Upper bound when waiting for the network to settle after a click.
    pub settle_timeout_ms: u64,
    /// Per-pattern visibility probe while dismissing popups.
    pub popup_probe_timeout: Duration,
    /// Pause after a popup was dismissed.
    pub popup_settle: Duration,
    /// Pause after a detail page was loaded, before reading it.
    pub detail_settle: Duration,
    /// Pause after returning to the listing page.
    pub back_settle: Duration,
    /// Pause after a successful pagination step.
    pub page_settle: Duration,
    /// Pause after clicking a load-more control.
    pub load_more_settle: Duration,
    /// Pause between scrolling and re-measuring page height.
    pub scroll_settle: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 30_000,
            detail_timeout_ms: 15_000,
            settle_timeout_ms: 10_000,
            popup_probe_timeout: Duration::from_millis(2_000),
            popup_settle: Duration::from_millis(500),
            detail_settle: Duration::from_millis(1_000),
            back_settle: Duration::from_millis(500),
            page_settle: Duration::from_millis(2_000),
            load_more_settle: Duration::from_millis(2_000),
            scroll_settle: Duration::from_millis(2_000),
        }
    }
}

impl CrawlSettings {
    /// No settle delays and short timeouts. Meant for in-memory renderers.
    pub fn immediate() -> Self {
        Self {
            navigation_timeout_ms: 1_000,
            detail_timeout_ms: 1_000,
            settle_timeout_ms: 100,
            popup_probe_timeout: Duration::from_millis(100),
            popup_settle: Duration::ZERO,
            detail_settle: Duration::ZERO,
            back_settle: Duration::ZERO,
            page_settle: Duration::ZERO,
            load_more_settle: Duration::ZERO,
            scroll_settle: Duration::ZERO,
        }
    }
}

/// Sleep unless the duration is zero.
pub(crate) async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}
