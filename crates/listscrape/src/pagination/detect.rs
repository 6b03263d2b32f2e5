// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resolve a profile's declared strategy into a concrete one.

use super::Pagination;
use crate::locator::{self, Locator};
use crate::profile::SiteProfile;
use crate::renderer::RenderContext;
use scraper::Html;
use std::sync::OnceLock;
use tracing::{info, warn};

pub(crate) const NEXT_PATTERNS: &[&str] = &[
    r#"button:has-text("Next")"#,
    r#"a:has-text("Next")"#,
    r#"a[rel="next"]"#,
    r#"button[aria-label*="Next"]"#,
];

pub(crate) const LOAD_MORE_PATTERNS: &[&str] = &[
    r#"button:has-text("Load More")"#,
    r#"button:has-text("Show More")"#,
    r#"a:has-text("Load More")"#,
];

pub(crate) fn next_controls() -> &'static [Locator] {
    static NEXT: OnceLock<Vec<Locator>> = OnceLock::new();
    NEXT.get_or_init(|| locator::chain(NEXT_PATTERNS))
}

pub(crate) fn load_more_controls() -> &'static [Locator] {
    static MORE: OnceLock<Vec<Locator>> = OnceLock::new();
    MORE.get_or_init(|| locator::chain(LOAD_MORE_PATTERNS))
}

/// Pick a strategy from a listing page snapshot.
///
/// Probe order: a next control, then a load-more control, then fall back to
/// infinite scroll.
pub fn detect_in_html(html: &str) -> Pagination {
    let doc = Html::parse_document(html);
    let present = |controls: &[Locator]| controls.iter().any(|l| !l.select_in(&doc).is_empty());

    if present(next_controls()) {
        Pagination::ClickButton
    } else if present(load_more_controls()) {
        Pagination::LoadMore
    } else {
        Pagination::InfiniteScroll
    }
}

/// Resolve the strategy for this job. Runs once, before the crawl loop.
pub async fn resolve(ctx: &dyn RenderContext, profile: &SiteProfile) -> Pagination {
    if let Some(concrete) = profile.pagination.concrete() {
        info!("pagination: {concrete} (declared by profile {:?})", profile.key);
        return concrete;
    }
    let detected = match ctx.get_html().await {
        Ok(html) => detect_in_html(&html),
        Err(e) => {
            warn!("could not read listing page for pagination detection: {e:#}");
            Pagination::InfiniteScroll
        }
    };
    info!("pagination: {detected} (detected)");
    detected
}
