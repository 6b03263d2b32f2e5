// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Advance a listing by one step with a resolved strategy.
//!
//! Exhaustion and failure collapse into the same `false`: the crawl loop
//! only needs to know whether there is more listing to read.

use super::detect::{load_more_controls, next_controls};
use super::Pagination;
use crate::locator::Locator;
use crate::profile::SiteProfile;
use crate::renderer::{ControlState, RenderContext};
use crate::settings::{pause, CrawlSettings};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Move the listing forward. `true` means there is new listing content.
pub async fn advance(
    ctx: &mut dyn RenderContext,
    strategy: Pagination,
    profile: &SiteProfile,
    settings: &CrawlSettings,
) -> bool {
    let result = match strategy {
        Pagination::ClickButton => click_next(ctx, profile, settings).await,
        Pagination::LoadMore => click_load_more(ctx, settings).await,
        Pagination::InfiniteScroll => scroll(ctx, settings).await,
        Pagination::UrlPattern => follow_url_pattern(ctx, settings).await,
    };
    match result {
        Ok(moved) => moved,
        Err(e) => {
            warn!("{strategy} pagination failed, treating as last page: {e:#}");
            false
        }
    }
}

async fn click_next(
    ctx: &mut dyn RenderContext,
    profile: &SiteProfile,
    settings: &CrawlSettings,
) -> Result<bool> {
    let candidates: Vec<&Locator> = match &profile.next {
        Some(next) => vec![next],
        None => next_controls().iter().collect(),
    };

    for control in candidates {
        match ctx.probe(control).await? {
            ControlState::Missing | ControlState::Hidden => continue,
            ControlState::Ready => {
                if !ctx.click(control).await? {
                    return Ok(false);
                }
                ctx.wait_for_settle(settings.settle_timeout_ms).await?;
                info!("clicked next control: {control}");
                return Ok(true);
            }
            ControlState::Disabled => {
                info!("next control is disabled: {control}");
                return Ok(false);
            }
        }
    }
    info!("no next control found");
    Ok(false)
}

async fn click_load_more(ctx: &mut dyn RenderContext, settings: &CrawlSettings) -> Result<bool> {
    for control in load_more_controls() {
        if ctx.probe(control).await? != ControlState::Ready {
            continue;
        }
        if ctx.click(control).await? {
            pause(settings.load_more_settle).await;
            info!("clicked load-more control: {control}");
            return Ok(true);
        }
    }
    Ok(false)
}

async fn scroll(ctx: &mut dyn RenderContext, settings: &CrawlSettings) -> Result<bool> {
    let before = ctx.scroll_height().await?;
    ctx.scroll_to_bottom().await?;
    pause(settings.scroll_settle).await;
    let after = ctx.scroll_height().await?;

    if after > before {
        info!("scrolled: {before} -> {after}");
        Ok(true)
    } else {
        info!("reached end of infinite scroll");
        Ok(false)
    }
}

async fn follow_url_pattern(ctx: &mut dyn RenderContext, settings: &CrawlSettings) -> Result<bool> {
    let current = ctx.get_url().await?;
    let Some(next) = next_page_url(&current) else {
        info!("no page-number pattern in {current}");
        return Ok(false);
    };
    ctx.navigate(&next, settings.detail_timeout_ms).await?;
    info!("URL pagination: {next}");
    Ok(true)
}

fn page_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"/page/(\d+)").expect("path page regex is valid"),
            Regex::new(r"\?page=(\d+)").expect("query page regex is valid"),
            Regex::new(r"&page=(\d+)").expect("param page regex is valid"),
        ]
    })
}

/// The URL of the following page, by page-number pattern.
///
/// `/page/N`, `?page=N` and `&page=N` are incremented in place. A URL with
/// none of them gets `/page/2` appended to its path as a first attempt.
pub fn next_page_url(current: &str) -> Option<String> {
    for re in page_patterns() {
        let Some(caps) = re.captures(current) else {
            continue;
        };
        let (Some(whole), Some(num)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let n: u64 = num.as_str().parse().ok()?;
        let replaced = format!(
            "{}{}",
            &whole.as_str()[..num.start() - whole.start()],
            n + 1
        );
        return Some(format!(
            "{}{}{}",
            &current[..whole.start()],
            replaced,
            &current[whole.end()..]
        ));
    }

    if current.contains("/page/") {
        return None;
    }

    let mut url = url::Url::parse(current).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }
    let path = format!("{}/page/2", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Some(url.to_string())
}
