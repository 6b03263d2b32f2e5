// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTML extractors for listing cards, detail-page links and detail pages.
//!
//! Every extractor here is a synchronous function of an HTML snapshot and
//! the page URL; the async callers fetch the snapshot from the renderer
//! first. Field fallbacks are explicit ordered chains of locators evaluated
//! by [`first_text`] and friends, never nested error handling.

pub mod cards;
pub mod contact;
pub mod detail;
pub mod links;

pub use cards::extract_cards;
pub use detail::{extract_details, parse_detail};
pub use links::harvest_links;

use crate::locator::{element_text, Locator};
use scraper::ElementRef;

/// First non-empty text produced by a chain of locators.
///
/// Each locator contributes only its first match, and the text must be at
/// least `min_chars` characters long to count.
pub fn first_text(scope: ElementRef<'_>, chain: &[Locator], min_chars: usize) -> Option<String> {
    chain.iter().find_map(|locator| {
        let el = locator.first(scope)?;
        let text = element_text(el);
        (!text.is_empty() && text.chars().count() >= min_chars).then_some(text)
    })
}

/// First `href` in a chain of locators that `accept` approves.
///
/// Unlike [`first_text`], every match of a locator is considered before
/// moving to the next one.
pub fn first_href(
    scope: ElementRef<'_>,
    chain: &[Locator],
    mut accept: impl FnMut(&str) -> bool,
) -> Option<String> {
    chain.iter().find_map(|locator| {
        locator
            .select(scope)
            .into_iter()
            .filter_map(|el| el.value().attr("href").map(str::trim))
            .find(|&href| accept(href))
            .map(str::to_string)
    })
}

/// Host of a URL, lower-cased, if it has one.
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

/// Whether two hosts name the same site, ignoring a leading `www.`.
pub fn same_site(a: &str, b: &str) -> bool {
    let strip = |h: &str| h.strip_prefix("www.").unwrap_or(h).to_ascii_lowercase();
    strip(a) == strip(b)
}

/// Whether a string is an absolute `http(s)` URL.
pub fn is_absolute_http(href: &str) -> bool {
    url::Url::parse(href)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Truncate to at most `max` characters, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
