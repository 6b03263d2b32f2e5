// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shallow (name, website) extraction from listing cards.

use super::{host_of, is_absolute_http};
use crate::locator::element_text;
use crate::profile::SiteProfile;
use crate::types::{is_valid_name, CompanyRecord};
use scraper::{ElementRef, Html};
use tracing::debug;

/// Extract one shallow record per card on a listing page snapshot.
///
/// Cards are independent: a card without a usable name is skipped without
/// affecting the others. Websites that are not absolute `http(s)` URLs
/// (relative paths, `javascript:` links) are dropped.
pub fn extract_cards(html: &str, page_url: &str, profile: &SiteProfile) -> Vec<CompanyRecord> {
    let doc = Html::parse_document(html);
    let source = host_of(page_url).unwrap_or_default();
    let cards = profile.card.select_in(&doc);
    debug!("found {} potential company cards", cards.len());

    cards
        .into_iter()
        .enumerate()
        .filter_map(|(i, card)| {
            let record = extract_card(card, profile, &source, page_url);
            if record.is_none() {
                debug!("skipping card {i}: no usable name");
            }
            record
        })
        .collect()
}

fn extract_card(
    card: ElementRef<'_>,
    profile: &SiteProfile,
    source: &str,
    page_url: &str,
) -> Option<CompanyRecord> {
    let name = profile.name.first(card).map(element_text)?;
    if !is_valid_name(&name) {
        return None;
    }
    let website = profile
        .website
        .first(card)
        .and_then(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_absolute_http(href))
        .map(str::to_string);

    debug!("extracted card: {name} | {website:?}");
    Some(CompanyRecord {
        name,
        website,
        source: source.to_string(),
        source_url: page_url.to_string(),
        ..Default::default()
    })
}
