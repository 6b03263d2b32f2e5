// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Harvest links from listing cards to per-company detail pages.

use crate::locator::{self, Locator};
use crate::profile::SiteProfile;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// Detail-page link candidates inside a card, most specific first.
///
/// Path-qualified internal links are preferred over whatever link a card
/// happens to contain first, which is often the outbound website.
const DETAIL_LINK_PATTERNS: &[&str] = &[
    r#"a[href*="/company/"]"#,
    r#"a[href*="/companies/"]"#,
    r#"a[href*="/startup/"]"#,
    r#"a[href*="/profile/"]"#,
    "a.company-link",
    "a.startup-link",
    "a[href]",
];

fn detail_link_chain() -> &'static [Locator] {
    static CHAIN: OnceLock<Vec<Locator>> = OnceLock::new();
    CHAIN.get_or_init(|| locator::chain(DETAIL_LINK_PATTERNS))
}

/// Detail-page URLs found in the cards of a listing page snapshot.
///
/// Links are resolved against `page_url`, stripped of fragments, and kept
/// only when their host is exactly the listing page's host. The result is deduplicated but
/// not checked against anything visited earlier in the job.
pub fn harvest_links(html: &str, page_url: &str, profile: &SiteProfile) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        debug!("cannot harvest links: unparseable page URL {page_url}");
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    let mut links: Vec<String> = Vec::new();

    for card in profile.card.select_in(&doc) {
        match card_link(card, &base) {
            Some(link) if !links.contains(&link) => links.push(link),
            Some(_) => {}
            None => debug!("card without an internal detail link"),
        }
    }
    links
}

fn card_link(card: ElementRef<'_>, base: &Url) -> Option<String> {
    detail_link_chain().iter().find_map(|locator| {
        let href = locator.first(card)?.value().attr("href")?;
        resolve_internal(href, base)
    })
}

/// Resolve `href` against the page and keep it only if it stays on the
/// page's host. `www.` variants count as other hosts so one company cannot
/// be harvested under two URLs.
pub fn resolve_internal(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let on_site = match (url.host_str(), base.host_str()) {
        (Some(link_host), Some(page_host)) => link_host.eq_ignore_ascii_case(page_host),
        (None, _) => true,
        (Some(_), None) => false,
    };
    if !on_site {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileRegistry;

    const PAGE: &str = "https://www.dir.example/startups?page=1";

    fn harvest(html: &str) -> Vec<String> {
        let reg = ProfileRegistry::builtin();
        harvest_links(html, PAGE, reg.resolve(PAGE))
    }

    #[test]
    fn test_prefers_detail_paths_over_outbound_website() {
        let html = r#"<html><body>
            <article>
              <h2>Acme</h2>
              <a href="https://acme.io">Website</a>
              <a href="/company/acme">Details</a>
            </article>
        </body></html>"#;
        assert_eq!(harvest(html), ["https://www.dir.example/company/acme"]);
    }

    #[test]
    fn test_external_only_card_yields_nothing() {
        let html = r#"<html><body>
            <article><h2>Acme</h2><a href="https://acme.io">Website</a></article>
        </body></html>"#;
        assert!(harvest(html).is_empty());
    }

    #[test]
    fn test_relative_links_resolve_and_dedupe() {
        let html = r#"<html><body>
            <article><a href="/startup/zed#team">Zed</a></article>
            <article><a href="profile/9">Nine</a></article>
            <article><a href="/startup/zed">Zed again</a></article>
        </body></html>"#;
        assert_eq!(
            harvest(html),
            [
                "https://www.dir.example/startup/zed",
                "https://www.dir.example/profile/9",
            ]
        );
    }

    #[test]
    fn test_bare_domain_variant_is_not_harvested_twice() {
        let html = r#"<html><body>
            <article><a href="https://www.dir.example/startup/zed">Zed</a></article>
            <article><a href="https://dir.example/startup/zed">Zed</a></article>
            <article><a href="https://WWW.DIR.EXAMPLE/startup/ada">Ada</a></article>
        </body></html>"#;
        assert_eq!(
            harvest(html),
            [
                "https://www.dir.example/startup/zed",
                "https://www.dir.example/startup/ada",
            ]
        );
    }

    #[test]
    fn test_falls_through_to_any_internal_link() {
        let html = r#"<html><body>
            <article><a href="https://elsewhere.example/company/x">x</a><a href="/c/42">42</a></article>
        </body></html>"#;
        // Off-site /company/ link rejected; the bare fallback only takes the card's first link
        assert_eq!(harvest(html), Vec::<String>::new());

        let html = r#"<html><body>
            <article><a href="/c/42">42</a></article>
        </body></html>"#;
        assert_eq!(harvest(html), ["https://www.dir.example/c/42"]);
    }

    #[test]
    fn test_skips_non_navigational_hrefs() {
        let base = Url::parse(PAGE).unwrap();
        assert_eq!(resolve_internal("#top", &base), None);
        assert_eq!(resolve_internal("javascript:void(0)", &base), None);
        assert_eq!(resolve_internal("mailto:a@dir.example", &base), None);
        assert_eq!(
            resolve_internal("../about", &base).as_deref(),
            Some("https://www.dir.example/about")
        );
    }
}
