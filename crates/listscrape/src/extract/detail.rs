// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deep extraction from a single company detail page.

use super::contact::{find_emails, find_phones, find_social_links};
use super::{first_href, first_text, host_of, is_absolute_http, same_site, truncate_chars};
use crate::locator::{self, Locator};
use crate::renderer::RenderContext;
use crate::settings::{pause, CrawlSettings};
use crate::types::{is_valid_name, CompanyRecord};
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const MIN_DESCRIPTION_CHARS: usize = 50;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MIN_ADDRESS_CHARS: usize = 5;
pub const MAX_ADDRESS_CHARS: usize = 200;

const NAME_PATTERNS: &[&str] = &[
    "h1",
    "h2.company-name",
    r#"[class*="company-name"]"#,
    r#"[class*="CompanyName"]"#,
    "h2",
    "h3",
];

const WEBSITE_PATTERNS: &[&str] = &[
    r#"a:has-text("Website")"#,
    "a.website",
    r#"a[class*="website"]"#,
    r#"a:has-text("Visit")"#,
    r#"a[href*="http"]"#,
];

const DESCRIPTION_PATTERNS: &[&str] = &[
    ".description",
    r#"[class*="description"]"#,
    "p.about",
    ".bio",
    "p",
    ".content",
];

const ADDRESS_PATTERNS: &[&str] = &[
    "address",
    r#"[itemprop="address"]"#,
    r#"[class*="address"]"#,
    r#"[class*="location"]"#,
];

/// Hosts whose links are profiles elsewhere, never the company's own site.
const SOCIAL_HOSTS: &[&str] = &[
    "linkedin.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
];

struct Chains {
    name: Vec<Locator>,
    website: Vec<Locator>,
    description: Vec<Locator>,
    address: Vec<Locator>,
}

fn chains() -> &'static Chains {
    static CHAINS: OnceLock<Chains> = OnceLock::new();
    CHAINS.get_or_init(|| Chains {
        name: locator::chain(NAME_PATTERNS),
        website: locator::chain(WEBSITE_PATTERNS),
        description: locator::chain(DESCRIPTION_PATTERNS),
        address: locator::chain(ADDRESS_PATTERNS),
    })
}

fn mailto_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse(r#"a[href^="mailto:"]"#).expect("mailto selector is valid"))
}

/// Navigate to a detail page and extract a record from it.
///
/// `source` is the host of the listing the link was harvested from.
/// `None` covers every per-company failure: navigation errors, an
/// unreadable page, or a page without a usable name. The caller skips the
/// company and carries on.
pub async fn extract_details(
    ctx: &mut dyn RenderContext,
    url: &str,
    source: &str,
    settings: &CrawlSettings,
) -> Option<CompanyRecord> {
    if let Err(e) = ctx.navigate(url, settings.detail_timeout_ms).await {
        warn!("skipping {url}: {e:#}");
        return None;
    }
    pause(settings.detail_settle).await;

    let html = match ctx.get_html().await {
        Ok(html) => html,
        Err(e) => {
            warn!("skipping {url}: could not read page: {e:#}");
            return None;
        }
    };
    let record = parse_detail(&html, url, source);
    if !record.is_valid() {
        warn!("skipping {url}: no usable company name");
        return None;
    }
    debug!("extracted {} from {url}", record.name);
    Some(record)
}

/// Extract a record from a detail page snapshot.
///
/// Always returns a record; callers check [`CompanyRecord::is_valid`].
pub fn parse_detail(html: &str, url: &str, source: &str) -> CompanyRecord {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let chains = chains();
    let page_host = host_of(url).unwrap_or_default();

    let name = first_text(root, &chains.name, 1)
        .filter(|n| is_valid_name(n))
        .unwrap_or_default();

    let website = first_href(root, &chains.website, |href| {
        is_company_site(href, &page_host)
    });

    let description = first_text(root, &chains.description, MIN_DESCRIPTION_CHARS)
        .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS));

    let address = first_text(root, &chains.address, MIN_ADDRESS_CHARS)
        .map(|a| truncate_chars(&a, MAX_ADDRESS_CHARS));

    let text = locator::element_text(root);
    let mailtos: Vec<String> = doc
        .select(mailto_selector())
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| href.strip_prefix("mailto:"))
        .map(|addr| addr.split('?').next().unwrap_or_default().to_string())
        .collect();
    let emails = find_emails(
        std::iter::once(text.as_str()).chain(mailtos.iter().map(String::as_str)),
    );

    CompanyRecord {
        name,
        website,
        description,
        emails,
        phones: find_phones(&text),
        address,
        social_links: find_social_links(html),
        source: source.to_string(),
        source_url: url.to_string(),
    }
}

fn is_company_site(href: &str, page_host: &str) -> bool {
    if !is_absolute_http(href) {
        return false;
    }
    let Some(host) = host_of(href) else {
        return false;
    };
    let social = SOCIAL_HOSTS
        .iter()
        .any(|s| host == *s || host.ends_with(&format!(".{s}")));
    !social && !same_site(&host, page_host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixture::{FixtureRenderer, FixtureSite};
    use crate::types::SocialPlatform;
    use std::sync::Arc;

    const URL: &str = "https://www.dir.example/company/acme";
    const SOURCE: &str = "dir.example";

    fn page(body: &str) -> String {
        format!("<html><body>{body}</body></html>")
    }

    #[test]
    fn test_full_detail_page() {
        let html = page(
            r#"
            <nav><a href="/">Home</a></nav>
            <h1>Acme Robotics</h1>
            <a href="https://www.linkedin.com/company/acme-robotics">LinkedIn</a>
            <a href="https://acme.io" class="btn">Visit Website</a>
            <div class="company-description">Acme builds warehouse robots that pick, pack and ship orders around the clock.</div>
            <address>1 Market St, San Francisco</address>
            <p>Reach us at hello@acme.io or +1 (415) 555-0100.</p>
            <a href="mailto:sales@acme.io?subject=Hi">Email sales</a>
        "#,
        );
        let rec = parse_detail(&html, URL, SOURCE);
        assert_eq!(rec.name, "Acme Robotics");
        assert_eq!(rec.website.as_deref(), Some("https://acme.io"));
        assert!(rec
            .description
            .as_deref()
            .is_some_and(|d| d.starts_with("Acme builds warehouse robots")));
        assert_eq!(rec.address.as_deref(), Some("1 Market St, San Francisco"));
        assert_eq!(rec.emails, ["hello@acme.io", "sales@acme.io"]);
        assert_eq!(rec.phones, ["+1 (415) 555-0100"]);
        assert!(rec.social_links.contains_key(&SocialPlatform::Linkedin));
        assert_eq!(rec.source, SOURCE);
        assert_eq!(rec.source_url, URL);
    }

    #[test]
    fn test_description_truncated_to_500() {
        let long = "a".repeat(2000);
        let rec = parse_detail(
            &page(&format!(r#"<h1>Acme</h1><div class="description">{long}</div>"#)),
            URL,
            SOURCE,
        );
        assert_eq!(rec.description.map(|d| d.chars().count()), Some(500));
    }

    #[test]
    fn test_short_description_falls_through() {
        let html = page(
            r#"<h1>Acme</h1><div class="description">Too short.</div>
               <p>This paragraph is long enough to count as a proper company description.</p>"#,
        );
        let rec = parse_detail(&html, URL, SOURCE);
        assert!(rec
            .description
            .as_deref()
            .is_some_and(|d| d.starts_with("This paragraph")));
    }

    #[test]
    fn test_website_skips_social_and_own_host() {
        let html = page(
            r#"<h1>Acme</h1>
               <a href="https://twitter.com/acme">Website</a>
               <a href="https://dir.example/about">Visit us</a>
               <a href="/relative">link</a>
               <a href="https://acme.io/">home</a>"#,
        );
        assert_eq!(
            parse_detail(&html, URL, SOURCE).website.as_deref(),
            Some("https://acme.io/")
        );
    }

    #[test]
    fn test_address_length_bounds() {
        let long = format!("{} Industrial Park", "9".repeat(300));
        let rec = parse_detail(&page(&format!("<h1>Acme</h1><address>{long}</address>")), URL, SOURCE);
        assert_eq!(rec.address.map(|a| a.chars().count()), Some(MAX_ADDRESS_CHARS));

        // four characters is too short; the next locator in the chain is tried
        let html = page(r#"<h1>Acme</h1><address>Oslo</address><span class="location">Paris</span>"#);
        assert_eq!(parse_detail(&html, URL, SOURCE).address.as_deref(), Some("Paris"));

        let html = page(r#"<h1>Acme</h1><address>NY</address>"#);
        assert_eq!(parse_detail(&html, URL, SOURCE).address, None);
    }

    #[test]
    fn test_instagram_profile_link() {
        let html = page(
            r#"<h1>Acme</h1>
               <a href="https://www.instagram.com/acme.robotics">Instagram</a>
               <a href="https://www.instagram.com/acme_other">Other</a>"#,
        );
        let rec = parse_detail(&html, URL, SOURCE);
        assert_eq!(
            rec.social_links.get(&SocialPlatform::Instagram).map(String::as_str),
            Some("https://www.instagram.com/acme.robotics")
        );
        assert_eq!(rec.social_links.len(), 1);
    }

    #[test]
    fn test_invalid_name_is_empty() {
        let rec = parse_detail(&page("<h1>AB</h1>"), URL, SOURCE);
        assert!(rec.name.is_empty());
        assert!(!rec.is_valid());
    }

    #[tokio::test]
    async fn test_extract_details_navigation_failure_is_none() {
        let site = FixtureSite::new().page(URL, page("<h1>Acme Robotics</h1>"));
        let renderer = FixtureRenderer::new(Arc::new(site));
        let mut ctx = renderer.context();
        let s = CrawlSettings::immediate();

        let rec = extract_details(&mut ctx, URL, SOURCE, &s).await.unwrap();
        assert_eq!(rec.name, "Acme Robotics");
        assert_eq!(rec.source, SOURCE);
        assert!(extract_details(&mut ctx, "https://www.dir.example/company/gone", SOURCE, &s)
            .await
            .is_none());
    }
}
