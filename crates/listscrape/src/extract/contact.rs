// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Regex harvesting of emails, phone numbers and social profile links.

use crate::types::SocialPlatform;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

pub const MAX_EMAILS: usize = 5;
pub const MAX_PHONES: usize = 3;
pub const MIN_PHONE_DIGITS: usize = 10;

/// Substrings marking placeholder or monitoring addresses.
const EMAIL_NOISE: &[&str] = &["example", "test", "dummy", "sentry", "wixpress"];

/// Asset names that look like addresses (`logo@2x.png`).
const ASSET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Path segments that are sharing endpoints rather than profiles.
const SOCIAL_NOISE: &[&str] = &["share", "sharer", "intent", "home", "dialog", "plugins"];

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email regex is valid")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[+(]?[1-9][0-9 .\-()]{8,}[0-9]").expect("phone regex is valid"))
}

fn social_res() -> &'static [(SocialPlatform, Regex)] {
    static RES: OnceLock<Vec<(SocialPlatform, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            (
                SocialPlatform::Linkedin,
                Regex::new(r"https?://(?:[\w-]+\.)?linkedin\.com/company/[\w-]+")
                    .expect("linkedin regex is valid"),
            ),
            (
                SocialPlatform::Twitter,
                Regex::new(r"https?://(?:www\.|mobile\.)?(?:twitter|x)\.com/[\w-]+")
                    .expect("twitter regex is valid"),
            ),
            (
                SocialPlatform::Facebook,
                Regex::new(r"https?://(?:[\w-]+\.)?facebook\.com/[\w.-]+")
                    .expect("facebook regex is valid"),
            ),
            (
                SocialPlatform::Instagram,
                Regex::new(r"https?://(?:www\.)?instagram\.com/[\w.-]+")
                    .expect("instagram regex is valid"),
            ),
        ]
    })
}

/// Email addresses across `texts`, in order of first appearance.
///
/// Deduplicated case-insensitively, placeholder and asset-name lookalikes
/// dropped, capped at [`MAX_EMAILS`].
pub fn find_emails<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for text in texts {
        for m in email_re().find_iter(text) {
            let email = m.as_str().trim_end_matches('.');
            let lower = email.to_ascii_lowercase();
            if EMAIL_NOISE.iter().any(|n| lower.contains(n))
                || ASSET_SUFFIXES.iter().any(|s| lower.ends_with(s))
            {
                continue;
            }
            if seen.insert(lower) {
                out.push(email.to_string());
                if out.len() == MAX_EMAILS {
                    return out;
                }
            }
        }
    }
    out
}

/// Phone-number-like runs in `text` with at least [`MIN_PHONE_DIGITS`] digits.
///
/// Deduplicated by digit sequence, capped at [`MAX_PHONES`].
pub fn find_phones(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in phone_re().find_iter(text) {
        let candidate = m.as_str().trim();
        let digits: String = candidate.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < MIN_PHONE_DIGITS {
            continue;
        }
        if seen.insert(digits) {
            out.push(candidate.to_string());
            if out.len() == MAX_PHONES {
                break;
            }
        }
    }
    out
}

/// First profile URL per platform found in raw markup.
pub fn find_social_links(markup: &str) -> BTreeMap<SocialPlatform, String> {
    let mut out = BTreeMap::new();
    for (platform, re) in social_res() {
        let found = re
            .find_iter(markup)
            .map(|m| m.as_str())
            .find(|url| !is_share_endpoint(url));
        if let Some(url) = found {
            out.insert(*platform, url.to_string());
        }
    }
    out
}

fn is_share_endpoint(url: &str) -> bool {
    let path = url.split_once("://").map_or(url, |(_, rest)| rest);
    path.split('/').skip(1).any(|segment| {
        let stem = segment.split('.').next().unwrap_or_default().to_ascii_lowercase();
        SOCIAL_NOISE.contains(&stem.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_emails_are_dropped() {
        let text = "Write to contact@acme.com or test@example.com for help.";
        assert_eq!(find_emails([text]), ["contact@acme.com"]);
    }

    #[test]
    fn test_emails_dedupe_and_cap() {
        let text = "a@acme.io A@ACME.IO b@acme.io c@acme.io d@acme.io e@acme.io f@acme.io \
                    logo@2x.png errors@o123.ingest.sentry.io";
        let emails = find_emails([text]);
        assert_eq!(emails.len(), MAX_EMAILS);
        assert_eq!(emails[0], "a@acme.io");
        assert!(!emails.iter().any(|e| e.eq_ignore_ascii_case("A@ACME.IO") && e != "a@acme.io"));
        assert!(!emails.iter().any(|e| e.contains("png") || e.contains("sentry")));
    }

    #[test]
    fn test_emails_across_sources() {
        let emails = find_emails(["hello@acme.io", "sales@acme.io", "hello@acme.io"]);
        assert_eq!(emails, ["hello@acme.io", "sales@acme.io"]);
    }

    #[test]
    fn test_short_phone_numbers_are_dropped() {
        assert!(find_phones("Call 555-1234 today").is_empty());
        assert!(find_phones("Ext 555 123 4").is_empty());
        assert_eq!(find_phones("Call +1 (415) 555-0100 today"), ["+1 (415) 555-0100"]);
    }

    #[test]
    fn test_phones_dedupe_by_digits_and_cap() {
        let text = "415-555-0100 | 415.555.0100 | 212 555 0101 | 312 555 0102 | 646 555 0103";
        let phones = find_phones(text);
        assert_eq!(phones.len(), MAX_PHONES);
        assert_eq!(phones[0], "415-555-0100");
        assert_eq!(phones[1], "212 555 0101");
    }

    #[test]
    fn test_social_links_first_per_platform() {
        let markup = r#"
            <a href="https://twitter.com/intent/tweet?text=hi">share</a>
            <a href="https://twitter.com/acmehq">tw</a>
            <a href="https://x.com/acme_other">x</a>
            <a href="https://www.linkedin.com/company/acme-robotics/">li</a>
            <a href="https://www.linkedin.com/in/some-person">person</a>
            <a href="https://www.netflix.com/title/1">not x</a>
        "#;
        let links = find_social_links(markup);
        assert_eq!(
            links.get(&SocialPlatform::Twitter).map(String::as_str),
            Some("https://twitter.com/acmehq")
        );
        assert_eq!(
            links.get(&SocialPlatform::Linkedin).map(String::as_str),
            Some("https://www.linkedin.com/company/acme-robotics")
        );
        assert!(!links.contains_key(&SocialPlatform::Facebook));
    }

    #[test]
    fn test_share_endpoints_are_skipped() {
        let markup = r#"<a href="https://www.facebook.com/sharer.php?u=x">s</a>
                        <a href="https://facebook.com/acme.robotics">fb</a>"#;
        assert_eq!(
            find_social_links(markup)
                .get(&SocialPlatform::Facebook)
                .map(String::as_str),
            Some("https://facebook.com/acme.robotics")
        );
    }
}
