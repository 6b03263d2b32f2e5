// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data types shared by the extractors and the crawl loop.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum number of characters a company name needs to be kept.
pub const MIN_NAME_CHARS: usize = 3;

/// A company extracted from a listing card or a detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    /// Absolute `http(s)` URL of the company's own site.
    #[serde(default)]
    pub website: Option<String>,
    /// At most 500 characters.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// One URL per platform.
    #[serde(default)]
    pub social_links: BTreeMap<SocialPlatform, String>,
    /// Host of the listing site the record was found on.
    pub source: String,
    /// Detail page URL (click-through mode) or listing page URL (cards mode).
    pub source_url: String,
}

impl CompanyRecord {
    /// A record is emitted only when its name passes the length filter.
    pub fn is_valid(&self) -> bool {
        is_valid_name(&self.name)
    }
}

/// Check a trimmed name against the length filter.
pub fn is_valid_name(name: &str) -> bool {
    name.trim().chars().count() >= MIN_NAME_CHARS
}

/// Social networks recognised in detail page markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Linkedin,
    Twitter,
    Facebook,
    Instagram,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 4] = [
        Self::Linkedin,
        Self::Twitter,
        Self::Facebook,
        Self::Instagram,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
        }
    }
}

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The company budget was reached.
    MaxCompanies,
    /// The page budget was reached.
    MaxPages,
    /// Pagination reported no further content (or failed).
    Exhausted,
}

/// Terminal output of one crawl job.
///
/// Returned even when the crawl stopped early; there is no distinction
/// between a finished and a truncated crawl beyond `stop_reason`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub companies: Vec<CompanyRecord>,
    pub pages_scraped: u32,
    pub total_count: usize,
    pub stop_reason: StopReason,
    /// Resolved pagination strategy the crawl ran with.
    pub pagination: crate::pagination::Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_filter() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("AB"));
        assert!(!is_valid_name("  AB  "));
        assert!(is_valid_name("Acme"));
        assert!(is_valid_name("IBM"));
    }

    #[test]
    fn test_social_links_serialize_lowercase() {
        let mut rec = CompanyRecord {
            name: "Acme".into(),
            ..Default::default()
        };
        rec.social_links
            .insert(SocialPlatform::Linkedin, "https://linkedin.com/company/acme".into());
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            v["social_links"]["linkedin"],
            "https://linkedin.com/company/acme"
        );
    }

    #[test]
    fn test_platform_names_match_serde() {
        for p in SocialPlatform::ALL {
            let v = serde_json::to_value(p).unwrap();
            assert_eq!(v.as_str(), Some(p.as_str()));
        }
    }
}
