// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Site profile registry.
//!
//! Profiles are data: the built-in table is embedded at compile time from
//! `profiles.json` and extra tables can be layered on top at startup. A
//! profile is picked by case-insensitive substring match of its key against
//! the target host; the `generic` profile catches everything else.

use crate::error::ScrapeError;
use crate::locator::Locator;
use crate::pagination::PaginationStrategy;
use serde::{Deserialize, Serialize};

/// Built-in profile table, embedded so there is no runtime file I/O.
const BUILTIN_PROFILES: &str = include_str!("profiles.json");

/// Key of the fallback profile.
pub const GENERIC_KEY: &str = "generic";

/// How to find companies and paginate on one family of sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Substring matched against the target host.
    pub key: String,
    pub pagination: PaginationStrategy,
    /// One repeated listing card.
    pub card: Locator,
    /// Company name inside a card.
    pub name: Locator,
    /// Outbound website link inside a card.
    pub website: Locator,
    /// Explicit next-page control, when the site has a known one.
    #[serde(default)]
    pub next: Option<Locator>,
}

impl SiteProfile {
    pub fn is_generic(&self) -> bool {
        self.key == GENERIC_KEY
    }
}

/// Ordered set of site profiles plus the generic fallback.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<SiteProfile>,
    generic: SiteProfile,
}

impl ProfileRegistry {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_PROFILES).expect("embedded profiles.json is valid")
    }

    /// Parse a JSON array of profiles. Exactly one entry must be `generic`.
    pub fn from_json(json: &str) -> Result<Self, ScrapeError> {
        let all: Vec<SiteProfile> =
            serde_json::from_str(json).map_err(|e| ScrapeError::Profiles(e.to_string()))?;

        let (generic, profiles): (Vec<_>, Vec<_>) =
            all.into_iter().partition(SiteProfile::is_generic);
        let mut generic = generic.into_iter();
        let fallback = generic
            .next()
            .ok_or_else(|| ScrapeError::Profiles("missing \"generic\" profile".into()))?;
        if generic.next().is_some() {
            return Err(ScrapeError::Profiles(
                "more than one \"generic\" profile".into(),
            ));
        }
        Self::validate_keys(&profiles)?;

        Ok(Self {
            profiles,
            generic: fallback,
        })
    }

    /// Layer extra profiles in front of this table.
    ///
    /// `extra` is a JSON array like the built-in one, except `generic` is
    /// optional; when present it replaces the current fallback.
    pub fn with_overrides(mut self, extra: &str) -> Result<Self, ScrapeError> {
        let all: Vec<SiteProfile> =
            serde_json::from_str(extra).map_err(|e| ScrapeError::Profiles(e.to_string()))?;
        let mut front = Vec::with_capacity(all.len() + self.profiles.len());
        for profile in all {
            if profile.is_generic() {
                self.generic = profile;
            } else {
                front.push(profile);
            }
        }
        Self::validate_keys(&front)?;
        front.append(&mut self.profiles);
        self.profiles = front;
        Ok(self)
    }

    /// Pick the profile for a target URL. Never fails.
    pub fn resolve(&self, url: &str) -> &SiteProfile {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_else(|| url.to_ascii_lowercase());

        match self
            .profiles
            .iter()
            .find(|p| host.contains(&p.key.to_ascii_lowercase()))
        {
            Some(profile) => {
                tracing::info!("using site profile {:?} for {host}", profile.key);
                profile
            }
            None => {
                tracing::info!("using generic profile for {host}");
                &self.generic
            }
        }
    }

    /// All profiles in match order, generic last.
    pub fn iter(&self) -> impl Iterator<Item = &SiteProfile> {
        self.profiles.iter().chain(std::iter::once(&self.generic))
    }

    pub fn generic(&self) -> &SiteProfile {
        &self.generic
    }

    fn validate_keys(profiles: &[SiteProfile]) -> Result<(), ScrapeError> {
        match profiles.iter().find(|p| p.key.trim().is_empty()) {
            Some(_) => Err(ScrapeError::Profiles("profile with empty key".into())),
            None => Ok(()),
        }
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
