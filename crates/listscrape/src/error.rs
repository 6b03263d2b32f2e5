// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Job-level error types.
//!
//! Only conditions that make a whole scrape job fail live here. Failures
//! scoped to one card, one detail page, or one pagination step are logged
//! and skipped where they happen and never become a [`ScrapeError`].

/// Errors that abort a scrape job.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    /// The request was rejected before any browser work began.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The browser could not be started.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// The target listing page could not be reached.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Any other whole-job browser fault (context creation, lost page).
    #[error("browser error: {0}")]
    Browser(String),

    /// A site profile table failed to parse or validate.
    #[error("invalid site profiles: {0}")]
    Profiles(String),
}

impl ScrapeError {
    /// Whether the caller is at fault (bad request) rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    pub(crate) fn navigation(url: &str, err: &anyhow::Error) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: format!("{err:#}"),
        }
    }
}
