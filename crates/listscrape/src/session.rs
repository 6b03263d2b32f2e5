// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Job-scoped browser sessions.
//!
//! Every job gets its own browser and exactly one tab. Both are released on
//! every exit path before [`run_job`] returns, whether the crawl succeeded,
//! stopped early or failed.

use crate::crawl::{CrawlJob, CrawlLimits, Crawler, ScrapeMode};
use crate::error::ScrapeError;
use crate::renderer::BrowserLauncher;
use crate::types::CrawlOutcome;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// An unvalidated scrape request as it arrives from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "max_companies")]
    pub max_companies: Option<usize>,
    #[serde(default, alias = "max_pages")]
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub mode: ScrapeMode,
}

impl JobRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Validate into a [`CrawlJob`]. Fails without touching a browser.
    pub fn into_job(self) -> Result<CrawlJob, ScrapeError> {
        let url = self
            .url
            .ok_or_else(|| ScrapeError::InvalidRequest("URL is required".into()))?;
        let limits = CrawlLimits::new(self.max_companies, self.max_pages);
        CrawlJob::new(&url, limits, self.mode)
    }
}

/// Validate `request`, launch a browser, crawl, and tear everything down.
pub async fn run_job(
    launcher: &dyn BrowserLauncher,
    crawler: &Crawler,
    request: JobRequest,
) -> Result<CrawlOutcome, ScrapeError> {
    let job = request.into_job()?;
    run_crawl_job(launcher, crawler, &job).await
}

/// Run an already validated job in a fresh browser.
pub async fn run_crawl_job(
    launcher: &dyn BrowserLauncher,
    crawler: &Crawler,
    job: &CrawlJob,
) -> Result<CrawlOutcome, ScrapeError> {
    let renderer = launcher
        .launch()
        .await
        .map_err(|e| ScrapeError::BrowserLaunch(format!("{e:#}")))?;

    let result = match renderer.new_context().await {
        Ok(mut ctx) => {
            let result = crawler.crawl(ctx.as_mut(), job).await;
            if let Err(e) = ctx.close().await {
                warn!("failed to close browser context: {e:#}");
            }
            result
        }
        Err(e) => Err(ScrapeError::Browser(format!(
            "could not open a browser tab: {e:#}"
        ))),
    };

    if let Err(e) = renderer.shutdown().await {
        warn!("failed to shut down browser: {e:#}");
    }
    match &result {
        Ok(out) => info!("job {} done: {} companies", job.url, out.total_count),
        Err(e) => warn!("job {} failed: {e}", job.url),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileRegistry;
    use crate::renderer::fixture::{FixtureLauncher, FixtureSite};
    use crate::settings::CrawlSettings;
    use std::sync::Arc;

    fn crawler() -> Crawler {
        Crawler::new(
            Arc::new(ProfileRegistry::builtin()),
            CrawlSettings::immediate(),
        )
    }

    #[test]
    fn test_request_accepts_both_spellings() {
        let camel: JobRequest =
            serde_json::from_str(r#"{"url":"https://d.example","maxCompanies":5,"maxPages":2}"#)
                .unwrap();
        let snake: JobRequest = serde_json::from_str(
            r#"{"url":"https://d.example","max_companies":5,"max_pages":2,"mode":"cards"}"#,
        )
        .unwrap();
        assert_eq!(camel.max_companies, Some(5));
        assert_eq!(snake.max_companies, Some(5));
        assert_eq!(snake.max_pages, Some(2));
        assert_eq!(snake.mode, ScrapeMode::Cards);
        assert_eq!(camel.mode, ScrapeMode::Clickthrough);
    }

    #[tokio::test]
    async fn test_missing_url_never_launches() {
        let launcher = FixtureLauncher::new(FixtureSite::new());
        let err = run_job(&launcher, &crawler(), JobRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(launcher.launches(), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_is_reported() {
        let err = run_job(
            &FixtureLauncher::failing(),
            &crawler(),
            JobRequest::new("https://dir.example/list"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::BrowserLaunch(_)));
    }

    #[tokio::test]
    async fn test_browser_released_after_failed_crawl() {
        let launcher = FixtureLauncher::new(FixtureSite::new());
        let err = run_job(
            &launcher,
            &crawler(),
            JobRequest::new("https://dir.example/missing"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation { .. }));
        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.shutdowns(), 1);
        assert_eq!(launcher.open_contexts(), 0);
    }
}
