// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Crawl orchestrator: drives one tab through a listing and its detail pages.
//!
//! The crawl is an explicit state machine:
//!
//! ```text
//! Init -> ListPage -> VisitingDetail -> ListPage (restored) -> Paginating -> ListPage | Done
//! ```
//!
//! Budgets are checked before each unit of work. Per-company failures are
//! skipped; only an unreachable target page fails the job.

use crate::error::ScrapeError;
use crate::extract::{extract_cards, extract_details, harvest_links, host_of};
use crate::pagination::{self, Pagination};
use crate::popup;
use crate::profile::{ProfileRegistry, SiteProfile};
use crate::renderer::RenderContext;
use crate::settings::{pause, CrawlSettings};
use crate::types::{CompanyRecord, CrawlOutcome, StopReason};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_COMPANIES: usize = 100;
/// Hard ceiling on listing pages per job.
pub const MAX_PAGES: u32 = 10;

/// How deep a crawl goes per company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    /// Visit every company's detail page.
    #[default]
    Clickthrough,
    /// Read name and website straight off the listing cards.
    Cards,
}

impl ScrapeMode {
    /// Value reported as `metadata.method`.
    pub fn method(self) -> &'static str {
        match self {
            Self::Clickthrough => "chromium_clickthrough",
            Self::Cards => "chromium_cards",
        }
    }
}

/// Result and page budgets for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    pub max_companies: usize,
    pub max_pages: u32,
}

impl CrawlLimits {
    /// Apply defaults and clamp into range: at least one company, 1..=10 pages.
    pub fn new(max_companies: Option<usize>, max_pages: Option<u32>) -> Self {
        Self {
            max_companies: max_companies.unwrap_or(DEFAULT_MAX_COMPANIES).max(1),
            max_pages: max_pages.unwrap_or(MAX_PAGES).clamp(1, MAX_PAGES),
        }
    }
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A validated request to crawl one listing.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub url: String,
    pub limits: CrawlLimits,
    pub mode: ScrapeMode,
}

impl CrawlJob {
    /// Validate the target URL. Only absolute `http(s)` URLs are accepted.
    pub fn new(url: &str, limits: CrawlLimits, mode: ScrapeMode) -> Result<Self, ScrapeError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ScrapeError::InvalidRequest("URL is required".into()));
        }
        let parsed = url::Url::parse(url)
            .map_err(|e| ScrapeError::InvalidRequest(format!("invalid URL {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ScrapeError::InvalidRequest(format!(
                "URL must be absolute http(s): {url:?}"
            )));
        }
        Ok(Self {
            url: url.to_string(),
            limits,
            mode,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Init,
    ListPage,
    VisitingDetail { links: Vec<String>, next: usize },
    Paginating,
    Done(StopReason),
}

/// Runs crawl jobs against a profile table with fixed settings.
pub struct Crawler {
    registry: Arc<ProfileRegistry>,
    settings: CrawlSettings,
}

impl Crawler {
    pub fn new(registry: Arc<ProfileRegistry>, settings: CrawlSettings) -> Self {
        Self { registry, settings }
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Crawl `job` in `ctx`. Partial results are still `Ok`.
    pub async fn crawl(
        &self,
        ctx: &mut dyn RenderContext,
        job: &CrawlJob,
    ) -> Result<CrawlOutcome, ScrapeError> {
        info!(
            "crawling {} (mode={:?}, max_companies={}, max_pages={})",
            job.url, job.mode, job.limits.max_companies, job.limits.max_pages
        );
        let profile = self.registry.resolve(&job.url);
        let mut run = CrawlRun {
            ctx,
            job,
            profile,
            settings: &self.settings,
            pagination: Pagination::InfiniteScroll,
            listing_url: job.url.clone(),
            source: host_of(&job.url).unwrap_or_default(),
            visited: HashSet::new(),
            seen_names: HashSet::new(),
            companies: Vec::new(),
            pages_scraped: 0,
        };

        let mut state = State::Init;
        let stop_reason = loop {
            state = match state {
                State::Init => run.init().await?,
                State::ListPage => run.list_page().await,
                State::VisitingDetail { links, next } => run.visit_detail(links, next).await,
                State::Paginating => run.paginate().await,
                State::Done(reason) => break reason,
            };
        };

        info!(
            "crawl finished: {} companies from {} pages ({stop_reason:?})",
            run.companies.len(),
            run.pages_scraped
        );
        Ok(CrawlOutcome {
            total_count: run.companies.len(),
            companies: run.companies,
            pages_scraped: run.pages_scraped,
            stop_reason,
            pagination: run.pagination,
        })
    }
}

/// Mutable state of one crawl. Job-local; nothing here outlives the job.
struct CrawlRun<'a> {
    ctx: &'a mut dyn RenderContext,
    job: &'a CrawlJob,
    profile: &'a SiteProfile,
    settings: &'a CrawlSettings,
    pagination: Pagination,
    /// Listing page to come back to after each detail visit.
    listing_url: String,
    /// Listing host, reported as every record's `source`.
    source: String,
    visited: HashSet<String>,
    seen_names: HashSet<String>,
    companies: Vec<CompanyRecord>,
    pages_scraped: u32,
}

impl CrawlRun<'_> {
    fn budget_reached(&self) -> Option<StopReason> {
        if self.companies.len() >= self.job.limits.max_companies {
            Some(StopReason::MaxCompanies)
        } else if self.pages_scraped >= self.job.limits.max_pages {
            Some(StopReason::MaxPages)
        } else {
            None
        }
    }

    async fn init(&mut self) -> Result<State, ScrapeError> {
        let nav = self
            .ctx
            .navigate(&self.job.url, self.settings.navigation_timeout_ms)
            .await
            .map_err(|e| ScrapeError::navigation(&self.job.url, &e))?;
        debug!("loaded {} in {}ms", nav.final_url, nav.load_time_ms);

        popup::dismiss(self.ctx, self.settings).await;
        self.pagination = pagination::resolve(self.ctx, self.profile).await;
        self.listing_url = self.current_url().await;
        Ok(State::ListPage)
    }

    async fn list_page(&mut self) -> State {
        if let Some(reason) = self.budget_reached() {
            return State::Done(reason);
        }
        let page = self.pages_scraped + 1;
        let html = match self.ctx.get_html().await {
            Ok(html) => html,
            Err(e) => {
                warn!("could not read listing page {page}: {e:#}");
                return self.finish_page();
            }
        };

        match self.job.mode {
            ScrapeMode::Clickthrough => {
                let links = harvest_links(&html, &self.listing_url, self.profile);
                info!("page {page}: {} detail links", links.len());
                State::VisitingDetail { links, next: 0 }
            }
            ScrapeMode::Cards => {
                let cards = extract_cards(&html, &self.listing_url, self.profile);
                info!("page {page}: {} cards", cards.len());
                for record in cards {
                    if self.companies.len() >= self.job.limits.max_companies {
                        break;
                    }
                    if self.seen_names.insert(record.name.to_lowercase()) {
                        self.companies.push(record);
                    }
                }
                self.finish_page()
            }
        }
    }

    async fn visit_detail(&mut self, links: Vec<String>, next: usize) -> State {
        if self.companies.len() >= self.job.limits.max_companies {
            return self.finish_page();
        }
        let Some(link) = links.get(next) else {
            return self.finish_page();
        };
        if !self.visited.insert(link.clone()) {
            debug!("already visited {link}");
            return State::VisitingDetail {
                links,
                next: next + 1,
            };
        }

        if let Some(record) = extract_details(self.ctx, link, &self.source, self.settings).await {
            info!("extracted {} ({})", record.name, self.companies.len() + 1);
            self.companies.push(record);
        }

        if !self.restore_listing().await {
            warn!("lost the listing page {}; stopping", self.listing_url);
            self.pages_scraped += 1;
            return State::Done(StopReason::Exhausted);
        }
        State::VisitingDetail {
            links,
            next: next + 1,
        }
    }

    fn finish_page(&mut self) -> State {
        self.pages_scraped += 1;
        match self.budget_reached() {
            Some(reason) => State::Done(reason),
            None => State::Paginating,
        }
    }

    async fn paginate(&mut self) -> State {
        if !pagination::advance(self.ctx, self.pagination, self.profile, self.settings).await {
            info!("no more pages after page {}", self.pages_scraped);
            return State::Done(StopReason::Exhausted);
        }
        pause(self.settings.page_settle).await;
        self.listing_url = self.current_url().await;
        State::ListPage
    }

    /// Get back to the listing page after a detail visit.
    ///
    /// Uses history first and falls back to loading the listing URL again.
    async fn restore_listing(&mut self) -> bool {
        if self.on_listing().await {
            return true;
        }
        match self.ctx.go_back(self.settings.detail_timeout_ms).await {
            Ok(()) => pause(self.settings.back_settle).await,
            Err(e) => debug!("history back failed: {e:#}"),
        }
        if self.on_listing().await {
            return true;
        }

        info!("history did not return to the listing; reloading {}", self.listing_url);
        match self
            .ctx
            .navigate(&self.listing_url, self.settings.detail_timeout_ms)
            .await
        {
            Ok(_) => {
                pause(self.settings.back_settle).await;
                true
            }
            Err(e) => {
                warn!("reloading listing failed: {e:#}");
                false
            }
        }
    }

    async fn on_listing(&self) -> bool {
        match self.ctx.get_url().await {
            Ok(url) => same_page(&url, &self.listing_url),
            Err(_) => false,
        }
    }

    async fn current_url(&self) -> String {
        self.ctx
            .get_url()
            .await
            .unwrap_or_else(|_| self.job.url.clone())
    }
}

/// URL equality ignoring fragments and a trailing slash.
fn same_page(a: &str, b: &str) -> bool {
    let canon = |u: &str| {
        let u = u.split('#').next().unwrap_or_default();
        u.trim_end_matches('/').to_string()
    };
    canon(a) == canon(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixture::{FixtureRenderer, FixtureSite};

    fn listing(cards: &[(&str, &str)], next: Option<&str>) -> String {
        let mut body = String::new();
        for (name, href) in cards {
            body.push_str(&format!(
                r#"<article><h2>{name}</h2><a href="{href}">Profile</a></article>"#
            ));
        }
        if let Some(next) = next {
            body.push_str(&format!(r#"<a rel="next" href="{next}">Next</a>"#));
        }
        format!("<html><body>{body}</body></html>")
    }

    fn detail(name: &str) -> String {
        format!("<html><body><h1>{name}</h1></body></html>")
    }

    async fn run(site: FixtureSite, job: CrawlJob) -> Result<CrawlOutcome, ScrapeError> {
        let renderer = FixtureRenderer::new(Arc::new(site));
        let mut ctx = renderer.context();
        let crawler = Crawler::new(
            Arc::new(ProfileRegistry::builtin()),
            CrawlSettings::immediate(),
        );
        crawler.crawl(&mut ctx, &job).await
    }

    fn job(url: &str, max_companies: usize, mode: ScrapeMode) -> CrawlJob {
        CrawlJob::new(url, CrawlLimits::new(Some(max_companies), None), mode).unwrap()
    }

    #[test]
    fn test_limits_clamp() {
        let l = CrawlLimits::new(Some(0), Some(50));
        assert_eq!(l.max_companies, 1);
        assert_eq!(l.max_pages, MAX_PAGES);
        assert_eq!(CrawlLimits::new(None, Some(0)).max_pages, 1);
        assert_eq!(CrawlLimits::default().max_companies, 100);
    }

    #[test]
    fn test_job_rejects_bad_urls() {
        let l = CrawlLimits::default();
        for bad in ["", "   ", "not a url", "ftp://dir.example/", "mailto:a@b.co"] {
            let err = CrawlJob::new(bad, l, ScrapeMode::default()).unwrap_err();
            assert!(err.is_client_error(), "{bad:?}");
        }
        assert!(CrawlJob::new("https://dir.example/list", l, ScrapeMode::Cards).is_ok());
    }

    #[test]
    fn test_same_page() {
        assert!(same_page("https://d.example/list/", "https://d.example/list"));
        assert!(same_page("https://d.example/list#top", "https://d.example/list"));
        assert!(!same_page("https://d.example/list?page=2", "https://d.example/list"));
    }

    #[tokio::test]
    async fn test_unreachable_target_fails_job() {
        let err = run(
            FixtureSite::new(),
            job("https://dir.example/list", 10, ScrapeMode::Clickthrough),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_clickthrough_stops_at_company_budget() {
        let site = FixtureSite::new()
            .page(
                "https://dir.example/list",
                listing(
                    &[
                        ("Alpha", "/company/alpha"),
                        ("Bravo", "/company/bravo"),
                        ("Charlie", "/company/charlie"),
                    ],
                    Some("/list?page=2"),
                ),
            )
            .page("https://dir.example/company/alpha", detail("Alpha Inc"))
            .page("https://dir.example/company/bravo", detail("Bravo Inc"))
            .page("https://dir.example/company/charlie", detail("Charlie Inc"));

        let out = run(site, job("https://dir.example/list", 2, ScrapeMode::Clickthrough))
            .await
            .unwrap();
        let names: Vec<&str> = out.companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Alpha Inc", "Bravo Inc"]);
        assert_eq!(out.stop_reason, StopReason::MaxCompanies);
        assert_eq!(out.pages_scraped, 1);
        assert_eq!(out.total_count, 2);
        assert_eq!(out.pagination, Pagination::ClickButton);
    }

    #[tokio::test]
    async fn test_hidden_pager_does_not_end_crawl() {
        let first = r#"<html><body>
            <article><h2>Alpha</h2><a href="/company/alpha">Profile</a></article>
            <a rel="next" href="/list?page=2">›</a>
            <div style="display:none"><button>Next</button></div>
        </body></html>"#;
        let site = FixtureSite::new()
            .page("https://dir.example/list", first)
            .page(
                "https://dir.example/list?page=2",
                listing(&[("Bravo", "/company/bravo")], None),
            )
            .page("https://dir.example/company/alpha", detail("Alpha Inc"))
            .page("https://dir.example/company/bravo", detail("Bravo Inc"));

        let out = run(site, job("https://dir.example/list", 10, ScrapeMode::Clickthrough))
            .await
            .unwrap();
        let names: Vec<&str> = out.companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(out.pagination, Pagination::ClickButton);
        assert_eq!(names, ["Alpha Inc", "Bravo Inc"]);
        assert_eq!(out.pages_scraped, 2);
        assert_eq!(out.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_failed_detail_is_skipped_and_listing_kept() {
        let site = FixtureSite::new()
            .page(
                "https://dir.example/list",
                listing(
                    &[
                        ("Alpha", "/company/alpha"),
                        ("Broken", "/company/broken"),
                        ("Tiny", "/company/tiny"),
                        ("Charlie", "/company/charlie"),
                    ],
                    None,
                ),
            )
            .page("https://dir.example/company/alpha", detail("Alpha Inc"))
            .page("https://dir.example/company/tiny", detail("AB"))
            .page("https://dir.example/company/charlie", detail("Charlie Inc"));

        let out = run(site, job("https://dir.example/list", 10, ScrapeMode::Clickthrough))
            .await
            .unwrap();
        let names: Vec<&str> = out.companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Alpha Inc", "Charlie Inc"]);
        assert_eq!(out.pages_scraped, 1);
        assert_eq!(out.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_cards_mode_dedupes_by_name_across_growth() {
        let first = r#"<html><body>
            <article><h2>Alpha</h2><a href="https://alpha.io">Website</a></article>
            <article><h2>Bravo</h2><a href="https://bravo.io">Website</a></article>
            <button>Load more</button>
        </body></html>"#;
        let site = FixtureSite::new().expandable_page(
            "https://dir.example/feed",
            first,
            [r#"<article><h2>ALPHA</h2></article><article><h2>Charlie</h2></article>"#],
        );

        // The control never goes away, so only the page budget ends this crawl
        let limits = CrawlLimits::new(Some(50), Some(3));
        let job = CrawlJob::new("https://dir.example/feed", limits, ScrapeMode::Cards).unwrap();
        let out = run(site, job).await.unwrap();
        let names: Vec<&str> = out.companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Bravo", "Charlie"]);
        assert_eq!(out.pagination, Pagination::LoadMore);
        assert_eq!(out.pages_scraped, 3);
        assert_eq!(out.stop_reason, StopReason::MaxPages);
        assert!(out
            .companies
            .iter()
            .all(|c| c.source_url == "https://dir.example/feed"));
    }
}
