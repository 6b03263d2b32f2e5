// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Listscrape: adaptive list-scraping engine for directory and aggregator sites.
//!
//! Given a listing-page URL, the engine resolves a site profile, picks a
//! pagination strategy, harvests links to per-company detail pages, visits
//! each one in a single browser tab, and keeps paginating until a company
//! or page budget runs out.

pub mod crawl;
pub mod error;
pub mod extract;
pub mod locator;
pub mod pagination;
pub mod popup;
pub mod profile;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod types;

pub use crawl::{CrawlJob, CrawlLimits, Crawler, ScrapeMode};
pub use error::ScrapeError;
pub use locator::Locator;
pub use pagination::{Pagination, PaginationStrategy};
pub use profile::{ProfileRegistry, SiteProfile};
pub use renderer::{BrowserLauncher, RenderContext, Renderer};
pub use session::{run_crawl_job, run_job, JobRequest};
pub use settings::CrawlSettings;
pub use types::{CompanyRecord, CrawlOutcome, SocialPlatform, StopReason};
