// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! `listscrape scrape`: one job from the command line, JSON on stdout.

use crate::config::{ConfigOverrides, ServiceConfig};
use crate::rest::{failure_envelope, success_envelope};
use anyhow::Result;
use listscrape::renderer::chromium::ChromiumLauncher;
use listscrape::{run_crawl_job, CrawlSettings, Crawler, JobRequest, ScrapeMode};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run(
    url: &str,
    max_companies: Option<usize>,
    max_pages: Option<u32>,
    mode: ScrapeMode,
    profiles: Option<PathBuf>,
) -> Result<()> {
    let config = ServiceConfig::resolve(ConfigOverrides {
        profiles,
        ..Default::default()
    })?;
    let crawler = Crawler::new(Arc::new(config.load_registry()?), CrawlSettings::default());
    let launcher = ChromiumLauncher::new(config.chromium_path.clone());

    let request = JobRequest {
        url: Some(url.to_string()),
        max_companies,
        max_pages,
        mode,
    };
    let result = match request.into_job() {
        Ok(job) => run_crawl_job(&launcher, &crawler, &job)
            .await
            .map(|outcome| success_envelope(&job, &outcome)),
        Err(e) => Err(e),
    };

    match result {
        Ok(envelope) => {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(())
        }
        Err(e) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&failure_envelope(&e.to_string()))?
            );
            Err(e.into())
        }
    }
}
