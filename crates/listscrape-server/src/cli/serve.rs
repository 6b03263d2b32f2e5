// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! `listscrape serve`: run the HTTP control interface.

use crate::config::{ConfigOverrides, ServiceConfig};
use crate::rest::{self, AppState};
use anyhow::Result;
use listscrape::renderer::chromium::{find_chromium, ChromiumLauncher};
use listscrape::{CrawlSettings, Crawler};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(overrides: ConfigOverrides) -> Result<()> {
    let config = ServiceConfig::resolve(overrides)?;
    let registry = Arc::new(config.load_registry()?);
    info!(
        "starting listscrape v{} ({} site profiles, max {} concurrent jobs)",
        env!("CARGO_PKG_VERSION"),
        registry.iter().count(),
        config.max_jobs
    );

    if config.chromium_path.is_none() && find_chromium().is_none() {
        warn!("no Chromium found yet; scrape requests will fail until one is installed");
    }
    let launcher = Arc::new(ChromiumLauncher::new(config.chromium_path.clone()));
    let crawler = Crawler::new(registry, CrawlSettings::default());
    let state = Arc::new(AppState::new(launcher, crawler, config.max_jobs));

    tokio::select! {
        result = rest::start(config.bind, state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}
