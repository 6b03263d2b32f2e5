// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service configuration: CLI flags, then environment, then defaults.

use anyhow::{Context, Result};
use listscrape::renderer::chromium::CHROMIUM_PATH_ENV;
use listscrape::ProfileRegistry;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const BIND_ENV: &str = "LISTSCRAPE_BIND";
pub const PROFILES_ENV: &str = "LISTSCRAPE_PROFILES";
pub const MAX_JOBS_ENV: &str = "LISTSCRAPE_MAX_JOBS";

pub const DEFAULT_BIND: &str = "0.0.0.0:3006";
pub const DEFAULT_MAX_JOBS: usize = 4;

/// Values given on the command line. `None` defers to the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub profiles: Option<PathBuf>,
    pub max_jobs: Option<usize>,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    /// Explicit Chromium binary. `None` means search at launch time.
    pub chromium_path: Option<PathBuf>,
    /// Extra site profiles layered over the built-in table.
    pub profiles: Option<PathBuf>,
    /// Upper bound on concurrently running scrape jobs.
    pub max_jobs: usize,
}

impl ServiceConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = overrides
            .bind
            .or_else(|| env(BIND_ENV))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address {bind_raw:?}"))?;

        let max_jobs = match overrides.max_jobs {
            Some(n) => n,
            None => match env(MAX_JOBS_ENV) {
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("invalid {MAX_JOBS_ENV} {raw:?}"))?,
                None => DEFAULT_MAX_JOBS,
            },
        };

        Ok(Self {
            bind,
            chromium_path: env(CHROMIUM_PATH_ENV).map(PathBuf::from),
            profiles: overrides.profiles.or_else(|| env(PROFILES_ENV).map(PathBuf::from)),
            max_jobs: max_jobs.max(1),
        })
    }

    /// Built-in profiles plus the configured extra table, if any.
    pub fn load_registry(&self) -> Result<ProfileRegistry> {
        let registry = ProfileRegistry::builtin();
        let Some(path) = &self.profiles else {
            return Ok(registry);
        };
        let extra = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profiles from {}", path.display()))?;
        let registry = registry
            .with_overrides(&extra)
            .with_context(|| format!("failed to load profiles from {}", path.display()))?;
        tracing::info!("loaded extra site profiles from {}", path.display());
        Ok(registry)
    }
}
