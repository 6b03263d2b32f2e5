// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! listscrape: adaptive list scraper, as a service or a one-shot command.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use listscrape::ScrapeMode;
use listscrape_server::cli;
use listscrape_server::config::ConfigOverrides;

#[derive(Parser)]
#[command(
    name = "listscrape",
    about = "Scrape company directories: follow listings, visit detail pages, paginate",
    version
)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP control interface
    Serve {
        /// Listen address (host:port)
        #[arg(long)]
        bind: Option<String>,
        /// JSON file of extra site profiles
        #[arg(long)]
        profiles: Option<PathBuf>,
        /// Maximum concurrent scrape jobs
        #[arg(long)]
        max_jobs: Option<usize>,
    },
    /// Scrape one listing and print the result as JSON
    Scrape {
        /// Listing page URL
        url: String,
        /// Stop after this many companies (default 100)
        #[arg(long)]
        max_companies: Option<usize>,
        /// Stop after this many listing pages (1-10, default 10)
        #[arg(long)]
        max_pages: Option<u32>,
        /// Visit detail pages, or read listing cards only
        #[arg(long, value_enum, default_value_t = Mode::Clickthrough)]
        mode: Mode,
        /// JSON file of extra site profiles
        #[arg(long)]
        profiles: Option<PathBuf>,
    },
    /// List site profiles in match order
    Profiles {
        /// JSON file of extra site profiles
        #[arg(long)]
        profiles: Option<PathBuf>,
        /// Print full profiles as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Clickthrough,
    Cards,
}

impl From<Mode> for ScrapeMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Clickthrough => ScrapeMode::Clickthrough,
            Mode::Cards => ScrapeMode::Cards,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(cli.log_json);

    match cli.command {
        Commands::Serve {
            bind,
            profiles,
            max_jobs,
        } => {
            cli::serve::run(ConfigOverrides {
                bind,
                profiles,
                max_jobs,
            })
            .await
        }
        Commands::Scrape {
            url,
            max_companies,
            max_pages,
            mode,
            profiles,
        } => cli::scrape::run(&url, max_companies, max_pages, mode.into(), profiles).await,
        Commands::Profiles { profiles, json } => cli::profiles::run(profiles, json),
    }
}
