// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command implementations for the `listscrape` binary.

pub mod profiles;
pub mod scrape;
pub mod serve;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "listscrape=info,listscrape_server=info";

/// Install the global subscriber. Logs go to stderr so `scrape` can print
/// JSON on stdout.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
