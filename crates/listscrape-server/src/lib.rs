// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP control interface and command-line front end for listscrape.

pub mod cli;
pub mod config;
pub mod rest;

pub use config::{ConfigOverrides, ServiceConfig};
pub use rest::{router, AppState};
