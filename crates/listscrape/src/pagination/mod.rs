// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pagination strategies: the declared tag, its once-per-job resolution,
//! and the driver that advances a listing by one step.

pub mod detect;
pub mod driver;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use detect::{detect_in_html, resolve};
pub use driver::advance;

/// Strategy tag declared by a site profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStrategy {
    ClickButton,
    LoadMore,
    InfiniteScroll,
    UrlPattern,
    /// Probe the live page once before the crawl loop starts.
    AutoDetect,
}

impl PaginationStrategy {
    /// The concrete strategy, or `None` for [`PaginationStrategy::AutoDetect`].
    pub fn concrete(self) -> Option<Pagination> {
        match self {
            Self::ClickButton => Some(Pagination::ClickButton),
            Self::LoadMore => Some(Pagination::LoadMore),
            Self::InfiniteScroll => Some(Pagination::InfiniteScroll),
            Self::UrlPattern => Some(Pagination::UrlPattern),
            Self::AutoDetect => None,
        }
    }
}

/// A resolved strategy. Never changes for the lifetime of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    /// Click an explicit "next" control.
    ClickButton,
    /// Click a "load more" / "show more" control.
    LoadMore,
    /// Scroll to the bottom and wait for more content.
    InfiniteScroll,
    /// Increment a page number in the URL.
    UrlPattern,
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ClickButton => "click_button",
            Self::LoadMore => "load_more",
            Self::InfiniteScroll => "infinite_scroll",
            Self::UrlPattern => "url_pattern",
        };
        f.write_str(s)
    }
}
