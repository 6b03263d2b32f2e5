// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Best-effort dismissal of cookie banners and consent overlays.

use crate::locator::{self, Locator};
use crate::renderer::{ControlState, RenderContext};
use crate::settings::{pause, CrawlSettings};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Consent and close controls, most specific first.
const POPUP_PATTERNS: &[&str] = &[
    r#"button:has-text("Accept Cookies")"#,
    r#"button:has-text("Accept")"#,
    r#"button:has-text("I Agree")"#,
    r#"button:has-text("Got it")"#,
    r#"button:has-text("Close")"#,
    r#"button[aria-label="Close"]"#,
    ".cookie-notice button",
    "#cookie-banner button",
];

fn patterns() -> &'static [Locator] {
    static PATTERNS: OnceLock<Vec<Locator>> = OnceLock::new();
    PATTERNS.get_or_init(|| locator::chain(POPUP_PATTERNS))
}

/// Click the first visible popup control, if any.
///
/// Each pattern gets `settings.popup_probe_timeout` to answer. Returns the
/// pattern that was clicked; `None` (no popup) is the common case and not an
/// error.
pub async fn dismiss(ctx: &mut dyn RenderContext, settings: &CrawlSettings) -> Option<String> {
    for pattern in patterns() {
        let state = match tokio::time::timeout(settings.popup_probe_timeout, ctx.probe(pattern))
            .await
        {
            Ok(Ok(state)) => state,
            Ok(Err(e)) => {
                debug!("popup probe {pattern} failed: {e:#}");
                continue;
            }
            Err(_) => continue,
        };
        if state != ControlState::Ready {
            continue;
        }
        match ctx.click(pattern).await {
            Ok(true) => {
                info!("dismissed popup: {pattern}");
                pause(settings.popup_settle).await;
                return Some(pattern.to_string());
            }
            Ok(false) => continue,
            Err(e) => debug!("popup click {pattern} failed: {e:#}"),
        }
    }
    debug!("no popups to dismiss");
    None
}
