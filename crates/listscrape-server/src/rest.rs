// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP control interface.
//!
//! `POST /api/scrape-list` runs one crawl job per request and always answers
//! with the same envelope:
//!
//! ```json
//! { "success": true, "companies": [...], "metadata": { "total_found": 15, ... } }
//! { "success": false, "error": "...", "companies": [], "metadata": {} }
//! ```
//!
//! `GET /health` is side-effect free.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use listscrape::{
    run_crawl_job, BrowserLauncher, CrawlJob, CrawlOutcome, Crawler, JobRequest, ScrapeError,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub const SERVICE_NAME: &str = "listscrape";

/// Shared state of the HTTP service.
pub struct AppState {
    launcher: Arc<dyn BrowserLauncher>,
    crawler: Crawler,
    jobs: Semaphore,
}

impl AppState {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, crawler: Crawler, max_jobs: usize) -> Self {
        Self {
            launcher,
            crawler,
            jobs: Semaphore::new(max_jobs.max(1)),
        }
    }
}

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/scrape-list", post(scrape_list))
        .layer(cors)
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn start(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listscrape listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Envelopes ───────────────────────────────────────────────────

/// Response body for a finished job, partial or not.
pub fn success_envelope(job: &CrawlJob, outcome: &CrawlOutcome) -> Value {
    json!({
        "success": true,
        "companies": outcome.companies,
        "metadata": {
            "total_found": outcome.total_count,
            "pages_scraped": outcome.pages_scraped,
            "method": job.mode.method(),
            "url": job.url,
            "stop_reason": outcome.stop_reason,
            "pagination": outcome.pagination,
        }
    })
}

/// Response body for a rejected or failed job.
pub fn failure_envelope(message: &str) -> Value {
    json!({
        "success": false,
        "error": message,
        "companies": [],
        "metadata": {},
    })
}

fn status_for(err: &ScrapeError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn failure(err: &ScrapeError) -> (StatusCode, Json<Value>) {
    (status_for(err), Json(failure_envelope(&err.to_string())))
}

// ── Handlers ────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn scrape_list(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(e) => return failure(&e),
    };
    let job = match request.into_job() {
        Ok(job) => job,
        Err(e) => return failure(&e),
    };

    let _permit = match state.jobs.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            return failure(&ScrapeError::Browser("service is shutting down".into()));
        }
    };

    match run_crawl_job(state.launcher.as_ref(), &state.crawler, &job).await {
        Ok(outcome) => (StatusCode::OK, Json(success_envelope(&job, &outcome))),
        Err(e) => {
            error!("scrape of {} failed: {e}", job.url);
            failure(&e)
        }
    }
}

/// An empty body counts as a request without a URL.
fn parse_request(body: &[u8]) -> Result<JobRequest, ScrapeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(JobRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ScrapeError::InvalidRequest(format!("malformed request body: {e}")))
}
