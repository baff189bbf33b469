// src/ingest/types.rs
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// One canonical news record as produced by the feed normalizer. Immutable
/// once stored; `id` is the dedup key and store primary key.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsRecord {
    /// SHA-256 hex of the trimmed link.
    pub id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    /// HTML-stripped excerpt; may be empty.
    pub summary: String,
    pub image_url: Option<String>,
    /// Always UTC; tz-naive feed dates are taken as UTC.
    pub published_at: DateTime<Utc>,
}

/// A configured feed origin: display label + feed address.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

/// Injected fetch capability, so the normalizer is testable with canned
/// documents and sources stay isolated from each other's failures.
#[async_trait::async_trait]
pub trait FeedFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Production fetcher. The explicit timeout bounds the worst case so one
/// hanging feed cannot stall the whole run.
pub struct HttpFeedFetch {
    client: reqwest::Client,
}

impl HttpFeedFetch {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("btcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FeedFetch for HttpFeedFetch {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching feed {url}"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("feed {url} returned an error status"))?;
        resp.text()
            .await
            .with_context(|| format!("reading feed body from {url}"))
    }
}
