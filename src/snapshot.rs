// src/snapshot.rs
//! Static JSON snapshot of the most recent articles, plus the shared
//! presentation types for the read side.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::store::ArticleRow;

pub const DEFAULT_SNAPSHOT_PATH: &str = "public/news.json";

/// One article as rendered to consumers. `published_at` is an ISO-8601
/// string with an explicit UTC offset in the reference timezone; downstream
/// readers rely on that exact shape.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleOut {
    pub id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub published_at: String,
}

impl ArticleOut {
    pub fn from_row(row: ArticleRow, tz: Tz) -> Self {
        Self {
            id: row.id,
            source: row.source,
            title: row.title,
            url: row.url,
            summary: row.summary,
            image_url: row.image_url,
            published_at: format_published(row.published_at, tz),
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SS±HH:MM` in the reference timezone.
pub fn format_published(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsPayload {
    pub generated_at: String,
    pub count: usize,
    pub items: Vec<ArticleOut>,
}

pub fn build_payload(rows: Vec<ArticleRow>, tz: Tz, generated_at: DateTime<Utc>) -> NewsPayload {
    let items: Vec<ArticleOut> = rows
        .into_iter()
        .map(|row| ArticleOut::from_row(row, tz))
        .collect();
    NewsPayload {
        generated_at: generated_at.to_rfc3339(),
        count: items.len(),
        items,
    }
}

/// Pretty-print the payload to `path`, creating parent directories.
pub fn write_snapshot(path: &Path, payload: &NewsPayload) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(payload).context("serializing news payload")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
