//! Snapshot export: write the most recent articles to public/news.json.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use btcheck::config;
use btcheck::snapshot::{build_payload, write_snapshot, DEFAULT_SNAPSHOT_PATH};
use btcheck::store::ArticleStore;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    btcheck::init_tracing();

    let database_url = config::read_side_database_url()?;
    let timezone = config::reference_timezone()?;
    let limit = config::news_limit()?;

    let store = ArticleStore::connect(&database_url).await?;
    let rows = store.recent_articles(limit).await?;

    let payload = build_payload(rows, timezone, Utc::now());
    let path = Path::new(DEFAULT_SNAPSHOT_PATH);
    write_snapshot(path, &payload)?;

    info!(count = payload.count, path = %path.display(), "snapshot written");
    Ok(())
}
