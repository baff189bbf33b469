//! Ingestion run — Binary Entrypoint
//!
//! One batch pass over the configured feeds: normalize, keyword-filter,
//! enforce the daily insert quota, dedup against the store, upsert. Exit 0
//! covers every completed run including "nothing to insert"; only startup
//! and store failures are fatal.

use anyhow::Result;
use tracing::info;

use btcheck::config::Config;
use btcheck::ingest::{self, sources, types::HttpFeedFetch};
use btcheck::store::ArticleStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in CI where secrets come from the runner.
    let _ = dotenvy::dotenv();
    btcheck::init_tracing();

    let cfg = Config::from_env()?;
    let feed_list = sources::load_sources_default()?;

    let store = ArticleStore::connect(&cfg.database_url).await?;
    let fetcher = HttpFeedFetch::new()?;

    let summary = ingest::run_once(&fetcher, &feed_list, &store, &cfg).await?;
    info!(
        fetched = summary.fetched,
        kept = summary.kept,
        admissible = summary.admissible,
        inserted = summary.inserted,
        max_daily = cfg.max_daily_inserts,
        "run finished"
    );
    Ok(())
}
