// src/ingest/mod.rs
pub mod feed;
pub mod sources;
pub mod types;

use std::collections::HashSet;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::config::Config;
use crate::ingest::types::{FeedFetch, FeedSource, NewsRecord};
use crate::store::ArticleStore;
use crate::window::DailyWindow;

/// Topical keyword policy: a record must mention at least one of these,
/// case-insensitively, in title + summary.
pub const KEYWORDS: [&str; 2] = ["bitcoin", "btc"];

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "news_ingest_entries_total",
            "Entries normalized from feed documents."
        );
        describe_counter!(
            "news_ingest_kept_total",
            "Entries kept by the keyword filter."
        );
        describe_counter!(
            "news_ingest_inserted_total",
            "Articles written to the store."
        );
        describe_counter!(
            "news_ingest_source_errors_total",
            "Feed fetch/parse errors."
        );
        describe_histogram!("news_ingest_source_ms", "Per-source fetch+parse milliseconds.");
        describe_gauge!(
            "news_ingest_last_run_ts",
            "Unix ts when the ingest pipeline last ran."
        );
    });
}

/// True iff the record matches the topical keyword policy.
pub fn is_on_topic(record: &NewsRecord) -> bool {
    let haystack = format!("{} {}", record.title, record.summary).to_lowercase();
    KEYWORDS.iter().any(|k| haystack.contains(k))
}

/// Keyword-filter, then order newest first. Later stages consume prefixes of
/// this list under the daily cap, so the order must be deterministic; the
/// sort is stable.
pub fn filter_and_order(records: Vec<NewsRecord>) -> Vec<NewsRecord> {
    let mut kept: Vec<NewsRecord> = records.into_iter().filter(is_on_topic).collect();
    kept.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    kept
}

/// Candidates for admission: not already stored and published inside today's
/// window. Input order (newest first) is preserved.
pub fn admissible_candidates(
    ordered: Vec<NewsRecord>,
    existing: &HashSet<String>,
    window: &DailyWindow,
) -> Vec<NewsRecord> {
    ordered
        .into_iter()
        .filter(|r| !existing.contains(&r.id) && window.contains(r.published_at))
        .collect()
}

/// Admission: admissible candidates truncated to the remaining quota.
pub fn plan_admission(
    ordered: Vec<NewsRecord>,
    existing: &HashSet<String>,
    window: &DailyWindow,
    remaining: usize,
) -> Vec<NewsRecord> {
    let mut out = admissible_candidates(ordered, existing, window);
    out.truncate(remaining);
    out
}

/// Outcome of one ingestion run. A zero `inserted` is a normal result, not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Entries normalized across all reachable sources.
    pub fetched: usize,
    /// Entries surviving the keyword filter.
    pub kept: usize,
    /// New-today, non-duplicate candidates before quota truncation.
    pub admissible: usize,
    /// Quota left at the start of the run.
    pub remaining_before: usize,
    /// Rows actually written.
    pub inserted: u64,
}

impl IngestSummary {
    fn empty() -> Self {
        Self {
            fetched: 0,
            kept: 0,
            admissible: 0,
            remaining_before: 0,
            inserted: 0,
        }
    }
}

/// Fetch every configured source through the injected fetcher. A failing
/// source contributes zero records and never affects the others.
pub async fn collect_records(
    fetcher: &dyn FeedFetch,
    sources: &[FeedSource],
) -> Vec<NewsRecord> {
    let mut all = Vec::new();
    for src in sources {
        let t0 = std::time::Instant::now();
        let records = match fetcher.fetch(&src.url).await {
            Ok(document) => match feed::parse_feed(&src.name, &document) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(error = ?e, source = %src.name, "feed parse error");
                    counter!("news_ingest_source_errors_total").increment(1);
                    continue;
                }
            },
            Err(e) => {
                tracing::warn!(error = ?e, source = %src.name, "feed fetch error");
                counter!("news_ingest_source_errors_total").increment(1);
                continue;
            }
        };
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_ingest_source_ms").record(ms);
        counter!("news_ingest_entries_total").increment(records.len() as u64);
        all.extend(records);
    }
    all
}

/// Run the whole pipeline once: normalize, filter, gate on the daily quota,
/// dedup against the store, and upsert what remains.
pub async fn run_once(
    fetcher: &dyn FeedFetch,
    sources: &[FeedSource],
    store: &ArticleStore,
    cfg: &Config,
) -> Result<IngestSummary> {
    ensure_metrics_described();
    store.ensure_schema().await?;

    let raw = collect_records(fetcher, sources).await;
    let fetched = raw.len();
    let candidates = filter_and_order(raw);
    let kept = candidates.len();
    counter!("news_ingest_kept_total").increment(kept as u64);

    let window = DailyWindow::current(cfg.timezone);
    let already_today = store.count_published_between(&window).await?;
    let remaining = (i64::from(cfg.max_daily_inserts) - already_today).max(0) as usize;

    let mut summary = IngestSummary {
        fetched,
        kept,
        remaining_before: remaining,
        ..IngestSummary::empty()
    };

    gauge!("news_ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    if remaining == 0 {
        tracing::info!(
            max_daily = cfg.max_daily_inserts,
            "daily insert cap already reached, nothing to do"
        );
        return Ok(summary);
    }

    let mut ids: Vec<String> = candidates.iter().map(|r| r.id.clone()).collect();
    ids.sort();
    ids.dedup();
    let existing = store.existing_ids(&ids).await?;

    let mut admitted = admissible_candidates(candidates, &existing, &window);
    summary.admissible = admitted.len();
    admitted.truncate(remaining);

    if admitted.is_empty() {
        tracing::info!("no new articles inside today's window");
        return Ok(summary);
    }

    let inserted = store.insert_articles(&admitted).await?;
    counter!("news_ingest_inserted_total").increment(inserted);
    summary.inserted = inserted;

    tracing::info!(
        fetched,
        kept,
        inserted,
        remaining_before = remaining,
        "ingest run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn record(id: &str, title: &str, summary: &str, ts: DateTime<Utc>) -> NewsRecord {
        NewsRecord {
            id: id.to_string(),
            source: "Test".to_string(),
            title: title.to_string(),
            url: format!("https://t.test/{id}"),
            summary: summary.to_string(),
            image_url: None,
            published_at: ts,
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn keyword_filter_is_case_insensitive() {
        let on = record("a", "BTC breaks out", "", ts(0));
        let also_on = record("b", "Markets", "analysts cite bitcoin flows", ts(0));
        let off = record("c", "Ethereum rallies", "gas fees drop", ts(0));
        assert!(is_on_topic(&on));
        assert!(is_on_topic(&also_on));
        assert!(!is_on_topic(&off));
    }

    #[test]
    fn filter_and_order_is_newest_first() {
        let recs = vec![
            record("old", "bitcoin", "", ts(100)),
            record("new", "bitcoin", "", ts(300)),
            record("mid", "btc", "", ts(200)),
            record("noise", "stocks", "", ts(400)),
        ];
        let out = filter_and_order(recs);
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn admission_respects_dedup_window_and_quota() {
        let window = DailyWindow {
            start: ts(1_000),
            end: ts(2_000),
        };
        let recs = vec![
            record("dup", "bitcoin", "", ts(1_900)),
            record("fresh1", "bitcoin", "", ts(1_800)),
            record("stale", "bitcoin", "", ts(500)), // before the window
            record("fresh2", "bitcoin", "", ts(1_700)),
            record("fresh3", "bitcoin", "", ts(1_600)),
        ];
        let existing: HashSet<String> = ["dup".to_string()].into();

        let admitted = plan_admission(recs, &existing, &window, 2);
        let ids: Vec<&str> = admitted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["fresh1", "fresh2"]);
    }

    #[test]
    fn window_boundaries_are_half_open_for_admission() {
        let window = DailyWindow {
            start: ts(1_000),
            end: ts(2_000),
        };
        let recs = vec![
            record("at-start", "bitcoin", "", ts(1_000)),
            record("at-end", "bitcoin", "", ts(2_000)),
        ];
        let admitted = plan_admission(recs, &HashSet::new(), &window, 10);
        let ids: Vec<&str> = admitted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["at-start"]);
    }
}
