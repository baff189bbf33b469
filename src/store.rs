// src/store.rs
//! PostgreSQL article store. Writes are insert-or-ignore on the identity
//! primary key; rows are never updated or deleted by the pipeline.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::ingest::types::NewsRecord;
use crate::window::DailyWindow;

/// Upper bound on ids per `IN (...)` query; Postgres caps bind parameters,
/// so lookups are chunked.
pub const ID_QUERY_CHUNK: usize = 500;

const SELECT_ARTICLE: &str = r#"
    SELECT id, source, title, url, summary, image_url, published_at
    FROM articles
"#;

/// A stored row as the read side sees it. `summary`/`image_url` are nullable
/// in the schema.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ArticleStore {
    pool: PgPool,
}

impl ArticleStore {
    /// Connect eagerly; the ingestion run wants to fail fast on a bad URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .context("connecting to postgres")?;
        Ok(Self { pool })
    }

    /// Lazy pool for the read-side server: boots even while the database is
    /// down, errors surface per query.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(database_url)
            .context("configuring postgres pool")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the articles table and its time-ordered index if absent.
    /// Never alters existing schema.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
              id TEXT PRIMARY KEY,
              source TEXT NOT NULL,
              title TEXT NOT NULL,
              url TEXT NOT NULL,
              summary TEXT,
              image_url TEXT,
              published_at TIMESTAMPTZ NOT NULL,
              created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating articles table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (published_at DESC)",
        )
        .execute(&self.pool)
        .await
        .context("creating published_at index")?;

        debug!("articles schema ensured");
        Ok(())
    }

    /// Rows already stored inside the window, for the daily quota gate.
    pub async fn count_published_between(&self, window: &DailyWindow) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM articles WHERE published_at >= $1 AND published_at < $2",
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await
        .context("counting today's articles")
    }

    /// Which of `ids` already exist, queried in chunks of `ID_QUERY_CHUNK`.
    pub async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        let mut found = HashSet::new();
        for chunk in ids.chunks(ID_QUERY_CHUNK) {
            let placeholders: Vec<String> = (1..=chunk.len()).map(|i| format!("${i}")).collect();
            let query = format!(
                "SELECT id FROM articles WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut q = sqlx::query_scalar::<_, String>(&query);
            for id in chunk {
                q = q.bind(id);
            }
            let rows = q
                .fetch_all(&self.pool)
                .await
                .context("querying existing article ids")?;
            found.extend(rows);
        }
        Ok(found)
    }

    /// Idempotent batch insert: identity conflicts are silent no-ops, never
    /// updates, never errors. Returns the number of rows actually written.
    pub async fn insert_articles(&self, records: &[NewsRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await.context("starting insert batch")?;
        let mut written = 0u64;
        for r in records {
            let res = sqlx::query(
                r#"
                INSERT INTO articles (id, source, title, url, summary, image_url, published_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&r.id)
            .bind(&r.source)
            .bind(&r.title)
            .bind(&r.url)
            .bind(&r.summary)
            .bind(&r.image_url)
            .bind(r.published_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("inserting article {}", r.id))?;
            written += res.rows_affected();
        }
        tx.commit().await.context("committing insert batch")?;
        Ok(written)
    }

    /// Most recent rows, newest first.
    pub async fn recent_articles(&self, limit: i64) -> Result<Vec<ArticleRow>> {
        let query = format!("{SELECT_ARTICLE} ORDER BY published_at DESC LIMIT $1");
        sqlx::query_as::<_, ArticleRow>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("querying recent articles")
    }

    /// Rows inside a window, newest first. Backs the by-date endpoint.
    pub async fn published_between(
        &self,
        window: &DailyWindow,
        limit: i64,
    ) -> Result<Vec<ArticleRow>> {
        let query = format!(
            "{SELECT_ARTICLE} WHERE published_at >= $1 AND published_at < $2 \
             ORDER BY published_at DESC LIMIT $3"
        );
        sqlx::query_as::<_, ArticleRow>(&query)
            .bind(window.start)
            .bind(window.end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("querying articles by date")
    }
}
