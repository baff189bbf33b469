// src/config.rs
//! Process configuration, read once at startup and passed by reference into
//! the pipeline. No module-level mutable state.

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;

// --- env names & defaults ---
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_URL_READONLY: &str = "DATABASE_URL_READONLY";
pub const ENV_MAX_DAILY_INSERTS: &str = "MAX_DAILY_INSERTS";
pub const ENV_TIMEZONE: &str = "NEWS_TZ";
pub const ENV_NEWS_LIMIT: &str = "NEWS_LIMIT";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

pub const DEFAULT_MAX_DAILY_INSERTS: u32 = 10;
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
pub const DEFAULT_NEWS_LIMIT: i64 = 10;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Configuration for one ingestion run.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_daily_inserts: u32,
    /// Reference timezone for day-boundary computation. Storage stays UTC.
    pub timezone: Tz,
}

impl Config {
    /// Build from the environment. A missing `DATABASE_URL` is a fatal
    /// startup error; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let raw = non_empty_env(ENV_DATABASE_URL)
            .ok_or_else(|| anyhow!("{ENV_DATABASE_URL} is not set"))?;
        let database_url = normalize_database_url(&raw);

        let max_daily_inserts = match non_empty_env(ENV_MAX_DAILY_INSERTS) {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("parsing {ENV_MAX_DAILY_INSERTS}={v}"))?,
            None => DEFAULT_MAX_DAILY_INSERTS,
        };

        Ok(Self {
            database_url,
            max_daily_inserts,
            timezone: reference_timezone()?,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reference timezone from `NEWS_TZ`, defaulting to America/Sao_Paulo.
pub fn reference_timezone() -> Result<Tz> {
    let name = non_empty_env(ENV_TIMEZONE).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    name.parse::<Tz>()
        .map_err(|_| anyhow!("unknown timezone id: {name}"))
}

/// Managed Postgres providers reject plaintext connections, so force
/// `sslmode=require` unless the URL already pins one.
pub fn normalize_database_url(raw: &str) -> String {
    let url = raw.trim();
    if url.contains("sslmode=") {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&sslmode=require")
    } else {
        format!("{url}?sslmode=require")
    }
}

/// Connection string for the read-side bins/API. Prefers the read-only
/// credential, falls back to the writer URL.
pub fn read_side_database_url() -> Result<String> {
    let raw = non_empty_env(ENV_DATABASE_URL_READONLY)
        .or_else(|| non_empty_env(ENV_DATABASE_URL))
        .ok_or_else(|| {
            anyhow!("neither {ENV_DATABASE_URL_READONLY} nor {ENV_DATABASE_URL} is set")
        })?;
    Ok(normalize_database_url(&raw))
}

/// Row cap for the snapshot export.
pub fn news_limit() -> Result<i64> {
    match non_empty_env(ENV_NEWS_LIMIT) {
        Some(v) => v
            .parse::<i64>()
            .with_context(|| format!("parsing {ENV_NEWS_LIMIT}={v}")),
        None => Ok(DEFAULT_NEWS_LIMIT),
    }
}

pub fn bind_addr() -> String {
    non_empty_env(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn sslmode_is_appended_when_missing() {
        assert_eq!(
            normalize_database_url("postgres://u:p@host/db"),
            "postgres://u:p@host/db?sslmode=require"
        );
        assert_eq!(
            normalize_database_url("postgres://u:p@host/db?application_name=x"),
            "postgres://u:p@host/db?application_name=x&sslmode=require"
        );
        // already pinned: untouched
        assert_eq!(
            normalize_database_url("postgres://u:p@host/db?sslmode=disable"),
            "postgres://u:p@host/db?sslmode=disable"
        );
    }

    #[serial_test::serial]
    #[test]
    fn from_env_requires_database_url() {
        env::remove_var(ENV_DATABASE_URL);
        env::remove_var(ENV_MAX_DAILY_INSERTS);
        env::remove_var(ENV_TIMEZONE);
        assert!(Config::from_env().is_err());

        env::set_var(ENV_DATABASE_URL, "postgres://u:p@host/db");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.max_daily_inserts, DEFAULT_MAX_DAILY_INSERTS);
        assert_eq!(cfg.timezone, chrono_tz::America::Sao_Paulo);
        assert!(cfg.database_url.ends_with("sslmode=require"));
        env::remove_var(ENV_DATABASE_URL);
    }

    #[serial_test::serial]
    #[test]
    fn quota_and_timezone_overrides_apply() {
        env::set_var(ENV_DATABASE_URL, "postgres://u:p@host/db");
        env::set_var(ENV_MAX_DAILY_INSERTS, "3");
        env::set_var(ENV_TIMEZONE, "UTC");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.max_daily_inserts, 3);
        assert_eq!(cfg.timezone, chrono_tz::UTC);

        env::set_var(ENV_MAX_DAILY_INSERTS, "not-a-number");
        assert!(Config::from_env().is_err());

        env::set_var(ENV_MAX_DAILY_INSERTS, "5");
        env::set_var(ENV_TIMEZONE, "Mars/Olympus_Mons");
        assert!(Config::from_env().is_err());

        env::remove_var(ENV_DATABASE_URL);
        env::remove_var(ENV_MAX_DAILY_INSERTS);
        env::remove_var(ENV_TIMEZONE);
    }

    #[serial_test::serial]
    #[test]
    fn read_side_prefers_readonly_credential() {
        env::set_var(ENV_DATABASE_URL, "postgres://writer@host/db");
        env::set_var(ENV_DATABASE_URL_READONLY, "postgres://reader@host/db");
        let url = read_side_database_url().unwrap();
        assert!(url.starts_with("postgres://reader@host/db"));
        env::remove_var(ENV_DATABASE_URL_READONLY);
        env::remove_var(ENV_DATABASE_URL);
    }
}
