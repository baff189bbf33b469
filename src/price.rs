// src/price.rs
//! BTC price ticker: one stateless HTTP call to CoinGecko, written out as a
//! small JSON document for the frontend.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COINGECKO_SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_PRICE_PATH: &str = "public/btc_price.json";
const PRICE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Prices {
    #[serde(rename = "BTC_USD")]
    pub usd: f64,
    #[serde(rename = "BTC_BRL")]
    pub brl: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricePayload {
    pub updated_at: String,
    pub source: &'static str,
    pub prices: Prices,
}

pub fn build_price_payload(prices: Prices, updated_at: DateTime<Utc>) -> PricePayload {
    PricePayload {
        updated_at: updated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        source: "coingecko",
        prices,
    }
}

/// Fetch the current BTC price in USD and BRL.
pub async fn fetch_btc_prices(client: &reqwest::Client) -> Result<Prices> {
    let resp = client
        .get(COINGECKO_SIMPLE_PRICE_URL)
        .query(&[("ids", "bitcoin"), ("vs_currencies", "usd,brl")])
        .timeout(PRICE_TIMEOUT)
        .send()
        .await
        .context("requesting btc price")?
        .error_for_status()
        .context("btc price endpoint returned an error status")?;

    // Shape: {"bitcoin": {"usd": ..., "brl": ...}}
    let body: HashMap<String, HashMap<String, f64>> =
        resp.json().await.context("decoding btc price response")?;
    let bitcoin = body
        .get("bitcoin")
        .ok_or_else(|| anyhow!("price response missing 'bitcoin' entry"))?;
    let usd = *bitcoin
        .get("usd")
        .ok_or_else(|| anyhow!("price response missing usd quote"))?;
    let brl = *bitcoin
        .get("brl")
        .ok_or_else(|| anyhow!("price response missing brl quote"))?;
    Ok(Prices { usd, brl })
}

/// Compact JSON, parent directories created as needed.
pub fn write_price_file(path: &Path, payload: &PricePayload) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string(payload).context("serializing price payload")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
