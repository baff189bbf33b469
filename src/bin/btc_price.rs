//! Price ticker: fetch the current BTC quote and write public/btc_price.json.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use btcheck::price::{
    build_price_payload, fetch_btc_prices, write_price_file, DEFAULT_PRICE_PATH,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    btcheck::init_tracing();

    let client = reqwest::Client::builder()
        .user_agent(concat!("btcheck/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")?;

    let prices = fetch_btc_prices(&client).await?;
    let payload = build_price_payload(prices, Utc::now());
    write_price_file(Path::new(DEFAULT_PRICE_PATH), &payload)?;

    info!(usd = prices.usd, brl = prices.brl, "btc price updated");
    Ok(())
}
