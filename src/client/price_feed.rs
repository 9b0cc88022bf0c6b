//! Client for the price-feed HTTP API.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::PriceTable;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Live oracle prices per denom, a single idempotent HTTP call.
#[async_trait::async_trait]
pub trait PriceFeed: Send + Sync {
    async fn live_prices(&self) -> Result<PriceTable>;
}

/// [`PriceFeed`] over the venue's public API gateway.
pub struct LivePriceClient {
    client: reqwest::Client,
    base_url: String,
}

impl LivePriceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build price-feed http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl PriceFeed for LivePriceClient {
    async fn live_prices(&self) -> Result<PriceTable> {
        let url = format!("{}/asset/live", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("request {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("price feed error: {status} - {body}"));
        }

        let body: LivePricesResponse = response
            .json()
            .await
            .with_context(|| format!("decode response from {url}"))?;

        let mut prices = PriceTable::with_capacity(body.data.len());
        for asset in body.data {
            let price = Decimal::try_from(asset.price_oracle)
                .with_context(|| format!("oracle price for {}", asset.denom))?;
            prices.insert(asset.denom, price);
        }
        Ok(prices)
    }
}

#[derive(Debug, Deserialize)]
struct LivePricesResponse {
    #[serde(default)]
    data: Vec<WireAssetPrice>,
}

#[derive(Debug, Deserialize)]
struct WireAssetPrice {
    denom: String,
    #[serde(rename = "priceOracle")]
    price_oracle: f64,
}
