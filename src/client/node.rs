//! Typed client for the chain node's REST (gRPC-gateway) API.
//!
//! The chain encodes integers and fixed-point decimals as JSON strings;
//! everything is parsed into `u64`/`Decimal` here so the core never
//! touches a raw payload.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Deadline applied to every node request; an expiry is an ordinary fetch
/// failure handled at the refresh-task boundary.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A pair as reported by the node's liquidity module.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRecord {
    pub id: u64,
    pub base_denom: String,
    pub quote_denom: String,
    pub last_order_id: u64,
    pub last_price: Option<Decimal>,
    pub current_batch_id: u64,
}

/// A pool as reported by the node, reserves still raw and unscaled.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolRecord {
    pub id: u64,
    pub pair_id: u64,
    pub last_deposit_request_id: u64,
    pub last_withdraw_request_id: u64,
    pub balances: Vec<CoinRecord>,
}

impl PoolRecord {
    /// Raw reserve amount of one denom, zero when the pool does not hold it.
    pub fn reserve_of(&self, denom: &str) -> u64 {
        self.balances
            .iter()
            .find(|coin| coin.denom == denom)
            .map(|coin| coin.amount)
            .unwrap_or(0)
    }
}

/// A (denom, raw amount) entry from the node.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinRecord {
    pub denom: String,
    pub amount: u64,
}

/// Liquid-staking module state, supply still raw and unscaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StakingRecord {
    pub mint_rate: Decimal,
    pub derivative_supply: u64,
}

/// Read-only queries against the chain node.
///
/// Every call is idempotent and may fail with a transport or deadline
/// error; callers treat any failure as "no data this cycle".
#[async_trait::async_trait]
pub trait NodeClient: Send + Sync {
    async fn query_pairs(&self) -> Result<Vec<PairRecord>>;

    async fn query_pools(&self) -> Result<Vec<PoolRecord>>;

    async fn query_liquid_staking_state(&self) -> Result<StakingRecord>;

    async fn query_balances(&self, address: &str) -> Result<Vec<CoinRecord>>;
}

/// [`NodeClient`] over the node's REST API.
pub struct RestNodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestNodeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, false)
    }

    /// `insecure` accepts invalid TLS certificates, for nodes fronted by
    /// self-signed proxies.
    pub fn with_options(base_url: impl Into<String>, insecure: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(insecure)
            .build()
            .context("build node http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
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
            return Err(anyhow!("node API error: {status} - {body}"));
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("decode response from {url}"))
    }
}

#[async_trait::async_trait]
impl NodeClient for RestNodeClient {
    async fn query_pairs(&self) -> Result<Vec<PairRecord>> {
        let body: PairsResponse = self.get_json("/dex/liquidity/v1/pairs").await?;
        body.pairs.into_iter().map(WirePair::into_record).collect()
    }

    async fn query_pools(&self) -> Result<Vec<PoolRecord>> {
        let body: PoolsResponse = self.get_json("/dex/liquidity/v1/pools").await?;
        body.pools.into_iter().map(WirePool::into_record).collect()
    }

    async fn query_liquid_staking_state(&self) -> Result<StakingRecord> {
        let body: StakingStateResponse = self.get_json("/dex/liquidstaking/v1/state").await?;
        body.state.into_record()
    }

    async fn query_balances(&self, address: &str) -> Result<Vec<CoinRecord>> {
        let body: BalancesResponse = self
            .get_json(&format!("/cosmos/bank/v1beta1/balances/{address}"))
            .await?;
        body.balances
            .into_iter()
            .map(WireCoin::into_record)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct PairsResponse {
    #[serde(default)]
    pairs: Vec<WirePair>,
}

#[derive(Debug, Deserialize)]
struct WirePair {
    id: String,
    base_coin_denom: String,
    quote_coin_denom: String,
    last_order_id: String,
    last_price: Option<String>,
    current_batch_id: String,
}

impl WirePair {
    fn into_record(self) -> Result<PairRecord> {
        Ok(PairRecord {
            id: parse_u64(&self.id, "pair id")?,
            last_price: self
                .last_price
                .as_deref()
                .map(|raw| parse_decimal(raw, "pair last_price"))
                .transpose()?,
            base_denom: self.base_coin_denom,
            quote_denom: self.quote_coin_denom,
            last_order_id: parse_u64(&self.last_order_id, "pair last_order_id")?,
            current_batch_id: parse_u64(&self.current_batch_id, "pair current_batch_id")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PoolsResponse {
    #[serde(default)]
    pools: Vec<WirePool>,
}

#[derive(Debug, Deserialize)]
struct WirePool {
    id: String,
    pair_id: String,
    last_deposit_request_id: String,
    last_withdraw_request_id: String,
    #[serde(default)]
    balances: Vec<WireCoin>,
}

impl WirePool {
    fn into_record(self) -> Result<PoolRecord> {
        Ok(PoolRecord {
            id: parse_u64(&self.id, "pool id")?,
            pair_id: parse_u64(&self.pair_id, "pool pair_id")?,
            last_deposit_request_id: parse_u64(
                &self.last_deposit_request_id,
                "pool last_deposit_request_id",
            )?,
            last_withdraw_request_id: parse_u64(
                &self.last_withdraw_request_id,
                "pool last_withdraw_request_id",
            )?,
            balances: self
                .balances
                .into_iter()
                .map(WireCoin::into_record)
                .collect::<Result<_>>()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireCoin {
    denom: String,
    amount: String,
}

impl WireCoin {
    fn into_record(self) -> Result<CoinRecord> {
        Ok(CoinRecord {
            amount: parse_u64(&self.amount, "coin amount")?,
            denom: self.denom,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StakingStateResponse {
    state: WireStakingState,
}

#[derive(Debug, Deserialize)]
struct WireStakingState {
    mint_rate: String,
    derivative_total_supply: String,
}

impl WireStakingState {
    fn into_record(self) -> Result<StakingRecord> {
        Ok(StakingRecord {
            mint_rate: parse_decimal(&self.mint_rate, "mint_rate")?,
            derivative_supply: parse_u64(&self.derivative_total_supply, "derivative_total_supply")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<WireCoin>,
}

fn parse_u64(raw: &str, field: &str) -> Result<u64> {
    raw.parse()
        .with_context(|| format!("parse {field}: {raw:?}"))
}

fn parse_decimal(raw: &str, field: &str) -> Result<Decimal> {
    Decimal::from_str(raw).with_context(|| format!("parse {field}: {raw:?}"))
}
