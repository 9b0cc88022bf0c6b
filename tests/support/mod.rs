use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;

use poolwatch::client::{CoinRecord, NodeClient, PairRecord, PoolRecord, PriceFeed, StakingRecord};
use poolwatch::models::PriceTable;

pub fn dec(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap()
}

pub fn coin(denom: &str, amount: u64) -> CoinRecord {
    CoinRecord {
        denom: denom.to_string(),
        amount,
    }
}

pub fn pair_record(id: u64, base: &str, quote: &str) -> PairRecord {
    PairRecord {
        id,
        base_denom: base.to_string(),
        quote_denom: quote.to_string(),
        last_order_id: 0,
        last_price: None,
        current_batch_id: 1,
    }
}

pub fn pool_record(id: u64, pair_id: u64, balances: &[(&str, u64)]) -> PoolRecord {
    PoolRecord {
        id,
        pair_id,
        last_deposit_request_id: 0,
        last_withdraw_request_id: 0,
        balances: balances
            .iter()
            .map(|(denom, amount)| coin(denom, *amount))
            .collect(),
    }
}

/// In-memory [`NodeClient`] with switchable failures and an optional
/// simulated network delay.
#[derive(Debug, Clone, Default)]
pub struct MockNode {
    pairs: Vec<PairRecord>,
    pools: Vec<PoolRecord>,
    staking: Option<StakingRecord>,
    balances: HashMap<String, Vec<CoinRecord>>,
    fail_pairs: bool,
    fail_balances_for: Option<String>,
    delay: Option<Duration>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pairs(mut self, pairs: Vec<PairRecord>) -> Self {
        self.pairs = pairs;
        self
    }

    pub fn with_pools(mut self, pools: Vec<PoolRecord>) -> Self {
        self.pools = pools;
        self
    }

    pub fn with_staking(mut self, staking: StakingRecord) -> Self {
        self.staking = Some(staking);
        self
    }

    pub fn with_balances(mut self, address: &str, coins: Vec<CoinRecord>) -> Self {
        self.balances.insert(address.to_string(), coins);
        self
    }

    pub fn fail_on_pairs(mut self) -> Self {
        self.fail_pairs = true;
        self
    }

    pub fn fail_balances_for(mut self, address: &str) -> Self {
        self.fail_balances_for = Some(address.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn query_pairs(&self) -> Result<Vec<PairRecord>> {
        self.simulate_latency().await;
        if self.fail_pairs {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.pairs.clone())
    }

    async fn query_pools(&self) -> Result<Vec<PoolRecord>> {
        self.simulate_latency().await;
        Ok(self.pools.clone())
    }

    async fn query_liquid_staking_state(&self) -> Result<StakingRecord> {
        self.simulate_latency().await;
        self.staking.ok_or_else(|| anyhow!("state unavailable"))
    }

    async fn query_balances(&self, address: &str) -> Result<Vec<CoinRecord>> {
        self.simulate_latency().await;
        if self.fail_balances_for.as_deref() == Some(address) {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.balances.get(address).cloned().unwrap_or_default())
    }
}

/// In-memory [`PriceFeed`].
#[derive(Debug, Clone, Default)]
pub struct MockPriceFeed {
    prices: PriceTable,
    fail: bool,
    delay: Option<Duration>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, denom: &str, price: &str) -> Self {
        self.prices.insert(denom.to_string(), dec(price));
        self
    }

    pub fn fail_on_fetch(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn live_prices(&self) -> Result<PriceTable> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(anyhow!("bad status code: 502"));
        }
        Ok(self.prices.clone())
    }
}
