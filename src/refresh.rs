//! The five refresh tasks that keep the snapshot store current.
//!
//! Each task fetches, transforms, and ends in a single wholesale store
//! replace; a failed cycle leaves its domain at the previous value.
//! Locks are only taken around in-memory reads and the final swap, never
//! across a network call.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use crate::client::{NodeClient, PoolRecord, PriceFeed};
use crate::models::{BalanceEntry, BalanceSet, LiquidStakingState, Pair, Pool, PriceTable};
use crate::store::SnapshotStore;

/// Raw chain amounts are integers scaled by this fixed unit factor.
const UNIT_FACTOR: u64 = 1_000_000;

fn unit_scale(raw: u64) -> Decimal {
    Decimal::from(raw) / Decimal::from(UNIT_FACTOR)
}

/// Why a refresh cycle was abandoned.
///
/// All variants are recovered at the scheduler boundary: logged, the
/// affected domain left at its prior value, next tick proceeds as usual.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// A collaborator call failed (transport, deadline, bad status).
    #[error("fetch failed: {0:#}")]
    Fetch(#[from] anyhow::Error),

    /// Two collaborator responses disagree: a pool references a pair the
    /// node did not report.
    #[error("pool {pool_id} references unknown pair {pair_id}")]
    InconsistentState { pool_id: u64, pair_id: u64 },

    /// A denom that must be valued has no entry in the price table.
    #[error("no price for denom {denom:?}")]
    MissingPrice { denom: String },
}

/// Runs the fetch/transform/replace cycle for every data domain.
pub struct Refresher {
    node: Arc<dyn NodeClient>,
    price_feed: Arc<dyn PriceFeed>,
    store: Arc<SnapshotStore>,
    tracked_addresses: Vec<String>,
}

impl Refresher {
    pub fn new(
        node: Arc<dyn NodeClient>,
        price_feed: Arc<dyn PriceFeed>,
        store: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            node,
            price_feed,
            store,
            tracked_addresses: Vec::new(),
        }
    }

    /// Sets the fixed list of addresses whose balances are tracked.
    pub fn with_tracked_addresses(mut self, addresses: Vec<String>) -> Self {
        self.tracked_addresses = addresses;
        self
    }

    /// Rebuilds the pair collection from scratch and replaces it.
    pub async fn refresh_pairs(&self) -> Result<(), RefreshError> {
        let records = self.node.query_pairs().await?;
        let mut pairs = HashMap::with_capacity(records.len());
        for record in records {
            pairs.insert(
                record.id,
                Pair {
                    id: record.id,
                    base_denom: record.base_denom,
                    quote_denom: record.quote_denom,
                    num_orders: record.last_order_id,
                    last_price: record.last_price,
                    current_batch_id: record.current_batch_id,
                },
            );
        }
        self.store.replace_pairs(pairs).await;
        Ok(())
    }

    /// Replaces the price table with the feed's latest snapshot.
    pub async fn refresh_prices(&self) -> Result<(), RefreshError> {
        let prices = self.price_feed.live_prices().await?;
        self.store.replace_prices(prices).await;
        Ok(())
    }

    /// Recomputes every pool against the current pair and price tables.
    ///
    /// A no-op until both dependencies have refreshed at least once. A pool
    /// referencing an unknown pair aborts the whole cycle; a pool that
    /// cannot be priced is skipped and the rest of the batch still
    /// publishes.
    pub async fn refresh_pools(&self) -> Result<(), RefreshError> {
        let records = self.node.query_pools().await?;

        let pairs = self.store.pairs().await;
        if pairs.is_empty() {
            return Ok(());
        }
        let prices = self.store.prices().await;
        if prices.is_empty() {
            return Ok(());
        }

        let mut pools = HashMap::with_capacity(records.len());
        for record in records {
            let pair =
                pairs
                    .get(&record.pair_id)
                    .ok_or(RefreshError::InconsistentState {
                        pool_id: record.id,
                        pair_id: record.pair_id,
                    })?;
            if let Some(pool) = derive_pool(&record, pair, &prices) {
                pools.insert(pool.id, pool);
            }
        }
        self.store.replace_pools(pools).await;
        Ok(())
    }

    /// Replaces the liquid-staking singleton.
    pub async fn refresh_liquid_staking(&self) -> Result<(), RefreshError> {
        let record = self.node.query_liquid_staking_state().await?;
        self.store
            .replace_liquid_staking(LiquidStakingState {
                mint_rate: record.mint_rate,
                derivative_supply: unit_scale(record.derivative_supply),
            })
            .await;
        Ok(())
    }

    /// Queries and values every tracked address, all or nothing.
    ///
    /// A no-op until the price table has refreshed once. Unlike pools, one
    /// failed address query or missing price abandons the entire cycle: a
    /// partially refreshed balance set would read as an outflow.
    pub async fn refresh_balances(&self) -> Result<(), RefreshError> {
        if self.tracked_addresses.is_empty() {
            return Ok(());
        }
        let prices = self.store.prices().await;
        if prices.is_empty() {
            return Ok(());
        }

        let mut balances = BalanceSet::with_capacity(self.tracked_addresses.len());
        for address in &self.tracked_addresses {
            let coins = self.node.query_balances(address).await?;
            let mut entries = Vec::with_capacity(coins.len());
            for coin in coins {
                let unit_price =
                    prices
                        .get(&coin.denom)
                        .ok_or_else(|| RefreshError::MissingPrice {
                            denom: coin.denom.clone(),
                        })?;
                let amount = unit_scale(coin.amount);
                entries.push(BalanceEntry {
                    denom: coin.denom,
                    amount,
                    value: amount * *unit_price,
                });
            }
            balances.insert(address.clone(), entries);
        }
        self.store.replace_balances(balances).await;
        Ok(())
    }
}

/// Derives one pool's spot price and total value.
///
/// Returns `None` when the pool cannot be priced against the current
/// tables (no base reserve, or a reserve denom missing from the price
/// table), in which case the pool is skipped for this cycle.
fn derive_pool(record: &PoolRecord, pair: &Pair, prices: &PriceTable) -> Option<Pool> {
    let quote_reserve = Decimal::from(record.reserve_of(&pair.quote_denom));
    let base_reserve = Decimal::from(record.reserve_of(&pair.base_denom));
    let Some(price) = quote_reserve.checked_div(base_reserve) else {
        warn!(
            pool_id = record.id,
            base_denom = %pair.base_denom,
            "pool has no base reserve, skipping"
        );
        return None;
    };

    let mut value = Decimal::ZERO;
    for coin in &record.balances {
        let Some(unit_price) = prices.get(&coin.denom) else {
            warn!(
                pool_id = record.id,
                denom = %coin.denom,
                "no price for reserve denom, skipping pool"
            );
            return None;
        };
        value += *unit_price * unit_scale(coin.amount);
    }

    Some(Pool {
        id: record.id,
        pair_id: record.pair_id,
        num_deposit_requests: record.last_deposit_request_id,
        num_withdraw_requests: record.last_withdraw_request_id,
        price,
        value,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::client::CoinRecord;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    fn pair() -> Pair {
        Pair {
            id: 1,
            base_denom: "ubase".to_string(),
            quote_denom: "uquote".to_string(),
            num_orders: 0,
            last_price: None,
            current_batch_id: 1,
        }
    }

    fn pool_record(balances: &[(&str, u64)]) -> PoolRecord {
        PoolRecord {
            id: 10,
            pair_id: 1,
            last_deposit_request_id: 2,
            last_withdraw_request_id: 3,
            balances: balances
                .iter()
                .map(|(denom, amount)| CoinRecord {
                    denom: denom.to_string(),
                    amount: *amount,
                })
                .collect(),
        }
    }

    #[test]
    fn unit_scale_divides_by_fixed_factor() {
        assert_eq!(unit_scale(5_000_000), dec("5"));
        assert_eq!(unit_scale(1), dec("0.000001"));
    }

    #[test]
    fn spot_price_is_raw_reserve_ratio() {
        let prices = PriceTable::from([
            ("ubase".to_string(), dec("1")),
            ("uquote".to_string(), dec("1")),
        ]);
        let record = pool_record(&[("ubase", 100), ("uquote", 200)]);

        let pool = derive_pool(&record, &pair(), &prices).unwrap();
        assert_eq!(pool.price, dec("2"));
    }

    #[test]
    fn value_sums_scaled_reserves_at_unit_prices() {
        let prices = PriceTable::from([
            ("ubase".to_string(), dec("2.5")),
            ("uquote".to_string(), dec("0.5")),
        ]);
        // 5.0 base at 2.5 plus 2.0 quote at 0.5.
        let record = pool_record(&[("ubase", 5_000_000), ("uquote", 2_000_000)]);

        let pool = derive_pool(&record, &pair(), &prices).unwrap();
        assert_eq!(pool.value, dec("13.5"));
        assert_eq!(pool.num_deposit_requests, 2);
        assert_eq!(pool.num_withdraw_requests, 3);
    }

    #[test]
    fn missing_reserve_price_skips_pool() {
        let prices = PriceTable::from([("ubase".to_string(), dec("1"))]);
        let record = pool_record(&[("ubase", 100), ("uquote", 200)]);

        assert_eq!(derive_pool(&record, &pair(), &prices), None);
    }

    #[test]
    fn zero_base_reserve_skips_pool() {
        let prices = PriceTable::from([("uquote".to_string(), dec("1"))]);
        let record = pool_record(&[("uquote", 200)]);

        assert_eq!(derive_pool(&record, &pair(), &prices), None);
    }
}
