//! Shared snapshot of the latest successfully refreshed state.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::models::{BalanceSet, LiquidStakingState, Pair, Pool, PriceTable};

/// Latest known value for each data domain, each behind its own lock.
///
/// Readers get a cloned point-in-time copy and never block each other; a
/// replace excludes readers and writers of its own domain only, so a slow
/// refresh in one domain cannot stall the others. There are no
/// partial-member operations: a domain's collection is always swapped
/// wholesale.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    pairs: RwLock<HashMap<u64, Pair>>,
    pools: RwLock<HashMap<u64, Pool>>,
    prices: RwLock<PriceTable>,
    liquid_staking: RwLock<Option<LiquidStakingState>>,
    balances: RwLock<BalanceSet>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pairs(&self) -> HashMap<u64, Pair> {
        self.pairs.read().await.clone()
    }

    pub async fn replace_pairs(&self, pairs: HashMap<u64, Pair>) {
        *self.pairs.write().await = pairs;
    }

    pub async fn pools(&self) -> HashMap<u64, Pool> {
        self.pools.read().await.clone()
    }

    pub async fn replace_pools(&self, pools: HashMap<u64, Pool>) {
        *self.pools.write().await = pools;
    }

    pub async fn prices(&self) -> PriceTable {
        self.prices.read().await.clone()
    }

    pub async fn replace_prices(&self, prices: PriceTable) {
        *self.prices.write().await = prices;
    }

    pub async fn liquid_staking(&self) -> Option<LiquidStakingState> {
        *self.liquid_staking.read().await
    }

    pub async fn replace_liquid_staking(&self, state: LiquidStakingState) {
        *self.liquid_staking.write().await = Some(state);
    }

    pub async fn balances(&self) -> BalanceSet {
        self.balances.read().await.clone()
    }

    pub async fn replace_balances(&self, balances: BalanceSet) {
        *self.balances.write().await = balances;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(id: u64) -> Pair {
        Pair {
            id,
            base_denom: "ubase".to_string(),
            quote_denom: "uquote".to_string(),
            num_orders: 0,
            last_price: None,
            current_batch_id: 1,
        }
    }

    #[tokio::test]
    async fn domains_start_empty() {
        let store = SnapshotStore::new();
        assert!(store.pairs().await.is_empty());
        assert!(store.pools().await.is_empty());
        assert!(store.prices().await.is_empty());
        assert!(store.liquid_staking().await.is_none());
        assert!(store.balances().await.is_empty());
    }

    #[tokio::test]
    async fn reads_are_point_in_time_copies() {
        let store = SnapshotStore::new();
        store
            .replace_pairs(HashMap::from([(1, pair(1))]))
            .await;

        let before = store.pairs().await;
        store
            .replace_pairs(HashMap::from([(2, pair(2)), (3, pair(3))]))
            .await;

        // The copy taken before the replace is unaffected by it.
        assert_eq!(before.len(), 1);
        assert!(before.contains_key(&1));
        assert_eq!(store.pairs().await.len(), 2);
    }
}
