//! Read-only export of the snapshot store as Prometheus text exposition.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{BalanceSet, LiquidStakingState, Pair, Pool, PriceTable};
use crate::store::SnapshotStore;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Point-in-time copy of every domain.
///
/// Taken as five independent lock acquisitions, so two domains may straddle
/// different refresh generations; that staleness bound is accepted in
/// exchange for never blocking writers behind a global lock.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub pairs: HashMap<u64, Pair>,
    pub pools: HashMap<u64, Pool>,
    pub prices: PriceTable,
    pub liquid_staking: Option<LiquidStakingState>,
    pub balances: BalanceSet,
}

impl Snapshot {
    pub async fn take(store: &SnapshotStore) -> Self {
        Self {
            pairs: store.pairs().await,
            pools: store.pools().await,
            prices: store.prices().await,
            liquid_staking: store.liquid_staking().await,
            balances: store.balances().await,
        }
    }
}

/// Renders one flat gauge sample per member and attribute.
///
/// Members are sorted by id/denom/address so output is stable between
/// scrapes. Domains without data emit nothing, not even their header
/// lines.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    render_pairs(&mut out, &snapshot.pairs);
    render_pools(&mut out, &snapshot.pools);
    render_prices(&mut out, &snapshot.prices);
    render_liquid_staking(&mut out, snapshot.liquid_staking.as_ref());
    render_balances(&mut out, &snapshot.balances);
    out
}

fn render_pairs(out: &mut String, pairs: &HashMap<u64, Pair>) {
    let mut ids: Vec<u64> = pairs.keys().copied().collect();
    ids.sort_unstable();
    if ids.is_empty() {
        return;
    }

    header(out, "poolwatch_pair_orders", "Cumulative order count on the pair");
    for id in &ids {
        sample_id(out, "poolwatch_pair_orders", "pair_id", *id, pairs[id].num_orders as f64);
    }

    if ids.iter().any(|id| pairs[id].last_price.is_some()) {
        header(out, "poolwatch_pair_last_price", "Price of the pair's most recent trade");
        for id in &ids {
            if let Some(price) = pairs[id].last_price {
                sample_id(out, "poolwatch_pair_last_price", "pair_id", *id, gauge(price));
            }
        }
    }
}

fn render_pools(out: &mut String, pools: &HashMap<u64, Pool>) {
    let mut ids: Vec<u64> = pools.keys().copied().collect();
    ids.sort_unstable();
    if ids.is_empty() {
        return;
    }

    let deposits = "poolwatch_pool_deposit_requests";
    header(out, deposits, "Cumulative deposit request count on the pool");
    for id in &ids {
        sample_id(out, deposits, "pool_id", *id, pools[id].num_deposit_requests as f64);
    }
    let withdraws = "poolwatch_pool_withdraw_requests";
    header(out, withdraws, "Cumulative withdraw request count on the pool");
    for id in &ids {
        sample_id(out, withdraws, "pool_id", *id, pools[id].num_withdraw_requests as f64);
    }
    header(out, "poolwatch_pool_price", "Pool spot price, quote per base");
    for id in &ids {
        sample_id(out, "poolwatch_pool_price", "pool_id", *id, gauge(pools[id].price));
    }
    header(out, "poolwatch_pool_value", "Total pool reserve value in the reference unit");
    for id in &ids {
        sample_id(out, "poolwatch_pool_value", "pool_id", *id, gauge(pools[id].value));
    }
}

fn render_prices(out: &mut String, prices: &PriceTable) {
    let mut denoms: Vec<&String> = prices.keys().collect();
    denoms.sort();
    if denoms.is_empty() {
        return;
    }

    header(out, "poolwatch_price", "Oracle unit price of the denom");
    for denom in denoms {
        sample(out, "poolwatch_price", &[("denom", denom.as_str())], gauge(prices[denom]));
    }
}

fn render_liquid_staking(out: &mut String, state: Option<&LiquidStakingState>) {
    let Some(state) = state else {
        return;
    };

    header(out, "poolwatch_mint_rate", "Derivative token mint rate");
    sample(out, "poolwatch_mint_rate", &[], gauge(state.mint_rate));
    header(out, "poolwatch_derivative_supply", "Total derivative token supply");
    sample(out, "poolwatch_derivative_supply", &[], gauge(state.derivative_supply));
}

fn render_balances(out: &mut String, balances: &BalanceSet) {
    let mut addresses: Vec<&String> = balances.keys().collect();
    addresses.sort();
    if addresses.iter().all(|address| balances[*address].is_empty()) {
        return;
    }

    header(out, "poolwatch_balance_amount", "Tracked address balance, unit-scaled");
    for address in &addresses {
        for entry in &balances[*address] {
            let labels = [("address", address.as_str()), ("denom", entry.denom.as_str())];
            sample(out, "poolwatch_balance_amount", &labels, gauge(entry.amount));
        }
    }
    header(out, "poolwatch_balance_value", "Tracked address balance valued at the oracle price");
    for address in &addresses {
        for entry in &balances[*address] {
            let labels = [("address", address.as_str()), ("denom", entry.denom.as_str())];
            sample(out, "poolwatch_balance_value", &labels, gauge(entry.value));
        }
    }
}

fn header(out: &mut String, name: &str, help: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} gauge");
}

/// One sample labelled by a numeric id; ids never need escaping.
fn sample_id(out: &mut String, name: &str, key: &str, id: u64, value: f64) {
    let _ = writeln!(out, "{name}{{{key}=\"{id}\"}} {value}");
}

fn sample(out: &mut String, name: &str, labels: &[(&str, &str)], value: f64) {
    out.push_str(name);
    if !labels.is_empty() {
        out.push('{');
        for (i, (key, val)) in labels.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{key}=\"{}\"", escape_label(val));
        }
        out.push('}');
    }
    let _ = writeln!(out, " {value}");
}

/// The final float conversion for emission; everything upstream is decimal.
fn gauge(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn escape_label(value: &str) -> Cow<'_, str> {
    if value.contains(['\\', '"', '\n']) {
        Cow::Owned(
            value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(value)
    }
}
