use rust_decimal::Decimal;

/// A liquidity reserve belonging to a pair.
///
/// Derived entity: computing one requires a resolved [`Pair`] and a fully
/// populated price table, so pools are only published once both dependency
/// domains have refreshed at least once.
///
/// [`Pair`]: super::Pair
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    pub id: u64,
    pub pair_id: u64,
    pub num_deposit_requests: u64,
    pub num_withdraw_requests: u64,
    /// Spot price, quote per base, as a ratio of the raw reserves.
    pub price: Decimal,
    /// Total value of all reserve balances in the reference unit.
    pub value: Decimal,
}
