use rust_decimal::Decimal;

/// A tradable base/quote denom combination tracked by the venue.
///
/// Built from scratch on every pairs refresh and replaced wholesale;
/// individual pairs are never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub id: u64,
    pub base_denom: String,
    pub quote_denom: String,
    /// Cumulative order count, taken from the venue's last order id.
    pub num_orders: u64,
    /// Price of the most recent trade, absent until the pair has traded.
    pub last_price: Option<Decimal>,
    pub current_batch_id: u64,
}
