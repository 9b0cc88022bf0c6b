mod balance;
mod pair;
mod pool;
mod staking;

pub use balance::BalanceEntry;
pub use pair::Pair;
pub use pool::Pool;
pub use staking::LiquidStakingState;

use std::collections::HashMap;

use rust_decimal::Decimal;

/// Latest known unit price per denom, replaced wholesale on each refresh.
pub type PriceTable = HashMap<String, Decimal>;

/// Scaled, valued balances per tracked address.
pub type BalanceSet = HashMap<String, Vec<BalanceEntry>>;
