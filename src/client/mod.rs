//! Collaborator capability interfaces and their HTTP implementations.
//!
//! The core only ever sees the typed records defined here; every
//! loosely-typed wire payload is decoded and validated at this boundary.

mod node;
mod price_feed;

pub use node::{CoinRecord, NodeClient, PairRecord, PoolRecord, RestNodeClient, StakingRecord};
pub use price_feed::{LivePriceClient, PriceFeed};
