use rust_decimal::Decimal;

/// Mint rate and supply figures for the chain's liquid-staking derivative
/// token. Singleton, replaced wholesale on each refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidStakingState {
    pub mint_rate: Decimal,
    /// Total derivative-token supply, already unit-scaled.
    pub derivative_supply: Decimal,
}
