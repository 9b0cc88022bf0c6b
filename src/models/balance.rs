use rust_decimal::Decimal;

/// One asset position held by a tracked address.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEntry {
    pub denom: String,
    /// Unit-scaled amount.
    pub amount: Decimal,
    /// `amount` valued at the denom's current unit price.
    pub value: Decimal,
}
