use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Numeric settings shared by the accumulator, matcher and service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlementConfig {
    /// Balances within this distance of zero count as settled.
    pub tolerance: Decimal,
    /// Decimal places transfers and rendered balances are rounded to.
    pub scale: u32,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            tolerance: dec!(0.000001),
            scale: 2,
        }
    }
}

impl SettlementConfig {
    /// Round to the configured scale (banker's rounding on the midpoint).
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.scale)
    }

    pub fn is_settled(&self, amount: Decimal) -> bool {
        amount.abs() <= self.tolerance
    }
}
