//! Order sizing.
//!
//! A filled sell of `q` at the enter price yields `q * enter` quote currency,
//! which buys `q * enter / exit` base currency back at the exit price. Buys
//! carry their filled amount straight into the next sell, so only the buy
//! side is ever re-sized.

use rust_decimal::{Decimal, RoundingStrategy};
use seesaw_core::config::EngineSettings;
use seesaw_core::error::SeesawError;

/// Buy-side re-sizing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sizing {
    /// Fraction withheld for fees, `[0, 1)`.
    pub fee_rate: Decimal,
    /// Round toward zero to this many decimals.
    pub amount_decimals: Option<u32>,
}

impl Sizing {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            fee_rate: settings.fee_rate,
            amount_decimals: settings.amount_decimals,
        }
    }

    /// Amount of the buy that follows a sell fill of `filled`.
    pub fn next_buy_amount(
        &self,
        filled: Decimal,
        enter: Decimal,
        exit: Decimal,
    ) -> Result<Decimal, SeesawError> {
        let overflow = || SeesawError::Config(format!("buy amount for {filled} overflows"));

        let mut amount = filled
            .checked_mul(enter)
            .and_then(|v| v.checked_div(exit))
            .ok_or_else(overflow)?;

        if !self.fee_rate.is_zero() {
            amount = amount
                .checked_mul(Decimal::ONE - self.fee_rate)
                .ok_or_else(overflow)?;
        }
        if let Some(dp) = self.amount_decimals {
            amount = amount.round_dp_with_strategy(dp, RoundingStrategy::ToZero);
        }
        Ok(amount)
    }
}
