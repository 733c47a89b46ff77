//! Symbol trading rules from `exchangeInfo`.
//!
//! Binance rejects a quantity that is not a multiple of the LOT_SIZE step
//! and a price that is not a multiple of the PRICE_FILTER tick. Quantities
//! are floored to the step; prices move to the tick on the side that favours
//! the account (sells up, buys down).

use rust_decimal::{Decimal, RoundingStrategy};
use seesaw_core::Side;
use seesaw_core::error::GatewayError;

use super::spot::{SymbolFilter, SymbolInfo};

/// Binance's filter-failure error code.
const FILTER_FAILURE: i64 = -1013;

/// Precision used when a symbol publishes no step or tick.
const MAX_DECIMALS: u32 = 8;

/// Step sizes for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolRules {
    pub tick_size: Option<Decimal>,
    pub step_size: Option<Decimal>,
    pub min_qty: Decimal,
}

impl SymbolRules {
    pub fn from_info(info: &SymbolInfo) -> Self {
        let mut rules = Self::default();
        for filter in &info.filters {
            match *filter {
                SymbolFilter::Price { tick_size } if tick_size > Decimal::ZERO => {
                    rules.tick_size = Some(tick_size);
                }
                SymbolFilter::LotSize { min_qty, step_size } => {
                    rules.min_qty = min_qty;
                    if step_size > Decimal::ZERO {
                        rules.step_size = Some(step_size);
                    }
                }
                _ => {}
            }
        }
        rules
    }

    /// Largest legal quantity not above `amount`.
    pub fn quantity(&self, amount: Decimal) -> Result<Decimal, GatewayError> {
        let qty = match self.step_size {
            Some(step) => snap(amount, step, RoundingStrategy::ToZero)?,
            None => amount.round_dp_with_strategy(MAX_DECIMALS, RoundingStrategy::ToZero),
        };
        if qty <= Decimal::ZERO || qty < self.min_qty {
            return Err(GatewayError::Rejected {
                code: FILTER_FAILURE,
                message: format!(
                    "quantity {amount} is below the LOT_SIZE minimum {} after rounding",
                    self.min_qty
                ),
            });
        }
        Ok(qty)
    }

    /// `price` moved onto the tick grid: up for sells, down for buys.
    pub fn price(&self, price: Decimal, side: Side) -> Result<Decimal, GatewayError> {
        let strategy = match side {
            Side::Sell => RoundingStrategy::AwayFromZero,
            Side::Buy => RoundingStrategy::ToZero,
        };
        let px = match self.tick_size {
            Some(tick) => snap(price, tick, strategy)?,
            None => price.round_dp_with_strategy(MAX_DECIMALS, strategy),
        };
        if px <= Decimal::ZERO {
            return Err(GatewayError::Rejected {
                code: FILTER_FAILURE,
                message: format!("price {price} rounds to zero on tick {:?}", self.tick_size),
            });
        }
        Ok(px)
    }
}

/// Round `value` to a whole multiple of `step`.
fn snap(
    value: Decimal,
    step: Decimal,
    strategy: RoundingStrategy,
) -> Result<Decimal, GatewayError> {
    value
        .checked_div(step)
        .map(|units| units.round_dp_with_strategy(0, strategy))
        .and_then(|units| units.checked_mul(step))
        .map(|v| v.normalize())
        .ok_or_else(|| GatewayError::Malformed(format!("cannot snap {value} to step {step}")))
}
