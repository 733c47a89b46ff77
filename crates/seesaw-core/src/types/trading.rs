//! Trading-related data structures: orders, fills, and account snapshots.
//!
//! These types flow between the engine and the gateway. Prices and amounts
//! are `Decimal` so that re-sizing across many cycles does not drift.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::Side;
use super::pair::Pair;

// ---------------------------------------------------------------------------
// Order identifiers
// ---------------------------------------------------------------------------

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Order request (engine → gateway)
// ---------------------------------------------------------------------------

/// A limit order the engine wants placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Traded pair.
    pub pair: Pair,
    /// Buy or sell.
    pub side: Side,
    /// Limit price in quote currency.
    pub price: Decimal,
    /// Quantity in base currency.
    pub amount: Decimal,
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} order pair \"{}\", amount \"{}\", price \"{}\"",
            self.side, self.pair, self.amount, self.price
        )
    }
}

/// An order the exchange accepted.
///
/// `amount` is the quantity actually on the book, which may be smaller than
/// requested once the exchange's lot size is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub amount: Decimal,
}

// ---------------------------------------------------------------------------
// Fill (gateway → engine)
// ---------------------------------------------------------------------------

/// One executed trade belonging to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Order the trade belongs to.
    pub order_id: OrderId,
    /// Executed base quantity.
    pub amount: Decimal,
    /// Execution time (ms since epoch).
    pub timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Account snapshot
// ---------------------------------------------------------------------------

/// API key rights relevant to the trading loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    /// Key may place orders.
    pub trade: bool,
    /// Key may read account and trade history.
    pub info: bool,
}

/// Account permissions and free balances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub permissions: Permissions,
    /// Free balance per asset, keyed by upper-case asset code.
    pub balances: HashMap<String, Decimal>,
}

impl AccountInfo {
    /// Free balance of `asset`, zero if the account holds none.
    pub fn balance(&self, asset: &str) -> Decimal {
        self.balances
            .get(&asset.to_ascii_uppercase())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_request_display() {
        let req = OrderRequest {
            pair: "BTC_USD".parse().unwrap(),
            side: Side::Sell,
            price: dec!(100),
            amount: dec!(10),
        };
        assert_eq!(
            req.to_string(),
            "SELL order pair \"BTC_USD\", amount \"10\", price \"100\""
        );
    }

    #[test]
    fn missing_balance_is_zero() {
        let mut info = AccountInfo::default();
        info.balances.insert("BTC".into(), dec!(1.5));
        assert_eq!(info.balance("btc"), dec!(1.5));
        assert_eq!(info.balance("ETH"), Decimal::ZERO);
    }
}
