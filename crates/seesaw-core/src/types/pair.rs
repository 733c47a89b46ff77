//! Trading pair identifiers.
//!
//! Pairs are written `BASE_QUOTE` on the command line (e.g. `BTC_USD`). The
//! base currency is the one being sold at the enter price, so its balance
//! bounds the starting amount. Exchanges that use concatenated symbols get
//! `BASEQUOTE` from [`Pair::exchange_symbol`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeesawError;

/// A `BASE_QUOTE` trading pair, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    base: String,
    quote: String,
}

impl Pair {
    /// Base currency (first half of the pair).
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Concatenated exchange symbol, e.g. `BTCUSDT`.
    pub fn exchange_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = SeesawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SeesawError::Config("pair parameter can not be empty.".into()));
        }
        let Some((base, quote)) = s.split_once('_') else {
            return Err(SeesawError::Config(format!(
                "pair \"{s}\" must look like BASE_QUOTE"
            )));
        };
        let valid =
            |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid(base) || !valid(quote) {
            return Err(SeesawError::Config(format!(
                "pair \"{s}\" must look like BASE_QUOTE"
            )));
        }
        Ok(Self {
            base: base.to_ascii_uppercase(),
            quote: quote.to_ascii_uppercase(),
        })
    }
}

impl TryFrom<String> for Pair {
    type Error = SeesawError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.to_string()
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let pair: Pair = "btc_usd".parse().unwrap();
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.to_string(), "BTC_USD");
        assert_eq!(pair.exchange_symbol(), "BTCUSD");
    }

    #[test]
    fn empty_pair_rejected() {
        let err = "".parse::<Pair>().unwrap_err();
        assert_eq!(err.to_string(), "config error: pair parameter can not be empty.");
    }

    #[test]
    fn malformed_pairs_rejected() {
        for bad in ["BTCUSD", "_USD", "BTC_", "BTC-USD_X Y", "BTC/USD"] {
            assert!(bad.parse::<Pair>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn serde_as_string() {
        let pair: Pair = serde_json::from_str("\"eth_btc\"").unwrap();
        assert_eq!(serde_json::to_string(&pair).unwrap(), "\"ETH_BTC\"");
    }
}
