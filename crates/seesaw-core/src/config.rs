//! Configuration for a trading session.
//!
//! A session is described by two immutable values built once at startup:
//!
//! - [`TradeParams`]: pair, enter price, exit price and starting amount,
//!   validated before anything touches the exchange.
//! - [`EngineSettings`]: polling cadence, retry policy and sizing options,
//!   usually read from the optional JSON config file.
//!
//! # Example config
//!
//! ```json
//! {
//!   "engine": { "poll_interval_ms": 1000, "query_retries": 3, "fee_rate": "0.001" },
//!   "binance": { "rest_url": "https://api.binance.com", "recv_window": 5000 }
//! }
//! ```

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::SeesawError;
use crate::types::Pair;

// ---------------------------------------------------------------------------
// Session parameters
// ---------------------------------------------------------------------------

/// The four validated inputs of a trading session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeParams {
    pub pair: Pair,
    /// Sell price.
    pub enter: Decimal,
    /// Buy price.
    pub exit: Decimal,
    /// Starting amount in base currency.
    pub amount: Decimal,
}

impl TradeParams {
    /// Validate already-parsed inputs.
    pub fn new(
        pair: Pair,
        enter: Decimal,
        exit: Decimal,
        amount: Decimal,
    ) -> Result<Self, SeesawError> {
        if enter <= Decimal::ZERO {
            return Err(SeesawError::Config(format!("enter must be positive, got {enter}")));
        }
        if exit <= Decimal::ZERO {
            return Err(SeesawError::Config(format!("exit must be positive, got {exit}")));
        }
        if amount < Decimal::ZERO {
            return Err(SeesawError::Config(format!("amount can not be negative, got {amount}")));
        }
        Ok(Self {
            pair,
            enter,
            exit,
            amount,
        })
    }

    /// Parse and validate the raw command-line strings.
    pub fn parse(pair: &str, enter: &str, exit: &str, amount: &str) -> Result<Self, SeesawError> {
        let pair: Pair = pair.parse()?;
        let enter = parse_decimal("enter", enter)?;
        let exit = parse_decimal("exit", exit)?;
        let amount = parse_decimal("amount", amount)?;
        Self::new(pair, enter, exit, amount)
    }

    /// Copy of these params with a different starting amount.
    pub fn with_amount(&self, amount: Decimal) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }
}

/// Reject an empty required string parameter.
pub fn require_non_empty(flag: &str, value: &str) -> Result<(), SeesawError> {
    if value.trim().is_empty() {
        return Err(SeesawError::Config(format!("{flag} parameter can not be empty.")));
    }
    Ok(())
}

/// Parse a required decimal parameter.
pub fn parse_decimal(flag: &str, value: &str) -> Result<Decimal, SeesawError> {
    require_non_empty(flag, value)?;
    Decimal::from_str(value.trim())
        .or_else(|_| Decimal::from_scientific(value.trim()))
        .map_err(|e| SeesawError::Config(format!("{flag} \"{value}\" is not a number: {e}")))
}

// ---------------------------------------------------------------------------
// Engine settings
// ---------------------------------------------------------------------------

/// Tunables for the alternation engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Delay between ticks.
    pub poll_interval_ms: u64,
    /// Extra attempts for a failed fill query (0 = fail on first error).
    pub query_retries: u32,
    /// Backoff before the first retry; doubles on each further retry.
    pub retry_backoff_ms: u64,
    /// Fraction of the buy amount withheld for exchange fees, in `[0, 1)`.
    pub fee_rate: Decimal,
    /// Round buy amounts toward zero to this many decimals.
    pub amount_decimals: Option<u32>,
    /// How far before the local start time the first fill query reaches, to
    /// absorb clock skew between this host and the exchange.
    pub start_lookback_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            query_retries: 3,
            retry_backoff_ms: 500,
            fee_rate: Decimal::ZERO,
            amount_decimals: None,
            start_lookback_ms: 5_000,
        }
    }
}

impl EngineSettings {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), SeesawError> {
        if self.poll_interval_ms == 0 {
            return Err(SeesawError::Config("poll_interval_ms must be positive".into()));
        }
        if self.fee_rate < Decimal::ZERO || self.fee_rate >= Decimal::ONE {
            return Err(SeesawError::Config(format!(
                "fee_rate must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        if let Some(dp) = self.amount_decimals {
            if dp > 18 {
                return Err(SeesawError::Config(format!(
                    "amount_decimals must be at most 18, got {dp}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

/// Load and parse a JSON config file into any deserializable shape.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_valid_params() {
        let p = TradeParams::parse("BTC_USD", "100", "90", "10").unwrap();
        assert_eq!(p.pair.to_string(), "BTC_USD");
        assert_eq!(p.enter, dec!(100));
        assert_eq!(p.exit, dec!(90));
        assert_eq!(p.amount, dec!(10));
    }

    #[test]
    fn empty_parameter_message() {
        let err = TradeParams::parse("BTC_USD", "", "90", "10").unwrap_err();
        assert_eq!(err.to_string(), "config error: enter parameter can not be empty.");
    }

    #[test]
    fn non_numeric_rejected() {
        let err = TradeParams::parse("BTC_USD", "100", "ninety", "10").unwrap_err();
        assert!(matches!(err, SeesawError::Config(_)));
        assert!(err.to_string().contains("exit"));
    }

    #[test]
    fn scientific_notation_accepted() {
        assert_eq!(parse_decimal("amount", "1e-3").unwrap(), dec!(0.001));
    }

    #[test]
    fn non_positive_prices_rejected() {
        assert!(TradeParams::parse("BTC_USD", "0", "90", "10").is_err());
        assert!(TradeParams::parse("BTC_USD", "100", "-1", "10").is_err());
        assert!(TradeParams::parse("BTC_USD", "100", "90", "-0.5").is_err());
        assert!(TradeParams::parse("BTC_USD", "100", "90", "0").is_ok());
    }

    #[test]
    fn settings_defaults_and_partial_json() {
        let s: EngineSettings = serde_json::from_str(r#"{ "fee_rate": "0.002" }"#).unwrap();
        assert_eq!(s.fee_rate, dec!(0.002));
        assert_eq!(s.poll_interval_ms, 1_000);
        assert_eq!(s.amount_decimals, None);
        assert_eq!(s.start_lookback_ms, 5_000);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn settings_validation() {
        let s = EngineSettings {
            fee_rate: dec!(1),
            ..EngineSettings::default()
        };
        assert!(s.validate().is_err());

        let s = EngineSettings {
            poll_interval_ms: 0,
            ..EngineSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn load_missing_file_errors() {
        let res: anyhow::Result<EngineSettings> =
            load_config(Path::new("/nonexistent/seesaw.json"));
        assert!(res.is_err());
    }
}
