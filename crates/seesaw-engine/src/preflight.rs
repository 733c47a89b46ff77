//! Startup checks run once before the first order.
//!
//! The key must carry both trade and info rights, and the starting amount is
//! clamped to the free balance of the pair's base currency.

use rust_decimal::Decimal;
use seesaw_core::AccountInfo;
use seesaw_core::config::TradeParams;
use seesaw_core::error::SeesawError;
use seesaw_td::Gateway;
use tracing::{info, warn};

/// Validate `info` against `params` and return params with the clamped amount.
pub fn check_account(info: &AccountInfo, params: &TradeParams) -> Result<TradeParams, SeesawError> {
    if !info.permissions.trade || !info.permissions.info {
        return Err(SeesawError::Authorization(
            "Not enough rights for trading. Please update the key privileges.".into(),
        ));
    }

    let base = params.pair.base();
    let balance = info.balance(base);
    let amount = if balance < params.amount {
        warn!(
            "requested amount {} exceeds free {base} balance {balance}; using {balance}",
            params.amount
        );
        balance
    } else {
        params.amount
    };

    if amount <= Decimal::ZERO {
        return Err(SeesawError::Config(format!(
            "nothing to sell: amount {amount} {base}"
        )));
    }
    Ok(params.with_amount(amount))
}

/// Fetch account info from `gateway` and run [`check_account`].
pub async fn preflight<G: Gateway + ?Sized>(
    gateway: &G,
    params: &TradeParams,
) -> Result<TradeParams, SeesawError> {
    let account = gateway
        .account_info()
        .await
        .map_err(SeesawError::from_startup)?;
    let checked = check_account(&account, params)?;
    info!(
        "[{}] preflight ok: {} amount {}",
        gateway.name(),
        checked.pair,
        checked.amount
    );
    Ok(checked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use seesaw_core::Permissions;
    use seesaw_td::paper::PaperGateway;

    fn params(amount: &str) -> TradeParams {
        TradeParams::parse("BTC_USD", "100", "90", amount).unwrap()
    }

    fn account(trade: bool, info: bool, btc: Decimal) -> AccountInfo {
        let mut acct = AccountInfo {
            permissions: Permissions { trade, info },
            ..AccountInfo::default()
        };
        acct.balances.insert("BTC".into(), btc);
        acct
    }

    #[test]
    fn amount_clamped_to_balance() {
        let checked = check_account(&account(true, true, dec!(4)), &params("10")).unwrap();
        assert_eq!(checked.amount, dec!(4));
    }

    #[test]
    fn amount_within_balance_kept() {
        let checked = check_account(&account(true, true, dec!(40)), &params("10")).unwrap();
        assert_eq!(checked.amount, dec!(10));
    }

    #[test]
    fn missing_rights_rejected() {
        for (trade, info) in [(false, true), (true, false), (false, false)] {
            let err = check_account(&account(trade, info, dec!(40)), &params("10")).unwrap_err();
            assert!(matches!(err, SeesawError::Authorization(_)));
        }
    }

    #[test]
    fn empty_balance_rejected() {
        let err = check_account(&account(true, true, Decimal::ZERO), &params("10")).unwrap_err();
        assert!(matches!(err, SeesawError::Config(_)));
    }

    #[tokio::test]
    async fn preflight_against_paper_gateway() {
        let gw = PaperGateway::new().with_balance("BTC", dec!(2.5));
        let checked = preflight(&gw, &params("3")).await.unwrap();
        assert_eq!(checked.amount, dec!(2.5));
    }
}
