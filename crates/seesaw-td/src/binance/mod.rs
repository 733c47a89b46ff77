//! Binance spot gateway.
//!
//! Implements [`Gateway`](crate::Gateway) on top of the REST client in
//! [`spot`]. Pairs are sent as concatenated symbols (`BTC_USDT` → `BTCUSDT`).
//!
//! # Architecture
//!
//! ```text
//! BinanceSpotGateway
//! ├── SymbolRules cache   (exchangeInfo, fetched once per symbol)
//! └── SpotClient          (REST, HMAC-SHA256 signed)
//!     ├── POST /api/v3/order          ← place_order (quantity/price snapped to filters)
//!     ├── GET  /api/v3/myTrades       ← fills_since (by orderId, paged with fromId)
//!     ├── GET  /api/v3/account        ← account_info
//!     └── GET  /api/v3/exchangeInfo   ← symbol rules
//! ```
//!
//! Fill queries ask for the pending order's trades only. That is one
//! request per poll no matter how long the order has been open, and it
//! costs less request weight than a symbol-wide history query.

pub mod auth;
pub mod config;
pub mod rules;
pub mod spot;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use seesaw_core::error::GatewayError;
use seesaw_core::{AccountInfo, Fill, OrderId, OrderRequest, Pair, Permissions, PlacedOrder};
use tracing::{debug, info};

use self::config::BinanceSpotConfig;
use self::rules::SymbolRules;
use self::spot::{AccountResponse, SpotClient, TRADES_PAGE_LIMIT, TradeRecord};

/// Binance spot gateway.
pub struct BinanceSpotGateway {
    client: SpotClient,
    rules: Mutex<HashMap<String, SymbolRules>>,
}

impl BinanceSpotGateway {
    /// Create a gateway from its configuration. No request is sent yet.
    pub fn new(config: BinanceSpotConfig) -> Result<Self, GatewayError> {
        info!("[binance] spot gateway → {}", config.rest_url);
        Ok(Self {
            client: SpotClient::new(&config)?,
            rules: Mutex::new(HashMap::new()),
        })
    }

    /// Trading rules for `symbol`, fetched on first use.
    async fn symbol_rules(&self, symbol: &str) -> Result<SymbolRules, GatewayError> {
        let cached = self
            .rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .copied();
        if let Some(rules) = cached {
            return Ok(rules);
        }

        let info = self.client.exchange_info(symbol).await?;
        let entry = info
            .symbols
            .iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| GatewayError::Malformed(format!("exchangeInfo has no {symbol}")))?;
        let rules = SymbolRules::from_info(entry);
        info!(
            "[binance] {symbol} rules: tick={:?} step={:?} min_qty={}",
            rules.tick_size, rules.step_size, rules.min_qty
        );
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(symbol.to_string(), rules);
        Ok(rules)
    }
}

#[async_trait]
impl crate::Gateway for BinanceSpotGateway {
    fn name(&self) -> &str {
        "binance"
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<PlacedOrder, GatewayError> {
        let symbol = order.pair.exchange_symbol();
        let rules = self.symbol_rules(&symbol).await?;
        let qty = rules.quantity(order.amount)?;
        let px = rules.price(order.price, order.side)?;
        if qty != order.amount || px != order.price {
            info!(
                "[binance] {symbol} {} snapped to filters: qty {} → {qty}, price {} → {px}",
                order.side, order.amount, order.price
            );
        }

        let qty_str = format_decimal(qty);
        let px_str = format_decimal(px);
        let ack = self
            .client
            .place_limit_order(&symbol, order.side.as_str(), &qty_str, &px_str)
            .await?;

        debug!(
            "[binance] order ack: {} {} qty={qty_str} price={px_str} → id={}",
            ack.symbol, order.side, ack.order_id,
        );
        Ok(PlacedOrder {
            id: OrderId(ack.order_id),
            amount: qty,
        })
    }

    async fn fills_since(
        &self,
        pair: &Pair,
        order: OrderId,
        since_ms: u64,
        until_ms: u64,
    ) -> Result<Vec<Fill>, GatewayError> {
        let symbol = pair.exchange_symbol();
        let trades =
            collect_trade_pages(|from_id| self.client.my_trades(&symbol, order.0, from_id))
                .await?;
        Ok(trades
            .iter()
            .filter(|t| t.time >= since_ms && t.time <= until_ms)
            .map(trade_to_fill)
            .collect())
    }

    async fn account_info(&self) -> Result<AccountInfo, GatewayError> {
        let resp = self.client.account().await?;
        Ok(account_from_response(resp))
    }
}

// ---------------------------------------------------------------------------
// Wire → typed helpers
// ---------------------------------------------------------------------------

/// Fetch `myTrades` pages until one comes back short.
///
/// `fetch` receives the `fromId` for the page (`None` for the first).
async fn collect_trade_pages<F, Fut>(mut fetch: F) -> Result<Vec<TradeRecord>, GatewayError>
where
    F: FnMut(Option<u64>) -> Fut,
    Fut: Future<Output = Result<Vec<TradeRecord>, GatewayError>>,
{
    let mut all = Vec::new();
    let mut from_id = None;
    loop {
        let page = fetch(from_id).await?;
        let full = page.len() >= TRADES_PAGE_LIMIT;
        from_id = page.last().map(|t| t.id + 1);
        all.extend(page);
        if !full || from_id.is_none() {
            return Ok(all);
        }
    }
}

/// Plain decimal notation without trailing zeros, as Binance expects.
fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

fn trade_to_fill(t: &TradeRecord) -> Fill {
    Fill {
        order_id: OrderId(t.order_id),
        amount: t.qty,
        timestamp_ms: t.time,
    }
}

/// A signed account query only succeeds with read rights, so `info` is
/// implied by having a response at all.
fn account_from_response(resp: AccountResponse) -> AccountInfo {
    let balances: HashMap<String, Decimal> = resp
        .balances
        .into_iter()
        .map(|b| (b.asset.to_ascii_uppercase(), b.free))
        .collect();
    AccountInfo {
        permissions: Permissions {
            trade: resp.can_trade,
            info: true,
        },
        balances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;

    fn trades(ids: std::ops::Range<u64>) -> Vec<TradeRecord> {
        ids.map(|id| TradeRecord {
            id,
            order_id: 7,
            qty: dec!(0.001),
            time: 1_700_000_000_000 + id,
        })
        .collect()
    }

    #[test]
    fn decimal_formatting_strips_trailing_zeros() {
        assert_eq!(format_decimal(dec!(10.000)), "10");
        assert_eq!(format_decimal(dec!(0.00100)), "0.001");
        assert_eq!(format_decimal(dec!(90)), "90");
    }

    #[tokio::test]
    async fn open_order_is_one_request_per_poll() {
        let calls = RefCell::new(Vec::new());
        let got = collect_trade_pages(|from| {
            calls.borrow_mut().push(from);
            async { Ok(trades(0..3)) }
        })
        .await
        .unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(*calls.borrow(), vec![None]);
    }

    #[tokio::test]
    async fn full_pages_continue_from_last_trade_id() {
        let calls = RefCell::new(Vec::new());
        let got = collect_trade_pages(|from| {
            calls.borrow_mut().push(from);
            let page = match from {
                None => trades(0..1000),
                Some(1000) => trades(1000..2000),
                Some(_) => trades(2000..2005),
            };
            async move { Ok(page) }
        })
        .await
        .unwrap();
        assert_eq!(got.len(), 2005);
        assert_eq!(*calls.borrow(), vec![None, Some(1000), Some(2000)]);
    }

    #[tokio::test]
    async fn page_error_propagates() {
        let res = collect_trade_pages(|_| async {
            Err(GatewayError::RateLimited { retry_after: None })
        })
        .await;
        assert!(matches!(res, Err(GatewayError::RateLimited { .. })));
    }

    #[test]
    fn account_mapping() {
        let resp: AccountResponse = serde_json::from_str(
            r#"{"canTrade": false, "balances": [{"asset": "btc", "free": "0.5"}]}"#,
        )
        .unwrap();
        let info = account_from_response(resp);
        assert!(!info.permissions.trade);
        assert!(info.permissions.info);
        assert_eq!(info.balance("BTC"), dec!(0.5));
    }

    #[test]
    fn trade_mapping() {
        let t: TradeRecord = serde_json::from_str(
            r#"{"id": 1, "orderId": 77, "price": "100", "qty": "2.5",
                "time": 1700000000000, "isBuyer": false}"#,
        )
        .unwrap();
        let fill = trade_to_fill(&t);
        assert_eq!(fill.order_id, OrderId(77));
        assert_eq!(fill.amount, dec!(2.5));
        assert_eq!(fill.timestamp_ms, 1_700_000_000_000);
    }
}
