//! In-memory paper gateway.
//!
//! Records every order it receives and serves fills that were either pushed
//! in explicitly ([`PaperGateway::fill`]) or generated automatically at
//! placement time when auto-fill is on. Failures can be injected for the next
//! placement or the next N fill queries.
//!
//! Used by the engine's tests and by the runner's `--paper` mode.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use seesaw_core::error::GatewayError;
use seesaw_core::time_util::now_ms;
use seesaw_core::{AccountInfo, Fill, OrderId, OrderRequest, Pair, Permissions, PlacedOrder};
use tracing::info;

/// An order accepted by the paper gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperOrder {
    pub id: OrderId,
    pub request: OrderRequest,
}

#[derive(Debug, Default)]
struct PaperState {
    next_id: u64,
    orders: Vec<PaperOrder>,
    pairs: HashMap<OrderId, Pair>,
    fills: Vec<Fill>,
    account: AccountInfo,
    placement_failure: Option<GatewayError>,
    query_failures: VecDeque<GatewayError>,
    fill_queries: usize,
}

/// Deterministic in-memory [`Gateway`](crate::Gateway).
#[derive(Debug)]
pub struct PaperGateway {
    state: Mutex<PaperState>,
    auto_fill: bool,
}

impl PaperGateway {
    /// Empty gateway with full permissions and no balances.
    pub fn new() -> Self {
        let state = PaperState {
            next_id: 1,
            account: AccountInfo {
                permissions: Permissions {
                    trade: true,
                    info: true,
                },
                balances: HashMap::new(),
            },
            ..PaperState::default()
        };
        Self {
            state: Mutex::new(state),
            auto_fill: false,
        }
    }

    /// Fill every order completely, at the current wall-clock time, as soon
    /// as it is placed.
    pub fn with_auto_fill(mut self) -> Self {
        self.auto_fill = true;
        self
    }

    /// Set the free balance of `asset`.
    pub fn with_balance(self, asset: &str, amount: Decimal) -> Self {
        self.lock()
            .account
            .balances
            .insert(asset.to_ascii_uppercase(), amount);
        self
    }

    /// Record an executed trade for `order_id`.
    pub fn fill(&self, order_id: OrderId, amount: Decimal, timestamp_ms: u64) {
        self.lock().fills.push(Fill {
            order_id,
            amount,
            timestamp_ms,
        });
    }

    /// Register a fill on `pair` for an order this gateway never placed
    /// (a manual trade on the same account).
    pub fn foreign_fill(
        &self,
        pair: &Pair,
        order_id: OrderId,
        amount: Decimal,
        timestamp_ms: u64,
    ) {
        let mut state = self.lock();
        state.pairs.insert(order_id, pair.clone());
        state.fills.push(Fill {
            order_id,
            amount,
            timestamp_ms,
        });
    }

    /// Make the next `place_order` call fail with `err`.
    pub fn fail_next_placement(&self, err: GatewayError) {
        self.lock().placement_failure = Some(err);
    }

    /// Make the next fill query fail with `err`. Calls queue up.
    pub fn fail_next_query(&self, err: GatewayError) {
        self.lock().query_failures.push_back(err);
    }

    /// All orders placed so far, oldest first.
    pub fn orders(&self) -> Vec<PaperOrder> {
        self.lock().orders.clone()
    }

    /// The most recently placed order.
    pub fn last_order(&self) -> Option<PaperOrder> {
        self.lock().orders.last().cloned()
    }

    /// Number of `fills_since` calls received, including failed ones.
    pub fn fill_queries(&self) -> usize {
        self.lock().fill_queries
    }

    fn lock(&self) -> MutexGuard<'_, PaperState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PaperGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl crate::Gateway for PaperGateway {
    fn name(&self) -> &str {
        "paper"
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<PlacedOrder, GatewayError> {
        let mut state = self.lock();
        if let Some(err) = state.placement_failure.take() {
            return Err(err);
        }

        let id = OrderId(state.next_id);
        state.next_id += 1;
        state.pairs.insert(id, order.pair.clone());
        state.orders.push(PaperOrder {
            id,
            request: order.clone(),
        });
        if self.auto_fill {
            state.fills.push(Fill {
                order_id: id,
                amount: order.amount,
                timestamp_ms: now_ms(),
            });
        }

        info!("[paper] accepted {order} → id={id}");
        Ok(PlacedOrder {
            id,
            amount: order.amount,
        })
    }

    /// Returns every fill on `pair` in the window, not just `_order`'s, the
    /// way an account-wide trade history would.
    async fn fills_since(
        &self,
        pair: &Pair,
        _order: OrderId,
        since_ms: u64,
        until_ms: u64,
    ) -> Result<Vec<Fill>, GatewayError> {
        let mut state = self.lock();
        state.fill_queries += 1;
        if let Some(err) = state.query_failures.pop_front() {
            return Err(err);
        }

        let fills = state
            .fills
            .iter()
            .filter(|f| f.timestamp_ms >= since_ms && f.timestamp_ms <= until_ms)
            .filter(|f| state.pairs.get(&f.order_id) == Some(pair))
            .cloned()
            .collect();
        Ok(fills)
    }

    async fn account_info(&self) -> Result<AccountInfo, GatewayError> {
        Ok(self.lock().account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gateway;
    use rust_decimal_macros::dec;
    use seesaw_core::Side;

    fn sell(pair: &Pair, amount: Decimal) -> OrderRequest {
        OrderRequest {
            pair: pair.clone(),
            side: Side::Sell,
            price: dec!(100),
            amount,
        }
    }

    #[tokio::test]
    async fn ids_are_unique_and_increasing() {
        let gw = PaperGateway::new();
        let pair: Pair = "BTC_USD".parse().unwrap();
        let a = gw.place_order(&sell(&pair, dec!(1))).await.unwrap();
        let b = gw.place_order(&sell(&pair, dec!(1))).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(a.amount, dec!(1));
        assert_eq!(gw.orders().len(), 2);
    }

    #[tokio::test]
    async fn fills_filtered_by_window_and_pair() {
        let gw = PaperGateway::new();
        let btc: Pair = "BTC_USD".parse().unwrap();
        let eth: Pair = "ETH_USD".parse().unwrap();
        let a = gw.place_order(&sell(&btc, dec!(1))).await.unwrap().id;
        let b = gw.place_order(&sell(&eth, dec!(1))).await.unwrap().id;
        gw.fill(a, dec!(1), 1_000);
        gw.fill(b, dec!(1), 1_000);
        gw.fill(a, dec!(1), 5_000);

        let fills = gw.fills_since(&btc, a, 500, 2_000).await.unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].order_id, a);
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let gw = PaperGateway::new();
        let pair: Pair = "BTC_USD".parse().unwrap();
        gw.fail_next_placement(GatewayError::Transport("down".into()));
        assert!(gw.place_order(&sell(&pair, dec!(1))).await.is_err());
        assert!(gw.place_order(&sell(&pair, dec!(1))).await.is_ok());

        gw.fail_next_query(GatewayError::RateLimited { retry_after: None });
        assert!(gw.fills_since(&pair, OrderId(1), 0, u64::MAX).await.is_err());
        assert!(gw.fills_since(&pair, OrderId(1), 0, u64::MAX).await.is_ok());
        assert_eq!(gw.fill_queries(), 2);
    }

    #[tokio::test]
    async fn auto_fill_records_full_amount() {
        let gw = PaperGateway::new().with_auto_fill();
        let pair: Pair = "BTC_USD".parse().unwrap();
        let id = gw.place_order(&sell(&pair, dec!(3))).await.unwrap().id;
        let fills = gw.fills_since(&pair, id, 0, u64::MAX).await.unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].order_id, id);
        assert_eq!(fills[0].amount, dec!(3));
    }

    #[tokio::test]
    async fn account_reflects_builder() {
        let gw = PaperGateway::new().with_balance("btc", dec!(2));
        let info = gw.account_info().await.unwrap();
        assert_eq!(info.balance("BTC"), dec!(2));
        assert!(info.permissions.trade && info.permissions.info);
    }
}
