//! # seesaw-td
//!
//! Exchange gateways for the seesaw trading loop.
//!
//! Each exchange implements the [`Gateway`] trait: the three remote
//! operations the alternation engine and the startup checks need. The engine
//! is generic over the gateway, so the in-memory [`paper::PaperGateway`] can
//! stand in for a live exchange in tests and dry runs.
//!
//! ## Gateways
//!
//! | Gateway   | Module    | Orders         | Fill history                |
//! |-----------|-----------|----------------|-----------------------------|
//! | Binance   | `binance` | REST (signed)  | `/api/v3/myTrades?orderId=` |
//! | Paper     | `paper`   | in-memory      | in-memory, whole pair       |

pub mod binance;
pub mod paper;

use std::sync::Arc;

use async_trait::async_trait;
use seesaw_core::error::GatewayError;
use seesaw_core::{AccountInfo, Fill, OrderId, OrderRequest, Pair, PlacedOrder};

/// Trait implemented by all exchange gateways.
///
/// Implementations must return a unique [`OrderId`] for every accepted
/// order, together with the quantity that actually went on the book.
///
/// Fill queries return trades on `pair` with `since_ms <= time <= until_ms`
/// in any order. `order` is the order the caller is waiting on; a gateway
/// may narrow the query to that order's trades, or return every trade on the
/// pair. Callers scan the list themselves either way.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Submit a limit order.
    async fn place_order(&self, order: &OrderRequest) -> Result<PlacedOrder, GatewayError>;

    /// Executed trades on `pair` within `[since_ms, until_ms]`.
    async fn fills_since(
        &self,
        pair: &Pair,
        order: OrderId,
        since_ms: u64,
        until_ms: u64,
    ) -> Result<Vec<Fill>, GatewayError>;

    /// Key permissions and free balances.
    async fn account_info(&self) -> Result<AccountInfo, GatewayError>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<PlacedOrder, GatewayError> {
        (**self).place_order(order).await
    }

    async fn fills_since(
        &self,
        pair: &Pair,
        order: OrderId,
        since_ms: u64,
        until_ms: u64,
    ) -> Result<Vec<Fill>, GatewayError> {
        (**self).fills_since(pair, order, since_ms, until_ms).await
    }

    async fn account_info(&self) -> Result<AccountInfo, GatewayError> {
        (**self).account_info().await
    }
}
