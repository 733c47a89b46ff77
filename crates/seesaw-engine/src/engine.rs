//! The alternation engine.
//!
//! ```text
//!   initialize ──► SELL @ enter ──fill──► BUY @ exit ──fill──► SELL @ enter ──► …
//!                  (SELLING)              (BUYING)             (SELLING)
//! ```
//!
//! Each [`tick`](AlternationEngine::tick) asks the gateway for fills between
//! the cursor and now. Nothing happens until the pending order's fills add
//! up to its full amount; then the next order is placed and, only once the
//! exchange has accepted it, the position advances. A failed placement
//! leaves the position exactly as it was.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use seesaw_core::config::{EngineSettings, TradeParams};
use seesaw_core::error::SeesawError;
use seesaw_core::{Fill, OrderId, OrderRequest, PlacedOrder, Side};
use seesaw_td::Gateway;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::clock::{Clock, Ticker};
use crate::position::{Phase, Position};
use crate::retry::{RetryPolicy, retry_query};
use crate::sizing::Sizing;

/// Result of a single [`tick`](AlternationEngine::tick).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The pending order has not filled yet.
    Idle,
    /// The pending order filled and the next one was placed.
    Advanced {
        filled: OrderId,
        filled_amount: Decimal,
        placed: OrderId,
        side: Side,
        amount: Decimal,
    },
}

/// Settled orders remembered for the traded-again check.
const SETTLED_HISTORY: usize = 32;

/// Aggregate of all fill records for one order inside a query window.
#[derive(Debug, Clone, Copy)]
struct MatchedFill {
    amount: Decimal,
    timestamp_ms: u64,
}

/// Drives one alternating position against a [`Gateway`].
pub struct AlternationEngine<G, C> {
    gateway: G,
    clock: C,
    position: Position,
    sizing: Sizing,
    retry: RetryPolicy,
    start_lookback_ms: u64,
    /// Most recently settled orders and the fill time used, oldest first.
    settled: VecDeque<(OrderId, u64)>,
}

impl<G: Gateway, C: Clock> AlternationEngine<G, C> {
    /// Build an engine. No order is placed until [`initialize`](Self::initialize).
    pub fn new(
        gateway: G,
        clock: C,
        params: TradeParams,
        settings: &EngineSettings,
    ) -> Result<Self, SeesawError> {
        settings.validate()?;
        Ok(Self {
            gateway,
            clock,
            position: Position::new(&params),
            sizing: Sizing::from_settings(settings),
            retry: RetryPolicy::from_settings(settings),
            start_lookback_ms: settings.start_lookback_ms,
            settled: VecDeque::with_capacity(SETTLED_HISTORY),
        })
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Place the initial sell and start the cursor at the current time,
    /// less the configured lookback.
    ///
    /// Not retried: without an initial order there is no session.
    pub async fn initialize(&mut self) -> Result<OrderId, SeesawError> {
        if let Some(id) = self.position.pending() {
            return Err(SeesawError::Desync(format!(
                "initialize called with order {id} already pending"
            )));
        }

        let start_ms = self.clock.now_ms();
        let request = self.request(Side::Sell, self.position.enter(), self.position.amount());
        let placed = self.place(&request).await?;
        let cursor = start_ms.saturating_sub(self.start_lookback_ms);
        self.position.start(placed.id, placed.amount, cursor);
        Ok(placed.id)
    }

    /// Poll once for a fill of the pending order and advance if found.
    pub async fn tick(&mut self) -> Result<TickOutcome, SeesawError> {
        let Some(pending) = self.position.pending() else {
            return Err(SeesawError::Desync("tick fired with no pending order".into()));
        };

        let since = self.position.cursor_ms();
        let until = self.clock.now_ms().max(since);
        let gateway = &self.gateway;
        let pair = self.position.pair();
        let fills = retry_query(&self.retry, &self.clock, "fill query", move || {
            gateway.fills_since(pair, pending, since, until)
        })
        .await
        .map_err(SeesawError::Query)?;

        let Some(matched) = self.scan(pending, &fills)? else {
            debug!("order {pending} not filled yet ({} fills since {since})", fills.len());
            return Ok(TickOutcome::Idle);
        };
        if matched.amount < self.position.amount() {
            debug!(
                "order {pending} partially filled: {} of {}",
                matched.amount,
                self.position.amount()
            );
            return Ok(TickOutcome::Idle);
        }
        info!(
            "order {pending} filled: amount {} at {}",
            matched.amount, matched.timestamp_ms
        );

        let (side, price, amount) = match self.position.phase() {
            Phase::Selling => {
                let amount = self.sizing.next_buy_amount(
                    matched.amount,
                    self.position.enter(),
                    self.position.exit(),
                )?;
                (Side::Buy, self.position.exit(), amount)
            }
            Phase::Buying => (Side::Sell, self.position.enter(), self.position.amount()),
        };
        if amount <= Decimal::ZERO {
            return Err(SeesawError::Config(format!(
                "next {side} amount {amount} is not positive"
            )));
        }

        let request = self.request(side, price, amount);
        let placed = self.place(&request).await?;

        self.remember_settled(pending, matched.timestamp_ms);
        self.position.advance(placed.id, placed.amount, matched.timestamp_ms);

        Ok(TickOutcome::Advanced {
            filled: pending,
            filled_amount: matched.amount,
            placed: placed.id,
            side,
            amount: placed.amount,
        })
    }

    /// Tick on every `ticker` event until `stop` flips to `true` or a tick
    /// fails.
    ///
    /// The stop signal is only observed between ticks, so a running tick
    /// always completes. A dropped stop sender counts as a stop request.
    pub async fn run<T: Ticker + ?Sized>(
        &mut self,
        ticker: &mut T,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), SeesawError> {
        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.tick().await {
                error!(
                    "halting in {} with order {:?} pending: {e}",
                    self.position.phase(),
                    self.position.pending()
                );
                return Err(e);
            }
        }

        info!(
            "stopped after {} fill(s); {} order {:?} still pending",
            self.position.cycles(),
            self.position.phase().side(),
            self.position.pending()
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn request(&self, side: Side, price: Decimal, amount: Decimal) -> OrderRequest {
        OrderRequest {
            pair: self.position.pair().clone(),
            side,
            price,
            amount,
        }
    }

    async fn place(&self, request: &OrderRequest) -> Result<PlacedOrder, SeesawError> {
        let placed = self
            .gateway
            .place_order(request)
            .await
            .map_err(|source| SeesawError::Placement {
                side: request.side,
                source,
            })?;
        info!(
            "[{}] {request} → id={} amount={}",
            self.gateway.name(),
            placed.id,
            placed.amount
        );
        Ok(placed)
    }

    fn remember_settled(&mut self, order: OrderId, fill_ms: u64) {
        if self.settled.len() == SETTLED_HISTORY {
            self.settled.pop_front();
        }
        self.settled.push_back((order, fill_ms));
    }

    fn settled_at(&self, order: OrderId) -> Option<u64> {
        self.settled
            .iter()
            .find(|(id, _)| *id == order)
            .map(|&(_, ms)| ms)
    }

    /// Find the pending order's fills, refusing to continue if an order we
    /// already settled has traded again since.
    fn scan(&self, pending: OrderId, fills: &[Fill]) -> Result<Option<MatchedFill>, SeesawError> {
        let mut matched: Option<MatchedFill> = None;
        for fill in fills {
            if fill.order_id == pending {
                let m = matched.get_or_insert(MatchedFill {
                    amount: Decimal::ZERO,
                    timestamp_ms: fill.timestamp_ms,
                });
                m.amount += fill.amount;
                m.timestamp_ms = m.timestamp_ms.max(fill.timestamp_ms);
            } else if let Some(settled_ms) = self.settled_at(fill.order_id) {
                if fill.timestamp_ms > settled_ms {
                    return Err(SeesawError::Desync(format!(
                        "order {} traded {} at {} after it was settled at {settled_ms}; \
                         pending order is {pending}",
                        fill.order_id, fill.amount, fill.timestamp_ms
                    )));
                }
            } else {
                debug!("ignoring fill for foreign order {}", fill.order_id);
            }
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use rust_decimal_macros::dec;
    use seesaw_td::paper::PaperGateway;
    use std::sync::Arc;

    type PaperEngine = AlternationEngine<Arc<PaperGateway>, ManualClock>;

    fn engine(gw: &Arc<PaperGateway>, clock: &ManualClock) -> PaperEngine {
        let params = TradeParams::parse("BTC_USD", "100", "90", "10").unwrap();
        let settings = EngineSettings {
            query_retries: 0,
            start_lookback_ms: 0,
            ..EngineSettings::default()
        };
        AlternationEngine::new(Arc::clone(gw), clock.clone(), params, &settings).unwrap()
    }

    #[tokio::test]
    async fn tick_before_initialize_is_desync() {
        let gw = Arc::new(PaperGateway::new());
        let clock = ManualClock::new(1_000);
        let mut eng = engine(&gw, &clock);
        assert!(matches!(eng.tick().await, Err(SeesawError::Desync(_))));
        assert_eq!(gw.fill_queries(), 0);
    }

    #[tokio::test]
    async fn double_initialize_rejected() {
        let gw = Arc::new(PaperGateway::new());
        let clock = ManualClock::new(1_000);
        let mut eng = engine(&gw, &clock);
        eng.initialize().await.unwrap();
        assert!(matches!(eng.initialize().await, Err(SeesawError::Desync(_))));
        assert_eq!(gw.orders().len(), 1);
    }

    #[tokio::test]
    async fn partial_fills_are_aggregated() {
        let gw = Arc::new(PaperGateway::new());
        let clock = ManualClock::new(1_000);
        let mut eng = engine(&gw, &clock);
        let a = eng.initialize().await.unwrap();

        gw.fill(a, dec!(4), 1_100);
        gw.fill(a, dec!(5.5), 1_300);
        gw.fill(a, dec!(0.5), 1_200);
        clock.set(2_000);

        let outcome = eng.tick().await.unwrap();
        let TickOutcome::Advanced { filled_amount, .. } = outcome else {
            panic!("expected advance, got {outcome:?}");
        };
        assert_eq!(filled_amount, dec!(10));
        assert_eq!(eng.position().cursor_ms(), 1_300);
    }

    #[tokio::test]
    async fn short_fill_waits_for_the_rest() {
        let gw = Arc::new(PaperGateway::new());
        let clock = ManualClock::new(1_000);
        let mut eng = engine(&gw, &clock);
        let a = eng.initialize().await.unwrap();

        gw.fill(a, dec!(9.5), 1_100);
        clock.set(2_000);
        assert_eq!(eng.tick().await.unwrap(), TickOutcome::Idle);
        assert_eq!(eng.position().pending(), Some(a));
        assert_eq!(eng.position().cursor_ms(), 1_000);
        assert_eq!(gw.orders().len(), 1);
    }

    #[tokio::test]
    async fn initial_cursor_reaches_back_by_lookback() {
        let gw = Arc::new(PaperGateway::new());
        let clock = ManualClock::new(10_000);
        let params = TradeParams::parse("BTC_USD", "100", "90", "10").unwrap();
        let settings = EngineSettings {
            start_lookback_ms: 3_000,
            ..EngineSettings::default()
        };
        let mut eng = AlternationEngine::new(Arc::clone(&gw), clock, params, &settings).unwrap();
        eng.initialize().await.unwrap();
        assert_eq!(eng.position().cursor_ms(), 7_000);
    }

    #[test]
    fn settled_history_is_bounded() {
        let gw = Arc::new(PaperGateway::new());
        let clock = ManualClock::new(1_000);
        let mut eng = engine(&gw, &clock);
        for i in 0..(SETTLED_HISTORY as u64 + 5) {
            eng.remember_settled(OrderId(i), 1_000 + i);
        }
        assert_eq!(eng.settled.len(), SETTLED_HISTORY);
        assert_eq!(eng.settled_at(OrderId(0)), None);
        assert_eq!(eng.settled_at(OrderId(5)), Some(1_005));
    }

    #[tokio::test]
    async fn foreign_fills_are_ignored() {
        let gw = Arc::new(PaperGateway::new());
        let clock = ManualClock::new(1_000);
        let mut eng = engine(&gw, &clock);
        eng.initialize().await.unwrap();

        let pair = eng.position().pair().clone();
        gw.foreign_fill(&pair, OrderId(9_999), dec!(1), 1_500);
        clock.set(2_000);

        assert_eq!(eng.tick().await.unwrap(), TickOutcome::Idle);
        assert_eq!(eng.position().cursor_ms(), 1_000);
    }

    #[tokio::test]
    async fn zero_amount_after_rounding_is_rejected() {
        let gw = Arc::new(PaperGateway::new());
        let clock = ManualClock::new(1_000);
        let params = TradeParams::parse("BTC_USD", "1", "1000", "0.001").unwrap();
        let settings = EngineSettings {
            amount_decimals: Some(4),
            ..EngineSettings::default()
        };
        let mut eng =
            AlternationEngine::new(Arc::clone(&gw), clock.clone(), params, &settings).unwrap();
        let a = eng.initialize().await.unwrap();
        gw.fill(a, dec!(0.001), 1_100);
        clock.set(2_000);

        assert!(matches!(eng.tick().await, Err(SeesawError::Config(_))));
        assert_eq!(eng.position().pending(), Some(a));
        assert_eq!(eng.position().phase(), Phase::Selling);
        assert_eq!(gw.orders().len(), 1);
    }
}
