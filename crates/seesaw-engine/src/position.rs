//! Session state owned by the alternation engine.
//!
//! A [`Position`] is created once per session and mutated only by the
//! engine, and only after the order that justifies the change has been
//! accepted by the exchange. It is never persisted.

use rust_decimal::Decimal;
use seesaw_core::config::TradeParams;
use seesaw_core::{OrderId, Pair, Side};

/// Which action was most recently issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// A sell at the enter price is pending.
    Selling,
    /// A buy at the exit price is pending.
    Buying,
}

impl Phase {
    /// Side of the order this phase is waiting on.
    pub fn side(self) -> Side {
        match self {
            Self::Selling => Side::Sell,
            Self::Buying => Side::Buy,
        }
    }

    /// The phase entered once the pending order fills.
    pub fn next(self) -> Self {
        match self {
            Self::Selling => Self::Buying,
            Self::Buying => Self::Selling,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selling => f.write_str("SELLING"),
            Self::Buying => f.write_str("BUYING"),
        }
    }
}

/// The single alternating position of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pair: Pair,
    phase: Phase,
    enter: Decimal,
    exit: Decimal,
    amount: Decimal,
    pending: Option<OrderId>,
    cursor_ms: u64,
    cycles: u64,
    last_fill_ms: Option<u64>,
}

impl Position {
    /// Fresh position: SELLING, nothing pending.
    pub(crate) fn new(params: &TradeParams) -> Self {
        Self {
            pair: params.pair.clone(),
            phase: Phase::Selling,
            enter: params.enter,
            exit: params.exit,
            amount: params.amount,
            pending: None,
            cursor_ms: 0,
            cycles: 0,
            last_fill_ms: None,
        }
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Sell price.
    pub fn enter(&self) -> Decimal {
        self.enter
    }

    /// Buy price.
    pub fn exit(&self) -> Decimal {
        self.exit
    }

    /// Amount of the pending order (and of the next sell).
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Order awaiting fill confirmation; `None` means the engine must not act.
    pub fn pending(&self) -> Option<OrderId> {
        self.pending
    }

    /// Lower bound of the next fill-history query (ms).
    pub fn cursor_ms(&self) -> u64 {
        self.cursor_ms
    }

    /// Confirmed fills processed this session.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_fill_ms(&self) -> Option<u64> {
        self.last_fill_ms
    }

    /// Record the accepted initial sell. `amount` is what the exchange
    /// accepted, which can be less than requested.
    pub(crate) fn start(&mut self, order: OrderId, amount: Decimal, cursor_ms: u64) {
        self.pending = Some(order);
        self.amount = amount;
        self.cursor_ms = cursor_ms;
    }

    /// Record a confirmed fill and the accepted order that follows it.
    pub(crate) fn advance(&mut self, next_order: OrderId, next_amount: Decimal, fill_ms: u64) {
        self.cursor_ms = self.cursor_ms.max(fill_ms);
        self.phase = self.phase.next();
        self.amount = next_amount;
        self.pending = Some(next_order);
        self.cycles += 1;
        self.last_fill_ms = Some(fill_ms);
    }
}
