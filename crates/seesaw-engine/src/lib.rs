//! # seesaw-engine
//!
//! The alternation engine: sells at the enter price, buys back at the exit
//! price, and repeats, re-sizing each buy from the proceeds of the previous
//! sell.
//!
//! ## Modules
//!
//! - [`engine`]: [`AlternationEngine`]: `initialize`, `tick`, `run`
//! - [`position`]: the mutable session state and its SELLING/BUYING phase
//! - [`sizing`]: next-order amount (price ratio, optional fee netting/rounding)
//! - [`clock`]: injectable wall clock and tick scheduler
//! - [`retry`]: backoff for read-only gateway queries
//! - [`preflight`]: permission check and balance clamp before the first order

pub mod clock;
pub mod engine;
pub mod position;
pub mod preflight;
pub mod retry;
pub mod sizing;

pub use engine::{AlternationEngine, TickOutcome};
pub use position::{Phase, Position};
