//! # seesaw-core
//!
//! Core crate for the seesaw trading loop, providing:
//!
//! - **Types** (`types`): pair, side, order request, fill and account structs
//! - **Configuration** (`config`): JSON config file + validated session params
//! - **Error types** (`error`): `GatewayError` and `SeesawError` via thiserror
//! - **Time utilities** (`time_util`): millisecond timestamps
//! - **Logging** (`logging`): tracing-based structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod time_util;
pub mod types;

// Re-export types at crate root for convenience.
pub use types::*;
