//! Typed error definitions for the seesaw trading loop.
//!
//! [`GatewayError`] describes what went wrong talking to the exchange;
//! [`SeesawError`] is the session-level taxonomy. Every `SeesawError` is fatal
//! for the session: the run loop stops on the first one it sees.

use std::time::Duration;

use thiserror::Error;

use crate::types::Side;

/// Failure reported by an exchange gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Network failure, timeout, or 5xx from the exchange.
    #[error("transport error: {0}")]
    Transport(String),

    /// The exchange asked us to slow down (HTTP 418/429).
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Bad key, bad signature, or missing API permission.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The exchange understood the request and refused it.
    #[error("rejected by exchange (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// Response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Whether a read-only request that failed this way may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited { .. })
    }
}

/// Session-level errors. Each variant terminates the polling loop.
#[derive(Debug, Error)]
pub enum SeesawError {
    /// Missing, empty, or non-numeric session parameter.
    #[error("config error: {0}")]
    Config(String),

    /// The API key lacks trade or info rights.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// Fill-history query failed and retries (if any) were exhausted.
    #[error("fill query failed: {0}")]
    Query(#[source] GatewayError),

    /// Order placement failed. Never retried.
    #[error("{side} order placement failed: {source}")]
    Placement {
        side: Side,
        #[source]
        source: GatewayError,
    },

    /// Engine state no longer matches what the exchange reports.
    #[error("desynchronized: {0}")]
    Desync(String),
}

impl SeesawError {
    /// Map a gateway failure seen during startup checks.
    pub fn from_startup(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized(msg) => Self::Authorization(msg),
            other => Self::Query(other),
        }
    }
}
