//! Binance spot gateway configuration.
//!
//! Credentials normally come from the command line; endpoint and timing
//! fields have production defaults and can be overridden from the JSON
//! config file's `"binance"` block.

use std::fmt;

use serde::Deserialize;

/// Configuration for [`BinanceSpotGateway`](super::BinanceSpotGateway).
#[derive(Clone, Deserialize)]
pub struct BinanceSpotConfig {
    /// Binance API key (sent in `X-MBX-APIKEY`).
    #[serde(default)]
    pub api_key: String,

    /// Binance API secret (HMAC-SHA256 signing).
    #[serde(default)]
    pub secret_key: String,

    /// Spot REST API base URL.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,

    /// `recvWindow` for signed requests (milliseconds).
    #[serde(default = "default_recv_window")]
    pub recv_window: u64,

    /// Per-request HTTP timeout (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for BinanceSpotConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            rest_url: default_rest_url(),
            recv_window: default_recv_window(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for BinanceSpotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceSpotConfig")
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &"***")
            .field("rest_url", &self.rest_url)
            .field("recv_window", &self.recv_window)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

fn redact(key: &str) -> String {
    let head: String = key.chars().take(4).collect();
    format!("{head}***")
}

// ---------------------------------------------------------------------------
// Defaults (used by serde)
// ---------------------------------------------------------------------------

fn default_rest_url() -> String {
    "https://api.binance.com".into()
}

fn default_recv_window() -> u64 {
    5000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: BinanceSpotConfig =
            serde_json::from_str(r#"{ "rest_url": "https://testnet.binance.vision" }"#).unwrap();
        assert_eq!(cfg.rest_url, "https://testnet.binance.vision");
        assert_eq!(cfg.recv_window, 5000);
        assert!(cfg.api_key.is_empty());
    }

    #[test]
    fn debug_hides_secret() {
        let cfg = BinanceSpotConfig {
            api_key: "abcdefgh".into(),
            secret_key: "topsecret".into(),
            ..BinanceSpotConfig::default()
        };
        let out = format!("{cfg:?}");
        assert!(!out.contains("topsecret"));
        assert!(!out.contains("abcdefgh"));
        assert!(out.contains("abcd***"));
    }
}
