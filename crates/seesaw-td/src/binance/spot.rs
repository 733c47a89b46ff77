//! Binance Spot REST client.
//!
//! # REST endpoints
//!
//! | Operation     | Method | Path                   | Signed |
//! |---------------|--------|------------------------|--------|
//! | Place order   | POST   | `/api/v3/order`        | yes    |
//! | Trade history | GET    | `/api/v3/myTrades`     | yes    |
//! | Account info  | GET    | `/api/v3/account`      | yes    |
//! | Symbol rules  | GET    | `/api/v3/exchangeInfo` | no     |
//!
//! Responses are decoded into the typed structs below; error bodies
//! (`{"code": -2010, "msg": "..."}`) are mapped to [`GatewayError`] by
//! [`classify_error`].

use std::time::Duration;

use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use seesaw_core::error::GatewayError;
use seesaw_core::time_util::now_ms;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::auth;
use super::config::BinanceSpotConfig;

/// Binance error codes meaning the key or signature is not accepted.
const AUTH_ERROR_CODES: &[i64] = &[-1002, -1022, -2014, -2015];

/// Maximum rows per `myTrades` page.
pub const TRADES_PAGE_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// `POST /api/v3/order` response (ACK fields only).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub symbol: String,
    pub order_id: u64,
}

/// One entry of `GET /api/v3/myTrades`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    /// Trade id, used as the `fromId` cursor when paging.
    pub id: u64,
    pub order_id: u64,
    pub qty: Decimal,
    pub time: u64,
}

/// `GET /api/v3/account` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub can_trade: bool,
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
}

/// One asset balance inside [`AccountResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceEntry {
    pub asset: String,
    pub free: Decimal,
}

/// `GET /api/v3/exchangeInfo` response, trimmed to trading filters.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

/// The symbol filters the gateway applies before placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    Price { tick_size: Decimal },
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize { min_qty: Decimal, step_size: Decimal },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

// ---------------------------------------------------------------------------
// SpotClient
// ---------------------------------------------------------------------------

/// Binance Spot account client.
///
/// Stateless apart from the pooled HTTP client, so it can be shared freely.
pub struct SpotClient {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// API key (sent in `X-MBX-APIKEY` header).
    api_key: String,
    /// Secret key for HMAC-SHA256 signing.
    secret_key: String,
    /// REST base URL (e.g. `https://api.binance.com`).
    base_url: String,
    /// `recvWindow` for signed requests.
    recv_window: u64,
}

impl SpotClient {
    /// Create a new spot client (no connections opened yet).
    pub fn new(config: &BinanceSpotConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| GatewayError::Transport(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            base_url: config.rest_url.trim_end_matches('/').to_string(),
            recv_window: config.recv_window,
        })
    }

    /// Place a GTC limit order.
    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: &str,
        price: &str,
    ) -> Result<OrderAck, GatewayError> {
        self.signed(
            Method::POST,
            "/api/v3/order",
            &[
                ("symbol", symbol),
                ("side", side),
                ("type", "LIMIT"),
                ("timeInForce", "GTC"),
                ("quantity", quantity),
                ("price", price),
                ("newOrderRespType", "ACK"),
            ],
        )
        .await
    }

    /// One page of trades belonging to `order_id`, oldest first, starting
    /// at trade id `from_id` when given.
    pub async fn my_trades(
        &self,
        symbol: &str,
        order_id: u64,
        from_id: Option<u64>,
    ) -> Result<Vec<TradeRecord>, GatewayError> {
        let order_id = order_id.to_string();
        let limit = TRADES_PAGE_LIMIT.to_string();
        let from_id = from_id.map(|id| id.to_string());
        let mut params = vec![
            ("symbol", symbol),
            ("orderId", order_id.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(from) = &from_id {
            params.push(("fromId", from.as_str()));
        }
        self.signed(Method::GET, "/api/v3/myTrades", &params).await
    }

    /// Trading rules for one symbol.
    pub async fn exchange_info(&self, symbol: &str) -> Result<ExchangeInfo, GatewayError> {
        let path = "/api/v3/exchangeInfo";
        let url = format!("{}{}?symbol={}", self.base_url, path, urlencoding::encode(symbol));
        debug!("[spot] GET {path} symbol={symbol}");
        let req = self.http.get(&url);
        self.send(req, path).await
    }

    /// Query spot account information (balances, permissions).
    pub async fn account(&self) -> Result<AccountResponse, GatewayError> {
        self.signed(Method::GET, "/api/v3/account", &[("omitZeroBalances", "true")])
            .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Send a signed request and decode the JSON response.
    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let timestamp = now_ms().to_string();
        let recv_window = self.recv_window.to_string();
        let mut all: Vec<(&str, &str)> = params.to_vec();
        all.push(("recvWindow", &recv_window));
        all.push(("timestamp", &timestamp));

        let query = auth::build_signed_query(&all, &self.secret_key);
        let url = format!("{}{}?{}", self.base_url, path, query);
        debug!("[spot] {method} {path}");

        let req = self
            .http
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key);
        self.send(req, path).await
    }

    /// Send a request and decode the JSON body or the error response.
    async fn send<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, GatewayError> {
        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("{path}: {e}")))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(format!("{path}: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, retry_after, &body));
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(format!("{path}: {e}")))
    }
}

/// Map a non-2xx response to a [`GatewayError`].
pub(crate) fn classify_error(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
        return GatewayError::RateLimited { retry_after };
    }
    if status.is_server_error() {
        return GatewayError::Transport(format!("HTTP {status}: {body}"));
    }

    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let msg = parsed.map(|b| b.msg).unwrap_or_else(|| format!("HTTP {status}"));
        return GatewayError::Unauthorized(msg);
    }

    match parsed {
        Some(b) if AUTH_ERROR_CODES.contains(&b.code) => GatewayError::Unauthorized(b.msg),
        Some(b) => GatewayError::Rejected {
            code: b.code,
            message: b.msg,
        },
        None => GatewayError::Rejected {
            code: i64::from(status.as_u16()),
            message: body.to_string(),
        },
    }
}
