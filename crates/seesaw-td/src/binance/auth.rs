//! Binance request signing.
//!
//! Signed endpoints take a `signature` parameter: the HMAC-SHA256 of the
//! URL-encoded query string, keyed with the API secret, as lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute an HMAC-SHA256 signature and return it as a lowercase hex string.
///
/// # Example
///
/// ```ignore
/// let sig = hmac_sha256_sign("my_secret", "symbol=BTCUSDT&timestamp=1234567890");
/// assert_eq!(sig.len(), 64); // 32 bytes → 64 hex chars
/// ```
pub fn hmac_sha256_sign(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build a URL-encoded, HMAC-SHA256–signed query string.
///
/// Joins the `(key, value)` pairs with `&`, signs the result, and appends
/// `&signature=<hex>`. `params` must already include `timestamp`.
pub fn build_signed_query(params: &[(&str, &str)], secret: &str) -> String {
    let query: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let signature = hmac_sha256_sign(secret, &query);
    format!("{query}&signature={signature}")
}
