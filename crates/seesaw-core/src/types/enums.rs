//! Enumerations shared by the gateway and the engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Order side
// ---------------------------------------------------------------------------

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Wire representation used by the exchange (`"BUY"` / `"SELL"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"SELL\"");
        let side: Side = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(side, Side::Buy);
    }
}
