use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::market::quote::{Quote, Session, Trend};

pub const DEFAULT_HISTORY_PERIOD: &str = "1d";

/// Control messages a streaming client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Subscribe {
        symbol: String,
    },
    Unsubscribe {
        symbol: String,
    },
    Ping,
    GetHistory {
        symbol: String,
        #[serde(default = "default_period")]
        period: String,
    },
}

fn default_period() -> String {
    DEFAULT_HISTORY_PERIOD.to_string()
}

/// Messages the server pushes to streaming clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    StockUpdate { symbol: String, data: TickData },
    Pong { timestamp: String },
    Error { message: String },
    HistoryData { symbol: String, data: Vec<Session> },
}

#[derive(Debug, Serialize)]
pub struct TickData {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub previous_close: f64,
    pub trend: Trend,
    pub timestamp: String,
}

impl TickData {
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            price: quote.last,
            change: quote.change,
            change_percent: quote.change_percent,
            volume: quote.volume,
            previous_close: quote.previous_close(),
            trend: quote.trend,
            timestamp: Utc::now().format("%H:%M:%S%.3f").to_string(),
        }
    }
}

impl StreamMessage {
    pub fn stock_update(quote: &Quote) -> Self {
        StreamMessage::StockUpdate {
            symbol: quote.symbol.clone(),
            data: TickData::from_quote(quote),
        }
    }

    pub fn pong() -> Self {
        StreamMessage::Pong {
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscribe() {
        let msg: ControlMessage =
            serde_json::from_str(r#"{"type": "subscribe", "symbol": "1120"}"#).expect("parse");
        assert!(matches!(msg, ControlMessage::Subscribe { symbol } if symbol == "1120"));
    }

    #[test]
    fn test_parse_ping_without_payload() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type": "ping"}"#).expect("parse");
        assert!(matches!(msg, ControlMessage::Ping));
    }

    #[test]
    fn test_history_period_defaults() {
        let msg: ControlMessage =
            serde_json::from_str(r#"{"type": "get_history", "symbol": "2222"}"#).expect("parse");
        match msg {
            ControlMessage::GetHistory { symbol, period } => {
                assert_eq!(symbol, "2222");
                assert_eq!(period, DEFAULT_HISTORY_PERIOD);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ControlMessage>(r#"{"type": "shout"}"#).is_err());
        assert!(serde_json::from_str::<ControlMessage>("not json").is_err());
        // A subscribe without a symbol is malformed too.
        assert!(serde_json::from_str::<ControlMessage>(r#"{"type": "subscribe"}"#).is_err());
    }

    #[test]
    fn test_stock_update_wire_format() {
        let quote = Quote::from_sessions(
            "1120",
            &[
                Session::new("2025-11-02", 80.0, 100),
                Session::new("2025-11-03", 84.0, 200),
            ],
        )
        .expect("quote");

        let json = StreamMessage::stock_update(&quote).to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("round trip");

        assert_eq!(value["type"], "stock_update");
        assert_eq!(value["symbol"], "1120");
        assert_eq!(value["data"]["price"], 84.0);
        assert_eq!(value["data"]["previous_close"], 80.0);
        assert_eq!(value["data"]["trend"], "up");
    }

    #[test]
    fn test_error_wire_format() {
        let json = StreamMessage::error("رسالة غير صالحة").to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("round trip");
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "رسالة غير صالحة");
    }
}
