//! Kalshi WebSocket message shapes: `ticker_v2` subscribe/ack/delta.
//!
//! Kalshi's WS protocol is request/response over a shared socket: a
//! `subscribe` command carries a client-chosen `id`, the server acks with
//! a `subscribed` message carrying the server-assigned integer `sid`, and
//! subsequent `ticker_v2` deltas for that subscription reference the same
//! `sid`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outgoing command. `id` is echoed back on the matching response so a
/// caller can correlate a `subscribe` call with its ack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsRequest {
    pub id: u64,
    pub cmd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl WsRequest {
    pub fn ping(id: u64) -> Self {
        Self {
            id,
            cmd: "ping".to_string(),
            params: None,
        }
    }

    pub fn subscribe(id: u64, market_tickers: &[String]) -> Self {
        Self {
            id,
            cmd: "subscribe".to_string(),
            params: Some(serde_json::json!({
                "channels": ["ticker_v2"],
                "market_tickers": market_tickers,
            })),
        }
    }

    pub fn unsubscribe(id: u64, sids: &[u64]) -> Self {
        Self {
            id,
            cmd: "unsubscribe".to_string(),
            params: Some(serde_json::json!({ "sids": sids })),
        }
    }
}

/// Every inbound frame, discriminated by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Subscribed(SubscribedMessage),
    TickerV2(TickerV2Message),
    Pong(PongMessage),
    Error(ErrorMessage),
}

impl WsMessage {
    pub fn is_pong(&self) -> bool {
        matches!(self, Self::Pong(_))
    }

    pub fn sid(&self) -> Option<u64> {
        match self {
            Self::Subscribed(m) => Some(m.sid),
            Self::TickerV2(m) => Some(m.sid),
            _ => None,
        }
    }
}

/// Ack for a `subscribe` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribedMessage {
    pub id: u64,
    pub sid: u64,
    pub channel: String,
}

/// A `ticker_v2` delta: the fields that changed since the last snapshot
/// for this market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerV2Message {
    pub sid: u64,
    pub market_ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_bid: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_ask: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_interest: Option<i64>,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: i32,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_request_carries_market_tickers() {
        let req = WsRequest::subscribe(1, &["KXBTCD-TEST".to_string()]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["cmd"], "subscribe");
        assert_eq!(json["params"]["market_tickers"][0], "KXBTCD-TEST");
    }

    #[test]
    fn test_ticker_v2_round_trips() {
        let raw = serde_json::json!({
            "type": "ticker_v2",
            "sid": 7,
            "market_ticker": "KXBTCD-TEST",
            "yes_bid": "61",
            "ts": 1_700_000_000,
        });
        let msg: WsMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.sid(), Some(7));
        assert!(matches!(msg, WsMessage::TickerV2(_)));
    }

    #[test]
    fn test_pong_is_pong() {
        let raw = serde_json::json!({"type": "pong", "id": 3});
        let msg: WsMessage = serde_json::from_value(raw).unwrap();
        assert!(msg.is_pong());
    }
}
