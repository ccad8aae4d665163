use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::envelope::{decimal_field, u64_field};
use crate::error::ApiError;
use crate::models::Pair;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TickerSnapshot {
    pub pair: Pair,
    pub average: Decimal,
    pub buy: Decimal,
    pub high: Decimal,
    pub last: Decimal,
    pub low: Decimal,
    pub sell: Decimal,
    pub volume: Decimal,
    pub volume_currency: Decimal,
    pub server_time: u64,
}

impl TickerSnapshot {
    /// Parses `{"ticker": {buy, sell, high, low, avg, last, vol, vol_cur, server_time}}`.
    pub fn parse(json_string: &str, pair: Pair) -> Result<TickerSnapshot, ApiError> {
        let value: Value = serde_json::from_str(json_string)?;
        let ticker = value
            .get("ticker")
            .ok_or_else(|| ApiError::Parse("Missing ticker object".to_string()))?;

        Ok(TickerSnapshot {
            pair,
            average: decimal_field(ticker, "avg")?,
            buy: decimal_field(ticker, "buy")?,
            high: decimal_field(ticker, "high")?,
            last: decimal_field(ticker, "last")?,
            low: decimal_field(ticker, "low")?,
            sell: decimal_field(ticker, "sell")?,
            volume: decimal_field(ticker, "vol")?,
            volume_currency: decimal_field(ticker, "vol_cur")?,
            server_time: u64_field(ticker, "server_time")?,
        })
    }
}
