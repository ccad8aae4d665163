use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::balance::parse_funds;
use super::envelope::{decimal_field, str_field, u64_field, unwrap_envelope};
use crate::error::ApiError;
use crate::models::{Currency, OrderStatus, Pair, TradeSide};

/// Message the venue uses to report an empty active-orders list.
const NO_ORDERS: &str = "no orders";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub id: u64,
    pub pair: Pair,
    pub side: TradeSide,
    pub amount: Decimal,
    pub rate: Decimal,
    pub timestamp_created: u64,
    pub status: OrderStatus,
}

impl OrderSnapshot {
    fn from_value(id: u64, order: &Value) -> Result<OrderSnapshot, ApiError> {
        Ok(OrderSnapshot {
            id,
            pair: Pair::from_wire(str_field(order, "pair")?),
            side: TradeSide::from_wire(str_field(order, "type")?),
            amount: decimal_field(order, "amount")?,
            rate: decimal_field(order, "rate")?,
            timestamp_created: u64_field(order, "timestamp_created")?,
            status: order
                .get("status")
                .and_then(Value::as_i64)
                .map(OrderStatus::from_code)
                .unwrap_or(OrderStatus::Unknown),
        })
    }

    /// Parses an `OrderInfo` response, which carries one order keyed by its id.
    pub fn parse(json_string: &str) -> Result<OrderSnapshot, ApiError> {
        let data = unwrap_envelope(json_string)?;
        let (id, order) = data
            .as_object()
            .and_then(|orders| orders.iter().next())
            .ok_or_else(|| ApiError::Parse("Order info response contained no order".to_string()))?;
        OrderSnapshot::from_value(parse_id(id)?, order)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct OrdersListSnapshot {
    pub orders: BTreeMap<u64, OrderSnapshot>,
}

impl OrdersListSnapshot {
    pub fn parse(json_string: &str) -> Result<OrdersListSnapshot, ApiError> {
        let data = match unwrap_envelope(json_string) {
            Ok(data) => data,
            Err(ApiError::Remote(message)) if message == NO_ORDERS => {
                return Ok(OrdersListSnapshot::default())
            }
            Err(err) => return Err(err),
        };

        let entries = data
            .as_object()
            .ok_or_else(|| ApiError::Parse("Active orders is not an object".to_string()))?;

        let mut orders = BTreeMap::new();
        for (id, order) in entries {
            let id = parse_id(id)?;
            orders.insert(id, OrderSnapshot::from_value(id, order)?);
        }
        Ok(OrdersListSnapshot { orders })
    }

    pub fn count(&self) -> usize {
        self.orders.len()
    }

    pub fn total_amount(&self) -> Decimal {
        self.orders.values().map(|order| order.amount).sum()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TradeResult {
    pub received: Decimal,
    pub remains: Decimal,
    pub order_id: u64,
    pub funds: BTreeMap<Currency, Decimal>,
}

impl TradeResult {
    pub fn parse(json_string: &str) -> Result<TradeResult, ApiError> {
        let data = unwrap_envelope(json_string)?;
        Ok(TradeResult {
            received: decimal_field(&data, "received")?,
            remains: decimal_field(&data, "remains")?,
            order_id: u64_field(&data, "order_id")?,
            funds: parse_funds(&data)?,
        })
    }
}

fn parse_id(id: &str) -> Result<u64, ApiError> {
    id.parse::<u64>()
        .map_err(|e| ApiError::Parse(format!("Invalid order id '{}': {}", id, e)))
}
