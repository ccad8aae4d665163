use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Active,
    Executed,
    Canceled,
    CanceledPartiallyExecuted,
    Unknown,
}

impl OrderStatus {
    pub fn from_code(code: i64) -> OrderStatus {
        match code {
            0 => OrderStatus::Active,
            1 => OrderStatus::Executed,
            2 => OrderStatus::Canceled,
            3 => OrderStatus::CanceledPartiallyExecuted,
            _ => OrderStatus::Unknown,
        }
    }

    pub fn from_wire(s: &str) -> OrderStatus {
        match s.trim().to_lowercase().as_str() {
            "active" => OrderStatus::Active,
            "executed" => OrderStatus::Executed,
            "canceled" => OrderStatus::Canceled,
            "canceledpartiallyexecuted" => OrderStatus::CanceledPartiallyExecuted,
            _ => OrderStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::Executed => "executed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::CanceledPartiallyExecuted => "canceledpartiallyexecuted",
            OrderStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
