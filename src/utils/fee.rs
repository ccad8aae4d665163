use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::envelope::decimal_field;
use crate::error::ApiError;
use crate::models::Pair;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FeeSnapshot {
    pub pair: Pair,
    pub trade: Decimal,
}

impl FeeSnapshot {
    pub fn parse(json_string: &str, pair: Pair) -> Result<FeeSnapshot, ApiError> {
        let value: Value = serde_json::from_str(json_string)?;
        Ok(FeeSnapshot {
            pair,
            trade: decimal_field(&value, "trade")?,
        })
    }

    pub fn default_fee(pair: Pair) -> FeeSnapshot {
        FeeSnapshot {
            pair,
            trade: Decimal::new(2, 1),
        }
    }
}
