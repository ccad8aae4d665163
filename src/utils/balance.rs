use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::envelope::{decimal_value, u64_field, unwrap_envelope};
use crate::error::ApiError;
use crate::models::Currency;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rights {
    pub info: bool,
    pub trade: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub funds: BTreeMap<Currency, Decimal>,
    pub rights: Rights,
    pub transaction_count: u64,
    pub open_orders: u64,
    pub server_time: u64,
}

impl AccountSnapshot {
    pub fn parse(json_string: &str) -> Result<AccountSnapshot, ApiError> {
        let data = unwrap_envelope(json_string)?;

        let rights = data
            .get("rights")
            .ok_or_else(|| ApiError::Parse("Missing rights object".to_string()))?;

        Ok(AccountSnapshot {
            funds: parse_funds(&data)?,
            rights: Rights {
                info: flag(rights, "info"),
                trade: flag(rights, "trade"),
            },
            transaction_count: u64_field(&data, "transaction_count")?,
            open_orders: u64_field(&data, "open_orders")?,
            server_time: u64_field(&data, "server_time")?,
        })
    }

    pub fn balance(&self, currency: Currency) -> Decimal {
        self.funds.get(&currency).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Parses a `funds` object keyed by currency code.
///
/// Codes outside [`Currency`] are skipped: they cannot be addressed by the
/// rest of the client and several of them would collide on `Unknown`.
pub(crate) fn parse_funds(data: &Value) -> Result<BTreeMap<Currency, Decimal>, ApiError> {
    let funds = data
        .get("funds")
        .and_then(Value::as_object)
        .ok_or_else(|| ApiError::Parse("Failed to get account funds".to_string()))?;

    let mut balances = BTreeMap::new();
    for (code, amount) in funds {
        let currency = Currency::from_wire(code);
        if currency == Currency::Unknown {
            debug!(code = %code, "skipping unrecognized currency");
            continue;
        }
        let balance = decimal_value(amount)
            .unwrap_or_else(|| Err(ApiError::Parse(format!("Invalid balance for {}", code))))?;
        balances.insert(currency, balance);
    }
    Ok(balances)
}

fn flag(obj: &Value, key: &str) -> bool {
    obj.get(key).and_then(Value::as_i64) == Some(1)
}
