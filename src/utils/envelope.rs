use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ApiError;

/// Unwraps a private API response `{success, return, error}`.
///
/// Returns the `return` object on `success == 1`, otherwise the remote error
/// message verbatim as [`ApiError::Remote`].
pub fn unwrap_envelope(payload: &str) -> Result<Value, ApiError> {
    let mut value: Value = serde_json::from_str(payload)?;

    match value.get("success").and_then(Value::as_i64) {
        Some(1) => value
            .get_mut("return")
            .map(Value::take)
            .ok_or_else(|| ApiError::Parse("Missing return object".to_string())),
        Some(_) => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            Err(ApiError::Remote(message.to_string()))
        }
        None => Err(ApiError::Parse("Missing success flag".to_string())),
    }
}

// Numbers keep their payload text (serde_json `arbitrary_precision`), never an f64.
pub fn decimal_value(value: &Value) -> Option<Result<Decimal, ApiError>> {
    match value {
        Value::Number(n) => Some(parse_decimal(&n.to_string())),
        Value::String(s) => Some(parse_decimal(s)),
        _ => None,
    }
}

pub fn decimal_field(obj: &Value, key: &str) -> Result<Decimal, ApiError> {
    obj.get(key)
        .and_then(decimal_value)
        .unwrap_or_else(|| Err(ApiError::Parse(format!("Missing decimal field '{}'", key))))
}

pub fn parse_decimal(raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| ApiError::Parse(format!("Invalid decimal '{}': {}", raw, e)))
}

pub fn u64_field(obj: &Value, key: &str) -> Result<u64, ApiError> {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| ApiError::Parse(format!("Field '{}' is not an unsigned integer", key))),
        Some(Value::String(s)) => s
            .parse::<u64>()
            .map_err(|e| ApiError::Parse(format!("Invalid integer '{}': {}", s, e))),
        _ => Err(ApiError::Parse(format!("Missing integer field '{}'", key))),
    }
}

pub fn str_field<'a>(obj: &'a Value, key: &str) -> Result<&'a str, ApiError> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Parse(format!("Missing string field '{}'", key)))
}
