// src/infrastructure/broker/dto.rs
// Parsers for Kite Connect response envelopes

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::errors::{MarketDataError, MarketDataResult};
use crate::domain::model::{DepthLevel, InstrumentKey, QuoteDepth};

/// Every Kite response is `{"status": "success", "data": ...}` or
/// `{"status": "error", "message": ..., "error_type": ...}`.
pub fn unwrap_envelope(body: &Value) -> Result<&Value, String> {
    match body.get("status").and_then(Value::as_str) {
        Some("success") => body
            .get("data")
            .ok_or_else(|| "response has no data field".to_string()),
        _ => Err(error_message(body)),
    }
}

pub fn error_message(body: &Value) -> String {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    match body.get("error_type").and_then(Value::as_str) {
        Some(kind) => format!("{}: {}", kind, message),
        None => message.to_string(),
    }
}

/// Extract top-of-book depth for `instrument` from a `/quote` payload.
pub fn parse_quote_depth(data: &Value, instrument: &InstrumentKey) -> MarketDataResult<QuoteDepth> {
    let key = instrument.to_string();
    let quote = data
        .get(&key)
        .ok_or_else(|| MarketDataError::InvalidFormat(format!("no quote returned for {}", key)))?;

    let depth = quote
        .get("depth")
        .ok_or_else(|| MarketDataError::InvalidFormat(format!("no depth in quote for {}", key)))?;

    Ok(QuoteDepth {
        instrument: instrument.clone(),
        best_bid: best_level(depth.get("buy"))?,
        best_ask: best_level(depth.get("sell"))?,
    })
}

/// Kite pads empty books with zero-priced levels; those count as no depth.
fn best_level(levels: Option<&Value>) -> MarketDataResult<Option<DepthLevel>> {
    let Some(first) = levels.and_then(Value::as_array).and_then(|levels| levels.first()) else {
        return Ok(None);
    };

    let price = first
        .get("price")
        .map(decimal_from_json)
        .transpose()?
        .ok_or_else(|| MarketDataError::InvalidFormat("depth level has no price".to_string()))?;
    let quantity = first.get("quantity").and_then(Value::as_u64).unwrap_or(0);

    if price <= Decimal::ZERO {
        return Ok(None);
    }

    Ok(Some(DepthLevel { price, quantity }))
}

/// Decimal from a JSON number or numeric string, keeping the printed digits.
pub fn decimal_from_json(value: &Value) -> MarketDataResult<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => {
            return Err(MarketDataError::InvalidFormat(format!(
                "expected a number, got {}",
                other
            )))
        }
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| MarketDataError::InvalidFormat(format!("invalid price {}: {}", text, e)))
}

pub fn parse_order_id(data: &Value) -> Option<String> {
    match data.get("order_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
