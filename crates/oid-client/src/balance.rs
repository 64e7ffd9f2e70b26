//! Credit-token balance extraction.
//!
//! On-chain token shapes vary across package versions, so the balance is
//! pulled out by an ordered list of named strategies, each tried in turn.
//! The deep scan stays as the last resort; the precedence is explicit.

use serde_json::Value;

type Strategy = fn(&Value) -> Option<u64>;

/// Strategies in precedence order. The first `Some` wins.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("balance", balance_field),
    ("balance.fields.value", nested_balance_value),
    ("value", value_field),
    ("deep_scan", deep_scan),
];

/// Extract a token balance from decoded object fields.
pub fn extract_balance(fields: &Value) -> Option<u64> {
    STRATEGIES.iter().find_map(|(_, strategy)| strategy(fields))
}

fn numeric(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn balance_field(fields: &Value) -> Option<u64> {
    numeric(fields.get("balance")?)
}

fn nested_balance_value(fields: &Value) -> Option<u64> {
    numeric(fields.get("balance")?.get("fields")?.get("value")?)
}

fn value_field(fields: &Value) -> Option<u64> {
    numeric(fields.get("value")?)
}

/// Last resort: depth-first scan for the first numeric-looking string.
fn deep_scan(fields: &Value) -> Option<u64> {
    let mut stack = vec![fields];
    while let Some(current) = stack.pop() {
        match current {
            Value::String(s) => {
                if let Ok(n) = s.parse() {
                    return Some(n);
                }
            }
            Value::Object(map) => stack.extend(map.values().rev()),
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }
    None
}
