//! Lenient weight parsing.
//!
//! Weight never causes a request to fail: anything that is not a finite,
//! non-negative number becomes `0`.

use serde_json::Value;

/// Parses free-text weight input; blank or unparseable input yields `0`.
pub fn parse_weight(input: &str) -> f64 {
    sanitize(input.trim().parse::<f64>().unwrap_or(0.0))
}

/// Coerces a JSON weight value (number, numeric string, bool, null).
pub fn coerce_weight(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => sanitize(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) => parse_weight(s),
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    }
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}
