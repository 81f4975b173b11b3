//! Score coercion and normalization.
//!
//! Request fields arrive as loose JSON. Anything that is not a finite
//! non-negative number becomes "absent" instead of an error, and the engine
//! falls back to a smaller completion mode.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NUMERIC_TOKEN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)").expect("numeric token regex"));

/// First signed/decimal token in `s`, parsed.
fn first_numeric_token(s: &str) -> Option<f64> {
  NUMERIC_TOKEN
    .find(s)
    .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Loose numeric read: JSON numbers as-is, strings by their first numeric token.
pub fn parse_optional_number(raw: Option<&Value>) -> Option<f64> {
  let n = match raw? {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => first_numeric_token(s),
    _ => None,
  }?;
  n.is_finite().then_some(n)
}

/// Contract: returns `Some(n)` only for a finite `n >= 0`; everything else
/// (null, bool, NaN, negative, non-numeric strings) is `None`.
pub fn parse_optional_non_negative_number(raw: Option<&Value>) -> Option<f64> {
  parse_optional_number(raw).filter(|n| *n >= 0.0)
}

/// Signed whole step count (`advanceBy`). Fractional values are treated as absent.
pub fn parse_optional_step(raw: Option<&Value>) -> Option<i64> {
  if let Some(Value::Number(n)) = raw {
    if let Some(i) = n.as_i64() {
      return Some(i);
    }
  }
  let n = parse_optional_number(raw)?;
  if n.fract() != 0.0 || n.abs() > i64::MAX as f64 {
    return None;
  }
  Some(n as i64)
}

/// Percentage in `[0, 100]`, or `None` when it cannot be known.
///
/// An explicit percentage wins over one computed from `score_obtained / score_max`.
pub fn normalize(score_obtained: Option<f64>, score_max: Option<f64>, score_percent: Option<f64>) -> Option<f64> {
  if let Some(p) = score_percent.filter(|p| p.is_finite()) {
    return Some(p.clamp(0.0, 100.0));
  }
  match (score_obtained, score_max) {
    (Some(obtained), Some(max)) if obtained.is_finite() && max.is_finite() && max > 0.0 => {
      Some((100.0 * obtained / max).clamp(0.0, 100.0))
    }
    _ => None,
  }
}
