//! Total coercions from loosely-typed external values
//!
//! Every function returns `None` for input it does not recognise; callers
//! choose the fallback. No function here panics or allocates more than its
//! output.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{JsonMap, Role};

const TRUTHY: [&str; 5] = ["true", "1", "yes", "y", "on"];
const FALSY: [&str; 5] = ["false", "0", "no", "n", "off"];
const COMPLETED: [&str; 4] = ["true", "1", "yes", "completed"];
const NOT_COMPLETED: [&str; 3] = ["false", "0", "no"];

/// Trimmed string, rejecting blanks and non-strings
#[must_use]
pub fn non_empty_string(value: &Value) -> Option<String> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty()).map(ToString::to_string)
}

/// Finite number, accepting numeric strings
#[must_use]
pub fn finite_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Whole number, truncating finite fractional input
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_i64() => n.as_i64(),
        _ => finite_number(value).map(|n| n.trunc() as i64),
    }
}

/// String entries of an array, trimmed, blanks dropped
#[must_use]
pub fn string_array(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| items.iter().filter_map(non_empty_string).collect())
}

/// JSON object; arrays and primitives are rejected
#[must_use]
pub fn plain_record(value: &Value) -> Option<JsonMap> {
    value.as_object().cloned()
}

/// Boolean from a bool, a canonical token, or `0`/`1`
#[must_use]
pub fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(true),
            Some(x) if x == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => {
            let token = s.trim().to_ascii_lowercase();
            if TRUTHY.contains(&token.as_str()) {
                Some(true)
            } else if FALSY.contains(&token.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Onboarding flag: narrower token set than [`boolean`], plus `"completed"`
///
/// Only `true`, `1`, `"true"`, `"1"`, `"yes"` and `"completed"` count as done.
#[must_use]
pub fn completion_flag(value: &Value) -> Option<bool> {
    match value {
        Value::String(s) => {
            let token = s.trim().to_ascii_lowercase();
            if COMPLETED.contains(&token.as_str()) {
                Some(true)
            } else if NOT_COMPLETED.contains(&token.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => boolean(value),
    }
}

/// Role from the closed set, else `None`
#[must_use]
pub fn known_role(value: &Value) -> Option<Role> {
    value.as_str().and_then(Role::parse)
}

/// A timestamp-like value is present (non-blank string or number)
#[must_use]
pub fn timestamp_present(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

/// Serde adapters that normalise legacy column encodings at the store boundary
pub mod lenient {
    use super::{completion_flag, whole_number, Deserialize, Deserializer, FromStr, Value};

    /// `Option<T>` from a string column; unknown strings become `None`
    ///
    /// # Errors
    /// Never fails on well-formed JSON.
    pub fn parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(Value::as_str).and_then(|s| s.parse().ok()))
    }

    /// `Option<bool>` from a bool, token string, or number
    ///
    /// # Errors
    /// Never fails on well-formed JSON.
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(completion_flag))
    }

    /// `Option<i64>` from a number or numeric string
    ///
    /// # Errors
    /// Never fails on well-formed JSON.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(whole_number))
    }
}
