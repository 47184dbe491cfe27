//! # Primitive Coercion
//!
//! The four primitives follow deliberately different strictness rules:
//!
//! | Target   | Rule |
//! |----------|------|
//! | `int`    | Permissive; never fails. |
//! | `float`  | Strict; input must be a number. |
//! | `string` | Strict; input must be a string. |
//! | `bool`   | Truthiness; never fails. |
//!
//! Form bodies deliver every value as a string, so `int` and `bool` fields
//! bind from forms while `float` fields only bind from JSON numbers.

use serde_json::Value;

/// Convert any value to an integer.
///
/// - Integers pass through; unsigned values above `i64::MAX` saturate.
/// - Floats truncate toward zero, saturate at the `i64` range, NaN is 0.
/// - `true` is 1, `false` is 0.
/// - Strings use their leading numeric prefix (see [`numeric_prefix`]);
///   no prefix gives 0.
/// - Arrays and mappings are 0 when empty, 1 otherwise.
pub fn coerce_int(raw: &Value) -> i64 {
    match raw {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i,
            (None, Some(_)) => i64::MAX,
            (None, None) => float_to_int(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => string_to_int(s),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
    }
}

/// Convert a JSON number to a float; anything else is rejected.
pub fn coerce_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Truthiness: false for `false`, `0`, `0.0`, `""`, `"0"`, empty arrays,
/// empty mappings, and null; true for everything else.
pub fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Truncate toward zero, saturating at the `i64` range; NaN becomes 0.
fn float_to_int(f: f64) -> i64 {
    f as i64
}

fn string_to_int(s: &str) -> i64 {
    let trimmed = s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    match numeric_prefix(trimmed) {
        None => 0,
        Some((prefix, true)) => prefix
            .parse::<i64>()
            .unwrap_or_else(|_| float_to_int(prefix.parse::<f64>().unwrap_or(0.0))),
        Some((prefix, false)) => float_to_int(prefix.parse::<f64>().unwrap_or(0.0)),
    }
}

/// The longest prefix of `s` matching
/// `[+-]?(digits[.digits]|.digits)([eE][+-]?digits)?`, and whether it is a
/// plain integer (no fraction, no exponent).
pub fn numeric_prefix(s: &str) -> Option<(&str, bool)> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_end = digits_from(end);
    let has_int = int_end > end;
    end = int_end;
    let mut integral = true;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            end = frac_end;
            integral = false;
        } else if !has_int {
            return None;
        }
    } else if !has_int {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
            integral = false;
        }
    }

    Some((&s[..end], integral))
}
