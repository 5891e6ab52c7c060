//! Scalar resolution (parse direction) following the YAML 1.2 core schema.

use saphyr_parser::ScalarStyle;

use crate::error::Error;
use crate::location::Location;
use crate::tags::{classify_tag, ScalarTag};
use crate::value::{AnnotatedValue, Number};

/// Turn one scalar event into a value.
///
/// Quoted and block scalars are always strings unless a core tag says
/// otherwise. Plain scalars go through null, bool, int and float detection.
pub(crate) fn resolve_scalar(
    value: &str,
    style: ScalarStyle,
    tag: Option<&str>,
    location: Location,
) -> Result<AnnotatedValue, Error> {
    let invalid = |tag: ScalarTag| {
        Error::syntax(format!("invalid {} value `{value}`", tag.name())).with_location(location)
    };

    match classify_tag(tag) {
        Some(ScalarTag::Str) => Ok(AnnotatedValue::String(value.to_owned())),
        Some(ScalarTag::Null) => {
            if value.is_empty() || is_null_literal(value) {
                Ok(AnnotatedValue::Null)
            } else {
                Err(invalid(ScalarTag::Null))
            }
        }
        Some(ScalarTag::Bool) => parse_bool(value)
            .map(AnnotatedValue::Bool)
            .ok_or_else(|| invalid(ScalarTag::Bool)),
        Some(ScalarTag::Int) => parse_int(value)
            .map(|i| AnnotatedValue::Number(Number::Int(i)))
            .ok_or_else(|| invalid(ScalarTag::Int)),
        Some(ScalarTag::Float) => parse_float(value)
            .or_else(|| parse_int(value).map(|i| i as f64))
            .map(|f| AnnotatedValue::Number(Number::from_f64(f)))
            .ok_or_else(|| invalid(ScalarTag::Float)),
        None if matches!(style, ScalarStyle::Plain) => Ok(resolve_plain(value)),
        None => Ok(AnnotatedValue::String(value.to_owned())),
    }
}

/// Core schema resolution of an untagged plain scalar.
pub(crate) fn resolve_plain(value: &str) -> AnnotatedValue {
    if value.is_empty() || is_null_literal(value) {
        return AnnotatedValue::Null;
    }
    if let Some(b) = parse_bool(value) {
        return AnnotatedValue::Bool(b);
    }
    if let Some(n) = parse_number(value) {
        return AnnotatedValue::Number(n);
    }
    AnnotatedValue::String(value.to_owned())
}

/// Integer first, then float. Decimal integers too large for `i128` fall
/// back to a float.
pub(crate) fn parse_number(value: &str) -> Option<Number> {
    if let Some(i) = parse_int(value) {
        return Some(Number::Int(i));
    }
    parse_float(value).map(Number::from_f64)
}

pub(crate) fn is_null_literal(s: &str) -> bool {
    matches!(s, "~" | "null" | "Null" | "NULL")
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Recognize a YAML 1.1 boolean (the "Norway problem" forms).
///
/// Accepted TRUE literals (case-insensitive): "y", "yes", "true", "on"
/// Accepted FALSE literals (case-insensitive): "n", "no", "false", "off"
///
/// Such strings resolve to booleans in older YAML readers, so the emitter
/// quotes them even though this crate reads them as strings.
pub(crate) fn is_yaml11_bool(s: &str) -> bool {
    ["y", "yes", "true", "on", "n", "no", "false", "off"]
        .iter()
        .any(|lit| s.eq_ignore_ascii_case(lit))
}

fn parse_digits_u128(digits: &str, radix: u32) -> Option<u128> {
    if digits.is_empty() {
        return None;
    }
    let mut val: u128 = 0;
    for c in digits.chars() {
        let d = c.to_digit(radix)?;
        val = val.checked_mul(radix as u128)?;
        val = val.checked_add(d as u128)?;
    }
    Some(val)
}

fn parse_decimal_i128(digits: &str, neg: bool) -> Option<i128> {
    if digits.is_empty() {
        return None;
    }
    // Accumulate with the final sign so i128::MIN is reachable.
    let mut val: i128 = 0;
    for b in digits.bytes() {
        let d = match b {
            b'0'..=b'9' => (b - b'0') as i128,
            _ => return None,
        };
        val = val.checked_mul(10)?;
        val = if neg {
            val.checked_sub(d)?
        } else {
            val.checked_add(d)?
        };
    }
    Some(val)
}

/// Core schema integer: `[-+]?[0-9]+`, `0o[0-7]+`, `0x[0-9a-fA-F]+`.
pub(crate) fn parse_int(s: &str) -> Option<i128> {
    if let Some(hex) = s.strip_prefix("0x") {
        return parse_digits_u128(hex, 16).and_then(|v| i128::try_from(v).ok());
    }
    if let Some(oct) = s.strip_prefix("0o") {
        return parse_digits_u128(oct, 8).and_then(|v| i128::try_from(v).ok());
    }
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    parse_decimal_i128(digits, neg)
}

/// Core schema float, including `.inf`, `-.inf`, `.nan` and exponent forms.
///
/// Rust's own float parser also accepts `inf`, `NaN` and `infinity`; those
/// are strings in YAML and are rejected before delegating to it.
pub(crate) fn parse_float(s: &str) -> Option<f64> {
    match s {
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if !is_core_float_syntax(s) {
        return None;
    }
    s.parse::<f64>().ok()
}

/// `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`
fn is_core_float_syntax(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut frac_digits = 0;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == b.len()
}
