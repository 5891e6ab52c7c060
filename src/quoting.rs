//! Decides how strings are written by the emitter: plain or double-quoted.

use std::fmt::Write;

use crate::parse_scalars::{is_yaml11_bool, parse_number};

const INDICATORS: &[u8] = b"-?:[]{}#&*!|>'\"%@`,";

fn starts_with_indicator_or_space(s: &str) -> bool {
    let first = s.as_bytes()[0];
    first.is_ascii_whitespace() || INDICATORS.contains(&first)
}

/// Returns true if `s` can be written as a plain mapping key.
///
/// Keys are read back as their source text, so only syntax matters here:
/// a key like `123` or `true` stays the string it was.
pub(crate) fn is_plain_key_safe(s: &str) -> bool {
    if s.is_empty() || s == "<<" || s == "~" {
        return false;
    }
    if starts_with_indicator_or_space(s) || s.ends_with(char::is_whitespace) {
        return false;
    }
    if s.chars().any(|c| c.is_control()) {
        return false;
    }
    !(s.contains(':') || s.contains('#') || s.contains(['[', ']', '{', '}', ',']))
}

/// Returns true if the string value `s` must be double-quoted to read back
/// as the same string.
pub(crate) fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || s == "~" {
        return true;
    }
    if s.eq_ignore_ascii_case("null") || is_yaml11_bool(s) {
        return true;
    }
    if s.as_bytes()[0].is_ascii_digit() {
        return true;
    }
    if s.contains(':') || s.contains('\n') {
        return true;
    }
    // Numbers, including `.inf`, `-.nan` style specials.
    if parse_number(s).is_some() {
        return true;
    }
    if starts_with_indicator_or_space(s) || s.ends_with(char::is_whitespace) {
        return true;
    }
    s.contains(" #") || s.contains(['#', '[', ']', '{', '}', ',']) || s.chars().any(|c| c.is_control())
}

/// Append `s` as a double-quoted YAML scalar with escapes.
pub(crate) fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\u{1b}' => out.push_str("\\e"),
            '\u{FEFF}' => out.push_str("\\uFEFF"),
            '\u{0085}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if (c as u32) <= 0xFF && c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Append a string value, quoting only when needed.
pub(crate) fn write_string_value(out: &mut String, s: &str) {
    if needs_quotes(s) {
        write_quoted(out, s);
    } else {
        out.push_str(s);
    }
}

/// Append a mapping key, quoting only when needed.
pub(crate) fn write_key(out: &mut String, key: &str) {
    if is_plain_key_safe(key) {
        out.push_str(key);
    } else {
        write_quoted(out, key);
    }
}
