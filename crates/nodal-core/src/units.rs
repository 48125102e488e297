//! Engineering units and SI prefix handling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// SI suffixes in descending threshold order, as emitted by [`format_value`].
const FORMAT_SCALES: [(f64, &str); 9] = [
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "meg"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "u"),
    (1e-9, "n"),
    (1e-12, "p"),
];

/// Parse an engineering-notation value.
///
/// Supported suffixes (case-insensitive):
/// - T (tera, 1e12)
/// - G (giga, 1e9)
/// - MEG (mega, 1e6)
/// - K (kilo, 1e3)
/// - M (milli, 1e-3)
/// - U or µ (micro, 1e-6)
/// - N (nano, 1e-9)
/// - P (pico, 1e-12)
/// - F (femto, 1e-15)
///
/// Letters after the suffix are unit decoration and are ignored, so `"10uF"`
/// and `"1kohm"` parse. Empty or unparseable text yields `0.0`.
pub fn parse_value(s: &str) -> f64 {
    try_parse_value(s).unwrap_or(0.0)
}

/// Like [`parse_value`], but reports unparseable text as `None`.
pub fn try_parse_value(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // f64's parser also accepts "inf" and "nan"; those are not values here.
    if let Ok(v) = s.parse::<f64>() {
        return v.is_finite().then_some(v);
    }

    let num_end = numeric_prefix_len(s);
    if num_end == 0 {
        return None;
    }

    let (num_str, suffix) = s.split_at(num_end);
    let value: f64 = num_str.parse().ok()?;

    Some(value * suffix_multiplier(suffix))
}

/// Length in bytes of the leading decimal number (sign, digits, point, exponent).
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mantissa_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if !bytes[mantissa_start..i].iter().any(u8::is_ascii_digit) {
        return 0;
    }

    // Only treat 'e' as an exponent when digits follow, so "1e" stays invalid
    // and "4.7e-3" parses whole.
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    i
}

fn suffix_multiplier(suffix: &str) -> f64 {
    let lower = suffix.to_lowercase();

    // "meg" before the single letters, otherwise it reads as milli.
    if lower.starts_with("meg") {
        return 1e6;
    }

    match lower.chars().next() {
        Some('t') => 1e12,
        Some('g') => 1e9,
        Some('k') => 1e3,
        Some('m') => 1e-3,
        Some('u') | Some('µ') | Some('μ') => 1e-6,
        Some('n') => 1e-9,
        Some('p') => 1e-12,
        Some('f') => 1e-15,
        _ => 1.0,
    }
}

/// Format a value with the largest SI prefix its magnitude clears.
///
/// Uses fixed-point notation with `precision` decimal digits. Values below
/// 1e-12 in magnitude (including zero) are expressed in femto.
pub fn format_value(value: f64, precision: usize) -> String {
    let abs_value = value.abs();

    let (scaled, suffix) = FORMAT_SCALES
        .iter()
        .find(|(threshold, _)| abs_value >= *threshold)
        .map(|&(threshold, suffix)| (value / threshold, suffix))
        .unwrap_or((value * 1e15, "f"));

    format!("{:.*}{}", precision, scaled, suffix)
}

/// A device value: either a plain number or engineering-notation text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric input, passed through unchanged.
    Number(f64),
    /// Engineering-notation text such as `"4.7k"`.
    Text(String),
}

impl Value {
    /// Numeric magnitude of this value (unparseable text is `0.0`).
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Number(v) => *v,
            Value::Text(s) => parse_value(s),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(0.0)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}
