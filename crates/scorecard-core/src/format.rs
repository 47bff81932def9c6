//! Display formatting for report values.
//!
//! Every formatter takes an optional value and returns a display string.
//! Absent or non-finite input always yields [`PLACEHOLDER`]; nothing here
//! panics or returns an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{DateValue, PriceBand};

/// Shown wherever a value is missing or unusable.
pub const PLACEHOLDER: &str = "—";

const DISPLAY_DATE: &str = "%-d %b %Y";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

fn finite(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.is_finite())
}

/// Rounds half away from zero to `dp` places and renders exactly `dp` digits.
///
/// Magnitudes beyond what `Decimal` can hold at `dp` places use the float
/// formatter instead, so the digit count never shrinks.
fn fixed(value: f64, dp: u32) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let decimal = Decimal::from_f64(value).and_then(|d| {
        let mut d = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        if d.is_zero() {
            d = Decimal::ZERO;
        }
        d.rescale(dp);
        (d.scale() == dp).then(|| d.to_string())
    });
    Some(decimal.unwrap_or_else(|| format!("{:.*}", dp as usize, value)))
}

/// Inserts `,` every three digits of the integer part.
fn group_thousands(text: &str) -> String {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// ₹ crore amount with two decimals and grouping: `1234.5` → `"1,234.50"`.
pub fn format_currency_crore(x: Option<f64>) -> String {
    finite(x)
        .and_then(|v| fixed(v, 2))
        .map(|s| group_thousands(&s))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Fraction as a one-decimal percentage: `0.123` → `"12.3%"`.
pub fn format_percent(x: Option<f64>) -> String {
    finite(x)
        .and_then(|v| fixed(v * 100.0, 1))
        .map(|s| format!("{s}%"))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Whole number with grouping: `1234567.4` → `"1,234,567"`.
pub fn format_integer(x: Option<f64>) -> String {
    finite(x)
        .and_then(|v| fixed(v, 0))
        .map(|s| group_thousands(&s))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Plain two-decimal number for ratios: `0.456` → `"0.46"`.
pub fn format_ratio(x: Option<f64>) -> String {
    finite(x)
        .and_then(|v| fixed(v, 2))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Score exactly as sent, without padding: `7.5` → `"7.5"`, `80.0` → `"80"`.
pub fn format_score(x: Option<f64>) -> String {
    match finite(x) {
        Some(v) if v == 0.0 => "0".to_string(),
        Some(v) => v.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Fraction clamped to [0, 1] shown as a rounded whole percentage.
pub fn format_whole_percent(x: Option<f64>) -> String {
    match finite(x) {
        Some(v) => format!("{}%", (v.clamp(0.0, 1.0) * 100.0).round() as i64),
        None => PLACEHOLDER.to_string(),
    }
}

/// Model confidence: `0.8675` → `"87%"`. Out-of-range input is clamped.
pub fn format_confidence(x: Option<f64>) -> String {
    format_whole_percent(x)
}

/// `"450 – 475"`, or a single price for fixed-price issues.
pub fn format_price_band(band: Option<&PriceBand>) -> String {
    match band {
        Some(b) if b.low.is_finite() && b.high.is_finite() => {
            if b.is_fixed() {
                format!("{}", b.low)
            } else {
                format!("{} – {}", b.low, b.high)
            }
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Free text, with blank treated as missing.
pub fn format_text(s: Option<&str>) -> String {
    match s.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Best-effort calendar date parse of an ISO-like string or epoch millis.
pub fn parse_date(value: &DateValue) -> Option<NaiveDate> {
    match value {
        DateValue::Timestamp(ms) => DateTime::from_timestamp_millis(*ms).map(|dt| dt.date_naive()),
        DateValue::Text(raw) => {
            let s = raw.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.date_naive());
            }
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                        .map(|dt| dt.date())
                })
        }
    }
}

/// `"5 Sep 2024"`, or the placeholder if the date cannot be parsed.
pub fn format_date(value: Option<&DateValue>) -> String {
    value
        .and_then(parse_date)
        .map(|d| d.format(DISPLAY_DATE).to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
