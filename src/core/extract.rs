//! Purpose: Primitive token-value extractors shared by every `TokenCursor`.
//! Exports: `parse_i32`, `parse_i64`, `parse_u64`, `parse_decimal`, `parse_f64`,
//!          `parse_datetime`, `parse_uuid`, `parse_absolute_uri`.
//! Role: Exactness checks behind the scalar classifier; each returns `None` instead of rounding
//!       into a different value class.
//! Invariants: Integer extractors never accept fractional or exponent forms.
//! Invariants: Float extraction never yields a non-finite value.
//! Invariants: Date/time extraction only accepts the ISO 8601 extended profile.

use std::str::FromStr;

use rust_decimal::Decimal;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use url::Url;
use uuid::Uuid;

// Decimal::MAX is about 7.9e28.
const MAX_DECIMAL_INTEGER_DIGITS: i64 = 29;
const MAX_DECIMAL_SCALE: i64 = 28;
const EXPONENT_CAP: i64 = 1_000_000_000;
const EXPONENT_CAP_DIGITS: usize = 10;
const HYPHENATED_UUID_LEN: usize = 36;

pub fn parse_i32(raw: &str) -> Option<i32> {
    raw.parse().ok()
}

pub fn parse_i64(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

pub fn parse_u64(raw: &str) -> Option<u64> {
    raw.parse().ok()
}

/// Parses a JSON number literal into a fixed-point decimal.
///
/// The exponent is folded into the digit string before parsing, so wide mantissas with a
/// negative exponent still land on an exact decimal. Excess fractional digits round to the
/// decimal's 28-digit scale, so very small magnitudes can round to zero; callers detect that
/// case themselves. Magnitudes beyond the decimal range fail.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let (mantissa, exponent) = match raw.find(['e', 'E']) {
        Some(idx) => (&raw[..idx], parse_exponent(&raw[idx + 1..])?),
        None => (raw, 0),
    };
    let (negative, unsigned) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if int_part.is_empty() || !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }

    // Value is 0.<significant> * 10^point.
    let digits = format!("{int_part}{frac_part}");
    let significant = digits.trim_start_matches('0');
    let leading_zeros = i64::try_from(digits.len() - significant.len()).ok()?;
    let significant = significant.trim_end_matches('0');
    if significant.is_empty() {
        return Some(Decimal::ZERO);
    }
    let point = i64::try_from(int_part.len()).ok()? - leading_zeros + exponent;
    if point > MAX_DECIMAL_INTEGER_DIGITS {
        return None;
    }
    if point < -MAX_DECIMAL_SCALE {
        return Some(Decimal::ZERO);
    }

    let mut text = String::with_capacity(significant.len() + MAX_DECIMAL_SCALE as usize + 3);
    if negative {
        text.push('-');
    }
    let len = significant.len() as i64;
    if point <= 0 {
        text.push_str("0.");
        text.extend(std::iter::repeat_n('0', (-point) as usize));
        text.push_str(significant);
    } else if point >= len {
        text.push_str(significant);
        text.extend(std::iter::repeat_n('0', (point - len) as usize));
    } else {
        let (whole, fraction) = significant.split_at(point as usize);
        text.push_str(whole);
        text.push('.');
        text.push_str(fraction);
    }
    Decimal::from_str(&text).ok()
}

/// Exponent digits, saturated at `EXPONENT_CAP` so absurd exponents still classify by sign.
fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = digits.trim_start_matches('0');
    let magnitude = if digits.is_empty() {
        0
    } else if digits.len() > EXPONENT_CAP_DIGITS {
        EXPONENT_CAP
    } else {
        digits.parse::<i64>().ok()?.min(EXPONENT_CAP)
    };
    Some(if negative { -magnitude } else { magnitude })
}

pub fn parse_f64(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses an offset-aware timestamp.
///
/// Accepted: RFC 3339, ISO 8601 extended date-times with or without an offset (offset-less
/// values are taken as UTC), and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_datetime(text: &str) -> Option<OffsetDateTime> {
    if !has_extended_date_prefix(text) {
        return None;
    }
    if let Ok(value) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(value);
    }
    if let Ok(value) = OffsetDateTime::parse(text, &Iso8601::DEFAULT) {
        return Some(value);
    }
    if let Ok(value) = PrimitiveDateTime::parse(text, &Iso8601::DEFAULT) {
        return Some(value.assume_utc());
    }
    if text.len() == 10 {
        if let Ok(date) = Date::parse(text, &Iso8601::DEFAULT) {
            return Some(date.midnight().assume_utc());
        }
    }
    None
}

fn has_extended_date_prefix(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    digits(0..4)
        && bytes[4] == b'-'
        && digits(5..7)
        && bytes[7] == b'-'
        && digits(8..10)
        && (bytes.len() == 10 || matches!(bytes[10], b'T' | b't'))
}

/// Parses the canonical hyphenated UUID form only; braced, URN and bare-hex forms are rejected.
pub fn parse_uuid(text: &str) -> Option<Uuid> {
    if text.len() != HYPHENATED_UUID_LEN {
        return None;
    }
    Uuid::try_parse(text).ok()
}

/// Parses an absolute URI. Relative references, and any text containing whitespace or control
/// characters, are rejected.
pub fn parse_absolute_uri(text: &str) -> Option<Url> {
    if text.is_empty() || text.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }
    Url::parse(text).ok()
}
