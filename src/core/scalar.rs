//! Purpose: Classify number and string tokens into their most specific scalar variant.
//! Exports: `classify_scalar`, `classify_number`, `classify_string`, `classify_text`.
//! Role: Leaf of the inference engine; pure functions of the current token.
//! Invariants: Never advances the cursor.
//! Invariants: Number order: int32 > int64 > uint64 > decimal/float64 > text.
//! Invariants: String order: datetime > uuid > uri > text; no base64 sniffing.

use tracing::trace;

use crate::core::cursor::TokenCursor;
use crate::core::error::{Error, ErrorKind};
use crate::core::extract;
use crate::core::token::TokenKind;
use crate::core::value::DynamicValue;

// Smallest positive subnormal f64.
const SMALLEST_POSITIVE_F64: f64 = 5e-324;

/// Classifies the current `Number` or `String` token.
pub fn classify_scalar<C: TokenCursor + ?Sized>(cursor: &C) -> Result<DynamicValue, Error> {
    match cursor.current_token() {
        Some(TokenKind::Number) => Ok(classify_number(cursor)),
        Some(TokenKind::String) => classify_string(cursor),
        other => Err(Error::new(ErrorKind::MalformedInput)
            .with_message("scalar classification requires a number or string token")
            .with_token(other, cursor.raw_text())
            .with_offset(cursor.offset())),
    }
}

pub fn classify_number<C: TokenCursor + ?Sized>(cursor: &C) -> DynamicValue {
    if let Some(value) = cursor.try_as_i32() {
        return DynamicValue::Int32(value);
    }
    if let Some(value) = cursor.try_as_i64() {
        return DynamicValue::Int64(value);
    }
    if let Some(value) = cursor.try_as_u64() {
        return DynamicValue::UInt64(value);
    }

    match (cursor.try_as_decimal(), cursor.try_as_f64()) {
        (Some(decimal), Some(float)) if decimal.is_zero() && float.abs() > SMALLEST_POSITIVE_F64 => {
            trace!(raw = %cursor.raw_text(), "decimal rounded to zero; keeping float64");
            DynamicValue::Float64(float)
        }
        (Some(decimal), _) => DynamicValue::Decimal(decimal),
        (None, Some(float)) => DynamicValue::Float64(float),
        (None, None) => {
            trace!(raw = %cursor.raw_text(), "number fits no numeric type; keeping text");
            DynamicValue::Text(cursor.raw_text().into_owned())
        }
    }
}

pub fn classify_string<C: TokenCursor + ?Sized>(cursor: &C) -> Result<DynamicValue, Error> {
    if let Some(value) = cursor.try_as_datetime() {
        return Ok(DynamicValue::DateTime(value));
    }
    if let Some(value) = cursor.try_as_uuid() {
        return Ok(DynamicValue::Uuid(value));
    }
    let text = cursor.as_string()?;
    Ok(uri_or_text(text))
}

/// Applies the string classification order to already-decoded text.
pub fn classify_text(text: &str) -> DynamicValue {
    if let Some(value) = extract::parse_datetime(text) {
        return DynamicValue::DateTime(value);
    }
    if let Some(value) = extract::parse_uuid(text) {
        return DynamicValue::Uuid(value);
    }
    uri_or_text(text.to_string())
}

fn uri_or_text(text: String) -> DynamicValue {
    match extract::parse_absolute_uri(&text) {
        Some(uri) => DynamicValue::Uri(uri),
        None => DynamicValue::Text(text),
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::{classify_number, classify_scalar, classify_text};
    use crate::core::cursor::{JsonCursor, TokenCursor};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::token::TokenKind;
    use crate::core::value::DynamicValue;

    fn classify(json: &str) -> DynamicValue {
        let mut cursor = JsonCursor::from_text(json);
        assert!(cursor.advance().expect("advance"));
        classify_scalar(&cursor).expect("classify")
    }

    #[test]
    fn integers_use_smallest_exact_width() {
        let cases = [
            ("0", DynamicValue::Int32(0)),
            ("-2147483648", DynamicValue::Int32(i32::MIN)),
            ("2147483647", DynamicValue::Int32(i32::MAX)),
            ("2147483648", DynamicValue::Int64(2_147_483_648)),
            ("-2147483649", DynamicValue::Int64(-2_147_483_649)),
            ("9223372036854775807", DynamicValue::Int64(i64::MAX)),
            ("-9223372036854775808", DynamicValue::Int64(i64::MIN)),
            ("9223372036854775808", DynamicValue::UInt64(9_223_372_036_854_775_808)),
            ("18446744073709551615", DynamicValue::UInt64(u64::MAX)),
        ];
        for (raw, expected) in cases {
            assert_eq!(classify(raw), expected, "classifying {raw}");
        }
    }

    #[test]
    fn integer_widths_round_trip_across_boundaries() {
        let boundaries: [i128; 8] = [
            i128::from(i32::MIN),
            i128::from(i32::MAX),
            i128::from(i64::MIN),
            i128::from(i64::MAX),
            i128::from(u64::MAX),
            0,
            -1,
            1,
        ];
        for base in boundaries {
            for delta in -2i128..=2 {
                let value = base + delta;
                let raw = value.to_string();
                let classified = classify(&raw);
                if i32::try_from(value).is_ok() {
                    assert!(matches!(classified, DynamicValue::Int32(_)), "{raw}");
                } else if i64::try_from(value).is_ok() {
                    assert!(matches!(classified, DynamicValue::Int64(_)), "{raw}");
                } else if u64::try_from(value).is_ok() {
                    assert!(matches!(classified, DynamicValue::UInt64(_)), "{raw}");
                } else {
                    assert!(matches!(classified, DynamicValue::Decimal(_)), "{raw}");
                    continue;
                }
                assert_eq!(classified.as_i128(), Some(value), "{raw}");
            }
        }
    }

    #[test]
    fn fractional_numbers_prefer_decimal() {
        assert_eq!(
            classify("1.5"),
            DynamicValue::Decimal(Decimal::from_str("1.5").unwrap())
        );
        assert_eq!(
            classify("-0.1"),
            DynamicValue::Decimal(Decimal::from_str("-0.1").unwrap())
        );
        assert_eq!(classify("1e2"), DynamicValue::Decimal(Decimal::from(100)));
    }

    #[test]
    fn degenerate_decimal_escapes_to_float() {
        assert_eq!(classify("1E-29"), DynamicValue::Float64(1e-29));
        assert_eq!(
            classify("0.00000000000000000000000000000001"),
            DynamicValue::Float64(1e-32)
        );
    }

    #[test]
    fn genuine_zero_stays_decimal() {
        assert_eq!(classify("0.0"), DynamicValue::Decimal(Decimal::ZERO));
        assert_eq!(classify("0e10"), DynamicValue::Decimal(Decimal::ZERO));
        assert_eq!(
            classify("0e99999999999999999999"),
            DynamicValue::Decimal(Decimal::ZERO)
        );
        assert_eq!(classify("1e-400"), DynamicValue::Decimal(Decimal::ZERO));
        assert_eq!(
            classify("1e-99999999999999999999"),
            DynamicValue::Decimal(Decimal::ZERO)
        );
    }

    #[test]
    fn wide_mantissas_with_negative_exponents_stay_decimal() {
        assert_eq!(
            classify("100000000000000000000000000000e-2"),
            DynamicValue::Decimal(Decimal::from_str("1000000000000000000000000000").unwrap())
        );
        assert!(matches!(
            classify("12345678901234567890123456789012e-5"),
            DynamicValue::Decimal(_)
        ));
    }

    #[test]
    fn out_of_decimal_range_uses_float_then_text() {
        assert_eq!(classify("1e300"), DynamicValue::Float64(1e300));
        assert_eq!(classify("1e309"), DynamicValue::Text("1e309".to_string()));
    }

    #[test]
    fn integers_beyond_u64_become_decimal() {
        assert_eq!(
            classify("18446744073709551616"),
            DynamicValue::Decimal(Decimal::from_str("18446744073709551616").unwrap())
        );
    }

    #[test]
    fn strings_are_classified_in_order() {
        assert!(matches!(
            classify(r#""2024-01-02T03:04:05Z""#),
            DynamicValue::DateTime(_)
        ));
        assert!(matches!(
            classify(r#""550e8400-e29b-41d4-a716-446655440000""#),
            DynamicValue::Uuid(_)
        ));
        assert!(matches!(
            classify(r#""https://example.com/x""#),
            DynamicValue::Uri(_)
        ));
        assert_eq!(
            classify(r#""plain words""#),
            DynamicValue::Text("plain words".to_string())
        );
        // Looks like base64 but stays text.
        assert_eq!(
            classify(r#""SGVsbG8gV29ybGQ=""#),
            DynamicValue::Text("SGVsbG8gV29ybGQ=".to_string())
        );
    }

    #[test]
    fn urn_uuid_is_a_uri_not_a_uuid() {
        let value = classify(r#""urn:uuid:550e8400-e29b-41d4-a716-446655440000""#);
        assert!(matches!(value, DynamicValue::Uri(_)));
    }

    #[test]
    fn escaped_strings_are_decoded_before_classification() {
        assert_eq!(
            classify(r#""https:\/\/example.com\/""#),
            DynamicValue::Uri(url::Url::parse("https://example.com/").unwrap())
        );
    }

    #[test]
    fn structural_tokens_are_rejected() {
        let mut cursor = JsonCursor::from_text("[1]");
        assert!(cursor.advance().expect("advance"));
        let err = classify_scalar(&cursor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert_eq!(err.token(), Some(TokenKind::StartArray));
    }

    #[test]
    fn text_fallbacks_never_reclassify() {
        let fallbacks = ["1e309", "-1e400", "plain", "12:30", "SGVsbG8="];
        for raw in fallbacks {
            let first = classify_text(raw);
            assert_eq!(first, DynamicValue::Text(raw.to_string()));
            let again = classify_text(first.as_str().expect("text"));
            assert_eq!(again, first);
        }
        let number_fallback = classify("1e309");
        let text = number_fallback.as_str().expect("text");
        assert_eq!(classify_text(text), number_fallback);
    }

    /// Cursor whose string token claims to be every kind of string at once.
    struct AmbiguousString;

    impl TokenCursor for AmbiguousString {
        fn current_token(&self) -> Option<TokenKind> {
            Some(TokenKind::String)
        }

        fn advance(&mut self) -> Result<bool, Error> {
            Ok(false)
        }

        fn raw_text(&self) -> Cow<'_, str> {
            Cow::Borrowed("https://example.com/ambiguous")
        }

        fn offset(&self) -> u64 {
            0
        }

        fn try_as_datetime(&self) -> Option<OffsetDateTime> {
            Some(OffsetDateTime::UNIX_EPOCH)
        }

        fn try_as_uuid(&self) -> Option<Uuid> {
            Some(Uuid::nil())
        }
    }

    #[test]
    fn datetime_wins_over_uuid_and_uri() {
        let value = classify_scalar(&AmbiguousString).expect("classify");
        assert_eq!(value, DynamicValue::DateTime(OffsetDateTime::UNIX_EPOCH));
    }

    /// Cursor whose number token is both a valid decimal and float, with no integer form.
    struct ScriptedNumber {
        decimal: Option<Decimal>,
        float: Option<f64>,
    }

    impl TokenCursor for ScriptedNumber {
        fn current_token(&self) -> Option<TokenKind> {
            Some(TokenKind::Number)
        }

        fn advance(&mut self) -> Result<bool, Error> {
            Ok(false)
        }

        fn raw_text(&self) -> Cow<'_, str> {
            Cow::Borrowed("scripted")
        }

        fn offset(&self) -> u64 {
            0
        }

        fn try_as_decimal(&self) -> Option<Decimal> {
            self.decimal
        }

        fn try_as_f64(&self) -> Option<f64> {
            self.float
        }
    }

    #[test]
    fn number_fallback_table() {
        let half = Decimal::from_str("0.5").unwrap();
        let cases = [
            (Some(half), Some(0.5), DynamicValue::Decimal(half)),
            (None, Some(2.5), DynamicValue::Float64(2.5)),
            (Some(Decimal::ZERO), Some(1e-40), DynamicValue::Float64(1e-40)),
            (Some(Decimal::ZERO), Some(0.0), DynamicValue::Decimal(Decimal::ZERO)),
            (None, None, DynamicValue::Text("scripted".to_string())),
        ];
        for (decimal, float, expected) in cases {
            let cursor = ScriptedNumber { decimal, float };
            assert_eq!(classify_number(&cursor), expected);
        }
    }
}
