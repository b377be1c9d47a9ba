//! Purpose: Top-level dispatch of the dynamic value inference reader.
//! Exports: `infer_required`, `infer_optional`, `InferOptions`, `DEFAULT_MAX_DEPTH`.
//! Role: Recursive-descent dispatcher over token kinds; scalars go to `scalar`, collections to
//!       `composite`.
//! Invariants: Stateless between calls; all context travels in arguments.
//! Invariants: On success the cursor rests on the last token of the value it read.
//! Invariants: `Null` is produced only where the call site or the options permit it.

use crate::core::composite;
use crate::core::cursor::TokenCursor;
use crate::core::error::{Error, ErrorKind};
use crate::core::scalar;
use crate::core::token::TokenKind;
use crate::core::value::DynamicValue;

pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InferOptions {
    pub allow_null_in_arrays: bool,
    pub allow_null_as_property_value: bool,
    /// Maximum array/object nesting; `None` disables the check.
    pub max_depth: Option<usize>,
}

impl InferOptions {
    pub fn new() -> Self {
        Self {
            allow_null_in_arrays: true,
            allow_null_as_property_value: true,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }

    pub fn with_null_in_arrays(mut self, allow: bool) -> Self {
        self.allow_null_in_arrays = allow;
        self
    }

    pub fn with_null_as_property_value(mut self, allow: bool) -> Self {
        self.allow_null_as_property_value = allow;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for InferOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a value sits; decides whether a `Null` token is acceptable.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Site<'k> {
    Required,
    Optional,
    ArrayElement,
    PropertyValue(&'k str),
}

impl Site<'_> {
    fn allows_null(self, options: &InferOptions) -> bool {
        match self {
            Site::Required => false,
            Site::Optional => true,
            Site::ArrayElement => options.allow_null_in_arrays,
            Site::PropertyValue(_) => options.allow_null_as_property_value,
        }
    }
}

/// Infers the value at the cursor; a top-level `null` is an `UnexpectedNull` failure.
pub fn infer_required<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    options: &InferOptions,
) -> Result<DynamicValue, Error> {
    infer_value(cursor, options, 0, Site::Required)
}

/// Infers the value at the cursor; a top-level `null` yields `DynamicValue::Null`.
pub fn infer_optional<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    options: &InferOptions,
) -> Result<DynamicValue, Error> {
    infer_value(cursor, options, 0, Site::Optional)
}

pub(crate) fn infer_value<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    options: &InferOptions,
    depth: usize,
    site: Site<'_>,
) -> Result<DynamicValue, Error> {
    match cursor.current_token() {
        Some(TokenKind::True) => Ok(DynamicValue::Bool(true)),
        Some(TokenKind::False) => Ok(DynamicValue::Bool(false)),
        Some(TokenKind::Number | TokenKind::String) => scalar::classify_scalar(&*cursor),
        Some(TokenKind::StartArray) => composite::infer_array(cursor, options, depth + 1),
        Some(TokenKind::StartObject) => composite::infer_object(cursor, options, depth + 1),
        Some(TokenKind::Null) => {
            if site.allows_null(options) {
                Ok(DynamicValue::Null)
            } else {
                Err(unexpected_null(&*cursor, site))
            }
        }
        token @ (Some(TokenKind::EndArray | TokenKind::EndObject | TokenKind::PropertyName)
        | None) => Err(Error::new(ErrorKind::MalformedInput)
            .with_message(match token {
                None => "expected a value, found end of stream",
                Some(_) => "expected a value",
            })
            .with_token(token, cursor.raw_text())
            .with_offset(cursor.offset())),
    }
}

fn unexpected_null<C: TokenCursor + ?Sized>(cursor: &C, site: Site<'_>) -> Error {
    let err = Error::new(ErrorKind::UnexpectedNull).with_offset(cursor.offset());
    match site {
        Site::Required | Site::Optional => err
            .with_message("top-level value is null")
            .with_hint("Use the optional entry point to accept a null document."),
        Site::ArrayElement => err
            .with_message("null array element is not allowed")
            .with_hint("Enable null array elements to accept it."),
        Site::PropertyValue(key) => err
            .with_message("null property value is not allowed")
            .with_hint("Enable null property values to accept it.")
            .with_key(key),
    }
}
