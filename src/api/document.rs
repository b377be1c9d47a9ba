//! Purpose: Whole-document entry points over the built-in tokenizer.
//! Exports: `Presence`, `from_slice`, `from_slice_optional`, `from_str`, `from_str_optional`,
//!          `from_reader`.
//! Role: Positions a `JsonCursor` on the first token, runs the engine, then requires end of
//!       stream. Readers are pulled incrementally, never buffered whole.
//! Invariants: Exactly one JSON value per document; trailing content is `MalformedInput`.
//! Invariants: Reader I/O failures map to `ErrorKind::Io` with the source attached.

use std::io::Read;

use tracing::debug;

use crate::core::cursor::{JsonCursor, TokenCursor};
use crate::core::engine::{InferOptions, infer_optional, infer_required};
use crate::core::error::{Error, ErrorKind};
use crate::core::value::DynamicValue;

/// Whether a top-level `null` document is acceptable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Presence {
    Required,
    Optional,
}

pub fn from_slice(input: &[u8], options: &InferOptions) -> Result<DynamicValue, Error> {
    read_slice(input, options, Presence::Required)
}

pub fn from_slice_optional(input: &[u8], options: &InferOptions) -> Result<DynamicValue, Error> {
    read_slice(input, options, Presence::Optional)
}

pub fn from_str(input: &str, options: &InferOptions) -> Result<DynamicValue, Error> {
    read_slice(input.as_bytes(), options, Presence::Required)
}

pub fn from_str_optional(input: &str, options: &InferOptions) -> Result<DynamicValue, Error> {
    read_slice(input.as_bytes(), options, Presence::Optional)
}

/// Infers one document pulled from `reader`; the stream is consumed through its end.
pub fn from_reader<R: Read>(
    reader: R,
    options: &InferOptions,
    presence: Presence,
) -> Result<DynamicValue, Error> {
    debug!(?presence, ?options, "inferring streamed document");
    read_document(JsonCursor::new(reader), options, presence)
}

fn read_document<R: Read>(
    mut cursor: JsonCursor<R>,
    options: &InferOptions,
    presence: Presence,
) -> Result<DynamicValue, Error> {
    cursor.advance()?;
    let value = match presence {
        Presence::Required => infer_required(&mut cursor, options)?,
        Presence::Optional => infer_optional(&mut cursor, options)?,
    };
    if cursor.advance()? {
        return Err(Error::new(ErrorKind::MalformedInput)
            .with_message("unexpected token after top-level value")
            .with_token(cursor.current_token(), cursor.raw_text())
            .with_offset(cursor.offset()));
    }
    Ok(value)
}

fn read_slice(
    input: &[u8],
    options: &InferOptions,
    presence: Presence,
) -> Result<DynamicValue, Error> {
    debug!(bytes = input.len(), ?presence, ?options, "inferring document");
    read_document(JsonCursor::new(input), options, presence)
}
