//! Purpose: Define the stable public Rust API boundary for dynjson.
//! Exports: Value model, inference entry points, cursor seam, and error types.
//! Role: Public, additive-only surface used by the CLI and library callers.
//! Invariants: This module is the supported path to the inference engine.
//! Invariants: Entry points take explicit options; nothing is configured globally.

mod document;

pub use crate::core::composite::{homogeneous_element_type, unify_array};
pub use crate::core::cursor::{JsonCursor, TokenCursor};
pub use crate::core::describe::{describe, to_plain_json};
pub use crate::core::engine::{DEFAULT_MAX_DEPTH, InferOptions, infer_optional, infer_required};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::scalar::classify_text;
pub use crate::core::token::TokenKind;
pub use crate::core::value::{DynamicMap, DynamicValue, ElementType, TypeTag};
pub use document::{
    Presence, from_reader, from_slice, from_slice_optional, from_str, from_str_optional,
};
