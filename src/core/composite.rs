//! Purpose: Resolve JSON arrays and objects into native collections.
//! Exports: `homogeneous_element_type`, `unify_array`.
//! Role: Recursive half of the inference engine; calls back into `engine` per element/value.
//! Invariants: On success the cursor rests on the matching `EndArray`/`EndObject`.
//! Invariants: A map never holds the same key twice; a repeat is a `DuplicateKey` failure.
//! Invariants: Arrays are homogeneous only when exactly one non-null type tag is present.

use indexmap::map::Entry;
use tracing::trace;

use crate::core::cursor::TokenCursor;
use crate::core::engine::{self, InferOptions, Site};
use crate::core::error::{Error, ErrorKind};
use crate::core::token::TokenKind;
use crate::core::value::{DynamicMap, DynamicValue, ElementType, TypeTag};

/// Reads the array the cursor is positioned on (`StartArray`) through its `EndArray`.
pub(crate) fn infer_array<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    options: &InferOptions,
    depth: usize,
) -> Result<DynamicValue, Error> {
    check_depth(cursor, options, depth)?;
    let mut items = Vec::new();
    loop {
        advance_within(cursor, "array")?;
        if cursor.current_token() == Some(TokenKind::EndArray) {
            break;
        }
        items.push(engine::infer_value(cursor, options, depth, Site::ArrayElement)?);
    }
    Ok(unify_array(items))
}

/// Reads the object the cursor is positioned on (`StartObject`) through its `EndObject`.
pub(crate) fn infer_object<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    options: &InferOptions,
    depth: usize,
) -> Result<DynamicValue, Error> {
    check_depth(cursor, options, depth)?;
    let mut map = DynamicMap::new();
    loop {
        advance_within(cursor, "object")?;
        match cursor.current_token() {
            Some(TokenKind::EndObject) => break,
            Some(TokenKind::PropertyName) => {}
            other => {
                return Err(Error::new(ErrorKind::MalformedInput)
                    .with_message("expected a property name or end of object")
                    .with_token(other, cursor.raw_text())
                    .with_offset(cursor.offset()));
            }
        }
        let key_offset = cursor.offset();
        let key = cursor.as_string()?;
        advance_within(cursor, "object")?;
        let value = engine::infer_value(cursor, options, depth, Site::PropertyValue(&key))?;
        match map.entry(key) {
            Entry::Occupied(entry) => {
                return Err(Error::new(ErrorKind::DuplicateKey)
                    .with_message("property name repeated within one object")
                    .with_key(entry.key().as_str())
                    .with_offset(key_offset));
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    Ok(DynamicValue::Map(map))
}

/// Element type shared by every non-null item, or `None` when the items carry zero or several
/// distinct type tags. The element type is nullable when any item is `Null`.
pub fn homogeneous_element_type(items: &[DynamicValue]) -> Option<ElementType> {
    let mut unified: Option<TypeTag> = None;
    let mut saw_null = false;
    for item in items {
        let Some(tag) = item.type_tag() else {
            saw_null = true;
            continue;
        };
        match &unified {
            None => unified = Some(tag),
            Some(existing) if *existing == tag => {}
            Some(existing) => {
                trace!(first = %existing, other = %tag, "array elements disagree on type");
                return None;
            }
        }
    }
    unified.map(|tag| ElementType {
        tag,
        nullable: saw_null,
    })
}

/// Wraps resolved elements in the homogeneous or heterogeneous array variant.
pub fn unify_array(items: Vec<DynamicValue>) -> DynamicValue {
    match homogeneous_element_type(&items) {
        Some(element) => DynamicValue::HomogeneousArray(element, items),
        None => DynamicValue::HeterogeneousArray(items),
    }
}

fn advance_within<C: TokenCursor + ?Sized>(cursor: &mut C, container: &str) -> Result<(), Error> {
    if cursor.advance()? {
        return Ok(());
    }
    Err(Error::new(ErrorKind::MalformedInput)
        .with_message(format!("unexpected end of stream inside {container}"))
        .with_offset(cursor.offset()))
}

fn check_depth<C: TokenCursor + ?Sized>(
    cursor: &C,
    options: &InferOptions,
    depth: usize,
) -> Result<(), Error> {
    match options.max_depth {
        Some(max) if depth > max => Err(Error::new(ErrorKind::DepthLimit)
            .with_message(format!("nesting depth exceeds limit of {max}"))
            .with_hint("Raise the depth limit or flatten the document.")
            .with_offset(cursor.offset())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{homogeneous_element_type, unify_array};
    use crate::core::value::{DynamicValue, ElementType, TypeTag};

    #[test]
    fn single_tag_is_homogeneous() {
        let items = vec![DynamicValue::Int32(1), DynamicValue::Int32(2)];
        assert_eq!(
            homogeneous_element_type(&items),
            Some(ElementType::new(TypeTag::Int32))
        );
    }

    #[test]
    fn nulls_make_the_tag_nullable_only() {
        let items = vec![DynamicValue::Null, DynamicValue::Bool(true)];
        assert_eq!(
            homogeneous_element_type(&items),
            Some(ElementType::nullable(TypeTag::Bool))
        );
    }

    #[test]
    fn mixed_integer_widths_are_heterogeneous() {
        let items = vec![DynamicValue::Int32(1), DynamicValue::Int64(i64::MAX)];
        assert_eq!(homogeneous_element_type(&items), None);
        assert!(matches!(
            unify_array(items),
            DynamicValue::HeterogeneousArray(_)
        ));
    }

    #[test]
    fn no_non_null_items_means_no_unification() {
        assert_eq!(homogeneous_element_type(&[]), None);
        assert_eq!(
            homogeneous_element_type(&[DynamicValue::Null, DynamicValue::Null]),
            None
        );
        assert_eq!(
            unify_array(vec![DynamicValue::Null]),
            DynamicValue::HeterogeneousArray(vec![DynamicValue::Null])
        );
    }

    #[test]
    fn nested_arrays_compare_by_element_type() {
        let ints = |values: &[i32]| {
            unify_array(values.iter().copied().map(DynamicValue::Int32).collect())
        };
        let same = vec![ints(&[1, 2]), ints(&[3])];
        assert_eq!(
            homogeneous_element_type(&same),
            Some(ElementType::new(TypeTag::Array(Box::new(ElementType::new(
                TypeTag::Int32
            )))))
        );

        let with_empty = vec![ints(&[1]), ints(&[])];
        assert_eq!(homogeneous_element_type(&with_empty), None);
    }
}
