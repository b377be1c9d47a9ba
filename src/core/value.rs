//! Purpose: Define the inferred value tree and its type tags.
//! Exports: `DynamicValue`, `TypeTag`, `ElementType`, `DynamicMap`.
//! Role: Output model of the inference engine; owned tree, no sharing.
//! Invariants: `DynamicMap` keys are unique and keep insertion order.
//! Invariants: `HomogeneousArray` tags describe every non-null element exactly.
//! Invariants: Type tags are plain data and compare structurally.

use std::fmt;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

pub type DynamicMap = IndexMap<String, DynamicValue>;

#[derive(Clone, Debug, PartialEq)]
pub enum DynamicValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt64(u64),
    Decimal(Decimal),
    Float64(f64),
    Text(String),
    DateTime(OffsetDateTime),
    Uuid(Uuid),
    Uri(Url),
    HomogeneousArray(ElementType, Vec<DynamicValue>),
    HeterogeneousArray(Vec<DynamicValue>),
    Map(DynamicMap),
}

/// Underlying (non-null) type of a value.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeTag {
    Bool,
    Int32,
    Int64,
    UInt64,
    Decimal,
    Float64,
    Text,
    DateTime,
    Uuid,
    Uri,
    /// Homogeneous array with the given element type.
    Array(Box<ElementType>),
    /// Heterogeneous array; elements share no single type.
    AnyArray,
    Map,
}

/// Declared element type of a homogeneous array.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementType {
    pub tag: TypeTag,
    pub nullable: bool,
}

impl ElementType {
    pub fn new(tag: TypeTag) -> Self {
        Self {
            tag,
            nullable: false,
        }
    }

    pub fn nullable(tag: TypeTag) -> Self {
        Self {
            tag,
            nullable: true,
        }
    }
}

impl DynamicValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    /// Underlying type of the value; `None` for `Null`.
    pub fn type_tag(&self) -> Option<TypeTag> {
        let tag = match self {
            DynamicValue::Null => return None,
            DynamicValue::Bool(_) => TypeTag::Bool,
            DynamicValue::Int32(_) => TypeTag::Int32,
            DynamicValue::Int64(_) => TypeTag::Int64,
            DynamicValue::UInt64(_) => TypeTag::UInt64,
            DynamicValue::Decimal(_) => TypeTag::Decimal,
            DynamicValue::Float64(_) => TypeTag::Float64,
            DynamicValue::Text(_) => TypeTag::Text,
            DynamicValue::DateTime(_) => TypeTag::DateTime,
            DynamicValue::Uuid(_) => TypeTag::Uuid,
            DynamicValue::Uri(_) => TypeTag::Uri,
            DynamicValue::HomogeneousArray(element, _) => {
                TypeTag::Array(Box::new(element.clone()))
            }
            DynamicValue::HeterogeneousArray(_) => TypeTag::AnyArray,
            DynamicValue::Map(_) => TypeTag::Map,
        };
        Some(tag)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer value of any integer variant, widened to `i128`.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            DynamicValue::Int32(value) => Some(i128::from(*value)),
            DynamicValue::Int64(value) => Some(i128::from(*value)),
            DynamicValue::UInt64(value) => Some(i128::from(*value)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Elements of either array variant.
    pub fn as_array(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::HomogeneousArray(_, items) | DynamicValue::HeterogeneousArray(items) => {
                Some(items.as_slice())
            }
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&DynamicMap> {
        match self {
            DynamicValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a map entry by key.
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Element or entry count for collections; `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            DynamicValue::HomogeneousArray(_, items) | DynamicValue::HeterogeneousArray(items) => {
                Some(items.len())
            }
            DynamicValue::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// True for collections without elements or entries; scalars are never empty.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::Int32 => f.write_str("int32"),
            TypeTag::Int64 => f.write_str("int64"),
            TypeTag::UInt64 => f.write_str("uint64"),
            TypeTag::Decimal => f.write_str("decimal"),
            TypeTag::Float64 => f.write_str("float64"),
            TypeTag::Text => f.write_str("text"),
            TypeTag::DateTime => f.write_str("datetime"),
            TypeTag::Uuid => f.write_str("uuid"),
            TypeTag::Uri => f.write_str("uri"),
            TypeTag::Array(element) => write!(f, "{element}[]"),
            TypeTag::AnyArray => f.write_str("any[]"),
            TypeTag::Map => f.write_str("map"),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DynamicMap, DynamicValue, ElementType, TypeTag};

    #[test]
    fn type_tags_render_stably() {
        let nested = TypeTag::Array(Box::new(ElementType::nullable(TypeTag::Array(Box::new(
            ElementType::new(TypeTag::Int32),
        )))));
        assert_eq!(nested.to_string(), "int32[]?[]");
        assert_eq!(TypeTag::AnyArray.to_string(), "any[]");
        assert_eq!(ElementType::nullable(TypeTag::Uuid).to_string(), "uuid?");
    }

    #[test]
    fn null_has_no_type_tag() {
        assert_eq!(DynamicValue::Null.type_tag(), None);
        assert_eq!(DynamicValue::Int64(1).type_tag(), Some(TypeTag::Int64));
    }

    #[test]
    fn array_tags_carry_element_type() {
        let value = DynamicValue::HomogeneousArray(
            ElementType::nullable(TypeTag::Int32),
            vec![DynamicValue::Int32(1), DynamicValue::Null],
        );
        assert_eq!(
            value.type_tag(),
            Some(TypeTag::Array(Box::new(ElementType::nullable(TypeTag::Int32))))
        );
        assert_eq!(value.len(), Some(2));
        assert!(!value.is_empty());
        assert!(DynamicValue::HeterogeneousArray(Vec::new()).is_empty());
        assert!(!DynamicValue::Null.is_empty());
        assert_eq!(value.as_array().map(|items| items[0].as_i128()), Some(Some(1)));
    }

    #[test]
    fn map_accessors_preserve_order() {
        let mut map = DynamicMap::new();
        map.insert("z".to_string(), DynamicValue::Bool(true));
        map.insert("a".to_string(), DynamicValue::Text("x".to_string()));
        let value = DynamicValue::Map(map);
        let keys: Vec<&str> = value
            .as_map()
            .expect("map")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(value.get("a").and_then(DynamicValue::as_str), Some("x"));
        assert_eq!(value.get("missing"), None);
    }
}
