//! Purpose: Project inferred values into `serde_json::Value` documents.
//! Exports: `describe`, `to_plain_json`.
//! Role: Output boundary for the CLI and for callers that need to hand values onward as JSON.
//! Invariants: `describe` is lossless: decimals and timestamps travel as strings.
//! Invariants: Map entries keep insertion order (serde_json `preserve_order`).
//! Notes: Neither projection aims at byte-exact re-serialization of the input document.

use std::str::FromStr;

use serde_json::{Map, Number, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::value::{DynamicValue, TypeTag};

/// Tagged projection: every node becomes `{"type": ..., "value"|"items"|"entries": ...}`.
pub fn describe(value: &DynamicValue) -> Value {
    match value {
        DynamicValue::Null => tagged("null", Value::Null),
        DynamicValue::Bool(v) => tagged("bool", json!(v)),
        DynamicValue::Int32(v) => tagged("int32", json!(v)),
        DynamicValue::Int64(v) => tagged("int64", json!(v)),
        DynamicValue::UInt64(v) => tagged("uint64", json!(v)),
        DynamicValue::Decimal(v) => tagged("decimal", json!(v.to_string())),
        DynamicValue::Float64(v) => tagged("float64", float_json(*v)),
        DynamicValue::Text(v) => tagged("text", json!(v)),
        DynamicValue::DateTime(v) => tagged("datetime", json!(format_timestamp(v))),
        DynamicValue::Uuid(v) => tagged("uuid", json!(v.to_string())),
        DynamicValue::Uri(v) => tagged("uri", json!(v.as_str())),
        DynamicValue::HomogeneousArray(element, items) => {
            let tag = TypeTag::Array(Box::new(element.clone()));
            collection(&tag.to_string(), "items", items.iter().map(describe).collect())
        }
        DynamicValue::HeterogeneousArray(items) => collection(
            &TypeTag::AnyArray.to_string(),
            "items",
            items.iter().map(describe).collect(),
        ),
        DynamicValue::Map(map) => {
            let entries: Map<String, Value> = map
                .iter()
                .map(|(key, value)| (key.clone(), describe(value)))
                .collect();
            collection("map", "entries", Value::Object(entries))
        }
    }
}

/// Untagged projection. Decimals become JSON numbers (`f64` precision); timestamps, UUIDs and
/// URIs become strings.
pub fn to_plain_json(value: &DynamicValue) -> Value {
    match value {
        DynamicValue::Null => Value::Null,
        DynamicValue::Bool(v) => Value::Bool(*v),
        DynamicValue::Int32(v) => json!(v),
        DynamicValue::Int64(v) => json!(v),
        DynamicValue::UInt64(v) => json!(v),
        DynamicValue::Decimal(v) => {
            let text = v.to_string();
            Number::from_str(&text)
                .map(Value::Number)
                .unwrap_or(Value::String(text))
        }
        DynamicValue::Float64(v) => float_json(*v),
        DynamicValue::Text(v) => Value::String(v.clone()),
        DynamicValue::DateTime(v) => Value::String(format_timestamp(v)),
        DynamicValue::Uuid(v) => Value::String(v.to_string()),
        DynamicValue::Uri(v) => Value::String(v.to_string()),
        DynamicValue::HomogeneousArray(_, items) | DynamicValue::HeterogeneousArray(items) => {
            Value::Array(items.iter().map(to_plain_json).collect())
        }
        DynamicValue::Map(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), to_plain_json(value)))
                .collect(),
        ),
    }
}

pub(crate) fn format_timestamp(value: &OffsetDateTime) -> String {
    // RFC 3339 cannot express years outside 0000-9999 or sub-minute offsets.
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

fn float_json(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn tagged(tag: &str, value: Value) -> Value {
    json!({ "type": tag, "value": value })
}

fn collection(tag: &str, field: &str, body: Value) -> Value {
    let mut out = Map::new();
    out.insert("type".to_string(), json!(tag));
    out.insert(field.to_string(), body);
    Value::Object(out)
}
