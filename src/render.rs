//! Purpose: Render inferred values as an annotated tree with optional ANSI colorization.
//! Exports: `render_pretty`.
//! Role: Small, pure formatter used by the CLI `pretty` output format.
//! Invariants: Every scalar and array carries its inferred type label, e.g. `1 <int32>`.
//! Invariants: ANSI escapes appear only when explicitly enabled.
use dynjson::api::{DynamicMap, DynamicValue, TypeTag};
use time::format_description::well_known::Rfc3339;

const INDENT: &str = "  ";

// Conservative 8/16-color palette for broad terminal compatibility.
// Avoid bright variants that can lose contrast on themes like Solarized.
const COLOR_KEY: &str = "36";
const COLOR_STRING: &str = "32";
const COLOR_NUMBER: &str = "33";
const COLOR_BOOL: &str = "35";
const COLOR_NULL: &str = "39";
const COLOR_PUNCT: &str = "39";
const COLOR_LABEL: &str = "2";

pub fn render_pretty(value: &DynamicValue, use_color: bool) -> String {
    let mut out = String::new();
    write_value(value, 0, use_color, &mut out);
    out
}

fn write_value(value: &DynamicValue, indent: usize, use_color: bool, out: &mut String) {
    match value {
        DynamicValue::Null => push_colored("null", COLOR_NULL, use_color, out),
        DynamicValue::Bool(val) => {
            let text = if *val { "true" } else { "false" };
            push_colored(text, COLOR_BOOL, use_color, out);
        }
        DynamicValue::Int32(val) => push_colored(&val.to_string(), COLOR_NUMBER, use_color, out),
        DynamicValue::Int64(val) => push_colored(&val.to_string(), COLOR_NUMBER, use_color, out),
        DynamicValue::UInt64(val) => push_colored(&val.to_string(), COLOR_NUMBER, use_color, out),
        DynamicValue::Decimal(val) => push_colored(&val.to_string(), COLOR_NUMBER, use_color, out),
        DynamicValue::Float64(val) => push_colored(&format!("{val:?}"), COLOR_NUMBER, use_color, out),
        DynamicValue::Text(val) => push_quoted(val, use_color, out),
        DynamicValue::DateTime(val) => {
            let text = val.format(&Rfc3339).unwrap_or_else(|_| val.to_string());
            push_quoted(&text, use_color, out);
        }
        DynamicValue::Uuid(val) => push_quoted(&val.to_string(), use_color, out),
        DynamicValue::Uri(val) => push_quoted(val.as_str(), use_color, out),
        DynamicValue::HomogeneousArray(_, items) | DynamicValue::HeterogeneousArray(items) => {
            write_array(value, items, indent, use_color, out);
            return;
        }
        DynamicValue::Map(map) => {
            write_map(map, indent, use_color, out);
            return;
        }
    }
    if let Some(tag) = value.type_tag() {
        push_label(&tag, use_color, out);
    }
}

fn write_array(
    value: &DynamicValue,
    items: &[DynamicValue],
    indent: usize,
    use_color: bool,
    out: &mut String,
) {
    let tag = value.type_tag().unwrap_or(TypeTag::AnyArray);
    if items.is_empty() {
        push_colored("[]", COLOR_PUNCT, use_color, out);
        push_label(&tag, use_color, out);
        return;
    }
    push_colored("[", COLOR_PUNCT, use_color, out);
    push_label(&tag, use_color, out);
    out.push('\n');
    for (idx, item) in items.iter().enumerate() {
        push_indent(indent + 1, out);
        write_value(item, indent + 1, use_color, out);
        if idx + 1 < items.len() {
            push_colored(",", COLOR_PUNCT, use_color, out);
        }
        out.push('\n');
    }
    push_indent(indent, out);
    push_colored("]", COLOR_PUNCT, use_color, out);
}

fn write_map(map: &DynamicMap, indent: usize, use_color: bool, out: &mut String) {
    if map.is_empty() {
        push_colored("{}", COLOR_PUNCT, use_color, out);
        return;
    }
    push_colored("{", COLOR_PUNCT, use_color, out);
    out.push('\n');
    let len = map.len();
    for (idx, (key, value)) in map.iter().enumerate() {
        push_indent(indent + 1, out);
        push_colored(&encode_string(key), COLOR_KEY, use_color, out);
        push_colored(":", COLOR_PUNCT, use_color, out);
        out.push(' ');
        write_value(value, indent + 1, use_color, out);
        if idx + 1 < len {
            push_colored(",", COLOR_PUNCT, use_color, out);
        }
        out.push('\n');
    }
    push_indent(indent, out);
    push_colored("}", COLOR_PUNCT, use_color, out);
}

fn encode_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn push_quoted(text: &str, use_color: bool, out: &mut String) {
    push_colored(&encode_string(text), COLOR_STRING, use_color, out);
}

fn push_label(tag: &TypeTag, use_color: bool, out: &mut String) {
    out.push(' ');
    push_colored(&format!("<{tag}>"), COLOR_LABEL, use_color, out);
}

fn push_indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn push_colored(text: &str, color: &str, use_color: bool, out: &mut String) {
    if !use_color {
        out.push_str(text);
        return;
    }
    out.push_str("\u{1b}[");
    out.push_str(color);
    out.push('m');
    out.push_str(text);
    out.push_str("\u{1b}[0m");
}
