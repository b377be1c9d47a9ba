//! Purpose: Closed set of JSON token kinds surfaced by a token cursor.
//! Exports: `TokenKind`.
//! Role: Dispatch key for the inference engine and context for error reports.
//! Invariants: Matches over `TokenKind` stay exhaustive; there is no catch-all kind.

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TokenKind {
    Null,
    True,
    False,
    Number,
    String,
    StartArray,
    EndArray,
    StartObject,
    EndObject,
    PropertyName,
}

impl TokenKind {
    pub fn label(self) -> &'static str {
        match self {
            TokenKind::Null => "null",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::StartArray => "start-array",
            TokenKind::EndArray => "end-array",
            TokenKind::StartObject => "start-object",
            TokenKind::EndObject => "end-object",
            TokenKind::PropertyName => "property-name",
        }
    }
}
