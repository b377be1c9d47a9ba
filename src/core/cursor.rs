//! Purpose: Pull-style token cursor seam plus the struson-backed JSON cursor.
//! Exports: `TokenCursor`, `JsonCursor`.
//! Role: The only way the inference engine observes input; engines never touch raw bytes.
//! Invariants: `JsonCursor` accepts exactly one RFC 8259 top-level value; grammar is struson's.
//! Invariants: Structural errors surface from `advance()`; undecodable string contents surface
//!             from string extraction (`as_string()`).
//! Notes: Extractor defaults are driven by `raw_text()`/`as_string()`, so scripted cursors in
//!        tests only implement the positional methods.

use std::borrow::Cow;
use std::io::{self, Read};

use rust_decimal::Decimal;
use struson::reader::{
    JsonReader, JsonStreamReader, ReaderError, ReaderSettings, SyntaxErrorKind, ValueType,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::error::{Error, ErrorKind};
use crate::core::extract;
use crate::core::token::TokenKind;

pub trait TokenCursor {
    /// Kind of the token the cursor is on; `None` before the first token and at end of stream.
    fn current_token(&self) -> Option<TokenKind>;

    /// Moves to the next token. Returns `Ok(false)` once the stream is exhausted.
    fn advance(&mut self) -> Result<bool, Error>;

    /// Raw text of the current token. Strings are returned without quotes and unescaped bytes
    /// are decoded lossily.
    fn raw_text(&self) -> Cow<'_, str>;

    /// Byte offset of the current token in the input.
    fn offset(&self) -> u64;

    /// Decoded value of the current string or property-name token.
    fn as_string(&self) -> Result<String, Error> {
        Ok(self.raw_text().into_owned())
    }

    fn try_as_i32(&self) -> Option<i32> {
        self.number_text().and_then(|raw| extract::parse_i32(&raw))
    }

    fn try_as_i64(&self) -> Option<i64> {
        self.number_text().and_then(|raw| extract::parse_i64(&raw))
    }

    fn try_as_u64(&self) -> Option<u64> {
        self.number_text().and_then(|raw| extract::parse_u64(&raw))
    }

    fn try_as_decimal(&self) -> Option<Decimal> {
        self.number_text().and_then(|raw| extract::parse_decimal(&raw))
    }

    fn try_as_f64(&self) -> Option<f64> {
        self.number_text().and_then(|raw| extract::parse_f64(&raw))
    }

    fn try_as_datetime(&self) -> Option<OffsetDateTime> {
        self.string_value().and_then(|text| extract::parse_datetime(&text))
    }

    fn try_as_uuid(&self) -> Option<Uuid> {
        self.string_value().and_then(|text| extract::parse_uuid(&text))
    }

    #[doc(hidden)]
    fn number_text(&self) -> Option<Cow<'_, str>> {
        match self.current_token() {
            Some(TokenKind::Number) => Some(self.raw_text()),
            _ => None,
        }
    }

    #[doc(hidden)]
    fn string_value(&self) -> Option<String> {
        match self.current_token() {
            Some(TokenKind::String) => self.as_string().ok(),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Container {
    Array,
    Object,
}

#[derive(Debug)]
enum Payload {
    Empty,
    Text(String),
    // String contents struson could not decode; the reason is replayed on extraction.
    Undecodable(String),
}

/// `TokenCursor` over a struson `JsonStreamReader`.
pub struct JsonCursor<R: Read> {
    reader: Option<JsonStreamReader<R>>,
    token: Option<TokenKind>,
    payload: Payload,
    offset: u64,
    stack: Vec<Container>,
    awaiting_value: bool,
    started: bool,
}

impl<'a> JsonCursor<&'a [u8]> {
    pub fn from_text(input: &'a str) -> Self {
        Self::new(input.as_bytes())
    }
}

impl<R: Read> JsonCursor<R> {
    pub fn new(input: R) -> Self {
        // Nesting is bounded by `InferOptions::max_depth`, not by the reader.
        let settings = ReaderSettings {
            max_nesting_depth: None,
            ..ReaderSettings::default()
        };
        Self {
            reader: Some(JsonStreamReader::new_custom(input, settings)),
            token: None,
            payload: Payload::Empty,
            offset: 0,
            stack: Vec::new(),
            awaiting_value: false,
            started: false,
        }
    }

    fn step(&mut self) -> Result<(), Error> {
        let container = match self.stack.last().copied() {
            None => return self.read_value(),
            Some(Container::Object) if self.awaiting_value => return self.read_value(),
            Some(container) => container,
        };
        let reader = live(&mut self.reader)?;
        let more = reader
            .has_next()
            .map_err(|err| reader_failure(err, position(reader)))?;
        self.offset = position(reader);
        if more {
            return match container {
                Container::Array => self.read_value(),
                Container::Object => self.read_property_name(),
            };
        }
        let (closed, token) = match container {
            Container::Array => (reader.end_array(), TokenKind::EndArray),
            Container::Object => (reader.end_object(), TokenKind::EndObject),
        };
        closed.map_err(|err| reader_failure(err, self.offset))?;
        self.stack.pop();
        self.set_token(token, Payload::Empty);
        Ok(())
    }

    fn read_value(&mut self) -> Result<(), Error> {
        let reader = live(&mut self.reader)?;
        let kind = reader
            .peek()
            .map_err(|err| reader_failure(err, position(reader)))?;
        let offset = position(reader);
        self.offset = offset;
        self.awaiting_value = false;
        let (token, payload) = match kind {
            ValueType::Array => {
                reader
                    .begin_array()
                    .map_err(|err| reader_failure(err, offset))?;
                self.stack.push(Container::Array);
                (TokenKind::StartArray, Payload::Empty)
            }
            ValueType::Object => {
                reader
                    .begin_object()
                    .map_err(|err| reader_failure(err, offset))?;
                self.stack.push(Container::Object);
                (TokenKind::StartObject, Payload::Empty)
            }
            ValueType::String => (TokenKind::String, decoded(reader.next_string(), offset)?),
            ValueType::Number => {
                let text = reader
                    .next_number_as_string()
                    .map_err(|err| reader_failure(err, offset))?;
                (TokenKind::Number, Payload::Text(text))
            }
            ValueType::Boolean => {
                let value = reader
                    .next_bool()
                    .map_err(|err| reader_failure(err, offset))?;
                let token = if value {
                    TokenKind::True
                } else {
                    TokenKind::False
                };
                (token, Payload::Empty)
            }
            ValueType::Null => {
                reader
                    .next_null()
                    .map_err(|err| reader_failure(err, offset))?;
                (TokenKind::Null, Payload::Empty)
            }
        };
        self.set_token(token, payload);
        Ok(())
    }

    fn read_property_name(&mut self) -> Result<(), Error> {
        let reader = live(&mut self.reader)?;
        let payload = decoded(reader.next_name_owned(), self.offset)?;
        self.awaiting_value = true;
        self.set_token(TokenKind::PropertyName, payload);
        Ok(())
    }

    fn set_token(&mut self, token: TokenKind, payload: Payload) {
        self.token = Some(token);
        self.payload = payload;
    }
}

impl<R: Read> TokenCursor for JsonCursor<R> {
    fn current_token(&self) -> Option<TokenKind> {
        self.token
    }

    fn advance(&mut self) -> Result<bool, Error> {
        if let Payload::Undecodable(reason) = &self.payload {
            return Err(undecodable(reason, self.offset));
        }
        if self.started && self.stack.is_empty() {
            self.token = None;
            self.payload = Payload::Empty;
            if let Some(reader) = self.reader.take() {
                let offset = position(&reader);
                self.offset = offset;
                reader
                    .consume_trailing_whitespace()
                    .map_err(|err| reader_failure(err, offset))?;
            }
            return Ok(false);
        }
        self.started = true;
        self.step()?;
        Ok(true)
    }

    fn raw_text(&self) -> Cow<'_, str> {
        match (&self.payload, self.token) {
            (Payload::Text(text), _) => Cow::Borrowed(text.as_str()),
            (_, Some(token)) => Cow::Borrowed(literal(token)),
            (_, None) => Cow::Borrowed(""),
        }
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn as_string(&self) -> Result<String, Error> {
        match (self.token, &self.payload) {
            (Some(TokenKind::String | TokenKind::PropertyName), Payload::Text(text)) => {
                Ok(text.clone())
            }
            (Some(TokenKind::String | TokenKind::PropertyName), Payload::Undecodable(reason)) => {
                Err(undecodable(reason, self.offset))
            }
            (other, _) => Err(Error::new(ErrorKind::MalformedInput)
                .with_message("current token is not a string")
                .with_token(other, self.raw_text())
                .with_offset(self.offset)),
        }
    }
}

fn live<R: Read>(
    reader: &mut Option<JsonStreamReader<R>>,
) -> Result<&mut JsonStreamReader<R>, Error> {
    reader.as_mut().ok_or_else(|| {
        Error::new(ErrorKind::Internal).with_message("cursor advanced past end of stream")
    })
}

fn position<R: Read>(reader: &JsonStreamReader<R>) -> u64 {
    reader.current_position(false).data_pos.unwrap_or(0)
}

fn literal(token: TokenKind) -> &'static str {
    match token {
        TokenKind::Null => "null",
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::StartArray => "[",
        TokenKind::EndArray => "]",
        TokenKind::StartObject => "{",
        TokenKind::EndObject => "}",
        TokenKind::Number | TokenKind::String | TokenKind::PropertyName => "",
    }
}

fn decoded(result: Result<String, ReaderError>, offset: u64) -> Result<Payload, Error> {
    match result {
        Ok(text) => Ok(Payload::Text(text)),
        Err(err) if is_undecodable(&err) => Ok(Payload::Undecodable(err.to_string())),
        Err(err) => Err(reader_failure(err, offset)),
    }
}

fn is_undecodable(err: &ReaderError) -> bool {
    match err {
        ReaderError::SyntaxError(syntax) => matches!(
            syntax.kind,
            SyntaxErrorKind::UnpairedSurrogatePairEscapeSequence
        ),
        ReaderError::IoError { error, .. } => error.kind() == io::ErrorKind::InvalidData,
        _ => false,
    }
}

fn undecodable(reason: &str, offset: u64) -> Error {
    Error::new(ErrorKind::UnparseableScalar)
        .with_message(format!("undecodable string contents: {reason}"))
        .with_offset(offset)
}

fn reader_failure(err: ReaderError, offset: u64) -> Error {
    let read_failed = matches!(
        &err,
        ReaderError::IoError { error, .. } if error.kind() != io::ErrorKind::InvalidData
    );
    if read_failed {
        return Error::new(ErrorKind::Io)
            .with_message("failed to read input")
            .with_offset(offset)
            .with_source(err);
    }
    Error::new(ErrorKind::MalformedInput)
        .with_message(err.to_string())
        .with_offset(offset)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use super::{JsonCursor, TokenCursor};
    use crate::core::error::ErrorKind;
    use crate::core::token::TokenKind;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut cursor = JsonCursor::from_text(input);
        let mut out = Vec::new();
        while cursor.advance().expect("advance") {
            out.push(cursor.current_token().expect("token"));
        }
        out
    }

    fn first_error(input: &[u8]) -> ErrorKind {
        let mut cursor = JsonCursor::new(input);
        loop {
            match cursor.advance() {
                Ok(true) => continue,
                Ok(false) => panic!("expected an error for {:?}", String::from_utf8_lossy(input)),
                Err(err) => return err.kind(),
            }
        }
    }

    #[test]
    fn object_members_yield_property_names() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"{"a": [1, "x", null], "b": {"c": true}, "d": false}"#),
            vec![
                StartObject,
                PropertyName,
                StartArray,
                Number,
                String,
                Null,
                EndArray,
                PropertyName,
                StartObject,
                PropertyName,
                True,
                EndObject,
                PropertyName,
                False,
                EndObject,
            ]
        );
    }

    #[test]
    fn empty_containers_and_scalars() {
        use TokenKind::*;
        assert_eq!(kinds("[]"), vec![StartArray, EndArray]);
        assert_eq!(kinds(" {} "), vec![StartObject, EndObject]);
        assert_eq!(kinds("[[], {}]"), vec![StartArray, StartArray, EndArray, StartObject, EndObject, EndArray]);
        assert_eq!(kinds("-12.5e+3"), vec![Number]);
        assert_eq!(kinds(r#""only""#), vec![String]);
    }

    #[test]
    fn raw_text_follows_tokens() {
        let mut cursor = JsonCursor::from_text(r#"  {"key": -0.25}"#);
        assert!(cursor.advance().expect("start"));
        assert_eq!(cursor.raw_text(), "{");
        let start = cursor.offset();
        assert!(cursor.advance().expect("name"));
        assert_eq!(cursor.raw_text(), "key");
        assert_eq!(cursor.as_string().expect("name"), "key");
        assert!(cursor.advance().expect("number"));
        assert_eq!(cursor.raw_text(), "-0.25");
        assert!(cursor.offset() > start);
        assert!(cursor.advance().expect("end"));
        assert_eq!(cursor.raw_text(), "}");
        assert!(!cursor.advance().expect("eof"));
        assert_eq!(cursor.current_token(), None);
        assert!(!cursor.advance().expect("still eof"));
    }

    #[test]
    fn escapes_are_decoded() {
        let mut cursor = JsonCursor::from_text(r#""a\n\"b\" é \ud83d\ude00""#);
        assert!(cursor.advance().expect("string"));
        assert_eq!(cursor.as_string().expect("decode"), "a\n\"b\" \u{e9} \u{1f600}");
    }

    #[test]
    fn lone_surrogate_fails_extraction_then_advance() {
        let mut cursor = JsonCursor::from_text(r#"["\ud800x", 1]"#);
        assert!(cursor.advance().expect("start"));
        assert!(cursor.advance().expect("string token"));
        assert_eq!(cursor.current_token(), Some(TokenKind::String));
        assert_eq!(cursor.try_as_datetime(), None);
        let err = cursor.as_string().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnparseableScalar);
        assert_eq!(cursor.advance().unwrap_err().kind(), ErrorKind::UnparseableScalar);
    }

    #[test]
    fn invalid_utf8_fails_extraction() {
        let mut cursor = JsonCursor::new(&b"\"\xff\xfe\""[..]);
        assert!(cursor.advance().expect("string token"));
        let err = cursor.as_string().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnparseableScalar);
    }

    #[test]
    fn grammar_violations_are_malformed_input() {
        let cases: [&[u8]; 12] = [
            b"",
            b"[1,]",
            b"[1 2]",
            b"{\"a\" 1}",
            b"{1: 2}",
            b"{\"a\": 1,}",
            b"01",
            b"1.",
            b"tru",
            b"[1] [2]",
            b"[1",
            b"\"bad \\x escape\"",
        ];
        for case in cases {
            assert_eq!(first_error(case), ErrorKind::MalformedInput);
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn reader_failures_are_io_errors() {
        let mut cursor = JsonCursor::new(FailingReader);
        let err = cursor.advance().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn typed_extractors_only_apply_to_matching_tokens() {
        let mut cursor = JsonCursor::from_text(r#"["7", 7]"#);
        assert!(cursor.advance().expect("start"));
        assert!(cursor.advance().expect("string"));
        assert_eq!(cursor.try_as_i32(), None);
        assert!(cursor.advance().expect("number"));
        assert_eq!(cursor.try_as_i32(), Some(7));
        assert_eq!(cursor.try_as_uuid(), None);
    }
}
