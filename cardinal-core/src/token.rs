//! Token alphabet and the reader seam
//!
//! A request body arrives as a forward-only stream of typed tokens. The
//! reader producing them lives outside this crate; everything here only
//! describes what it yields.

use crate::{ReadError, ScriptParams};
use serde_json::{Map, Number, Value};
use std::fmt;

// ============================================================================
// TOKENS
// ============================================================================

/// A single token produced by a request reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    FieldName(String),
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    EndOfStream,
}

impl Token {
    /// The payload-free kind of this token.
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::FieldName(_) => TokenKind::FieldName,
            Token::String(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
            Token::Boolean(_) => TokenKind::Boolean,
            Token::Null => TokenKind::Null,
            Token::ObjectStart => TokenKind::ObjectStart,
            Token::ObjectEnd => TokenKind::ObjectEnd,
            Token::ArrayStart => TokenKind::ArrayStart,
            Token::ArrayEnd => TokenKind::ArrayEnd,
            Token::EndOfStream => TokenKind::EndOfStream,
        }
    }

    /// Shorthand for a field-name token.
    pub fn field(name: impl Into<String>) -> Self {
        Token::FieldName(name.into())
    }

    /// Shorthand for a string-value token.
    pub fn string(value: impl Into<String>) -> Self {
        Token::String(value.into())
    }

    /// Shorthand for an integral number token.
    pub fn int(value: i64) -> Self {
        Token::Number(Number::from(value))
    }
}

/// Token kinds, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    FieldName,
    String,
    Number,
    Boolean,
    Null,
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    EndOfStream,
}

impl TokenKind {
    /// Wire name of the token kind as it appears in error messages.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            TokenKind::FieldName => "FIELD_NAME",
            TokenKind::String => "VALUE_STRING",
            TokenKind::Number => "VALUE_NUMBER",
            TokenKind::Boolean => "VALUE_BOOLEAN",
            TokenKind::Null => "VALUE_NULL",
            TokenKind::ObjectStart => "START_OBJECT",
            TokenKind::ObjectEnd => "END_OBJECT",
            TokenKind::ArrayStart => "START_ARRAY",
            TokenKind::ArrayEnd => "END_ARRAY",
            TokenKind::EndOfStream => "END_OF_STREAM",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

// ============================================================================
// TOKEN STREAM
// ============================================================================

/// A forward-only source of tokens.
///
/// Once `EndOfStream` has been returned, every further call returns it again.
pub trait TokenStream {
    /// Pull the next token.
    fn next_token(&mut self) -> Result<Token, ReadError>;

    /// Build a read error located at the current cursor.
    fn error(&self, message: String) -> ReadError;

    /// Read the rest of an object whose `ObjectStart` was just returned.
    ///
    /// `max_depth` bounds how deeply objects and arrays may nest, counting
    /// the object being read as level one.
    fn read_map(&mut self, max_depth: usize) -> Result<ScriptParams, ReadError> {
        read_object(self, max_depth, 1)
    }
}

impl<T: TokenStream + ?Sized> TokenStream for &mut T {
    fn next_token(&mut self) -> Result<Token, ReadError> {
        (**self).next_token()
    }

    fn error(&self, message: String) -> ReadError {
        (**self).error(message)
    }

    fn read_map(&mut self, max_depth: usize) -> Result<ScriptParams, ReadError> {
        (**self).read_map(max_depth)
    }
}

fn read_object<T: TokenStream + ?Sized>(
    stream: &mut T,
    max_depth: usize,
    depth: usize,
) -> Result<Map<String, Value>, ReadError> {
    if depth > max_depth {
        return Err(stream.error(format!(
            "object nested deeper than {} levels",
            max_depth
        )));
    }

    let mut map = Map::new();
    loop {
        match stream.next_token()? {
            Token::ObjectEnd => return Ok(map),
            Token::FieldName(key) => {
                let token = stream.next_token()?;
                let value = read_value(stream, token, max_depth, depth)?;
                map.insert(key, value);
            }
            other => {
                return Err(stream.error(format!(
                    "expected field name or {}, found {}",
                    TokenKind::ObjectEnd,
                    other.kind()
                )));
            }
        }
    }
}

fn read_value<T: TokenStream + ?Sized>(
    stream: &mut T,
    token: Token,
    max_depth: usize,
    depth: usize,
) -> Result<Value, ReadError> {
    match token {
        Token::String(s) => Ok(Value::String(s)),
        Token::Number(n) => Ok(Value::Number(n)),
        Token::Boolean(b) => Ok(Value::Bool(b)),
        Token::Null => Ok(Value::Null),
        Token::ObjectStart => read_object(stream, max_depth, depth + 1).map(Value::Object),
        Token::ArrayStart => {
            if depth + 1 > max_depth {
                return Err(stream.error(format!(
                    "array nested deeper than {} levels",
                    max_depth
                )));
            }
            let mut items = Vec::new();
            loop {
                match stream.next_token()? {
                    Token::ArrayEnd => return Ok(Value::Array(items)),
                    next => items.push(read_value(stream, next, max_depth, depth + 1)?),
                }
            }
        }
        other => Err(stream.error(format!("expected a value, found {}", other.kind()))),
    }
}

// ============================================================================
// TESTS
// ============================================================================
