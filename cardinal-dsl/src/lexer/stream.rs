//! In-memory token stream

use cardinal_core::{ReadError, Token, TokenStream};
use serde_json::Value;

/// Replays a prepared list of tokens.
///
/// Errors are located by token index: line 1, column = 1-based position of
/// the last token handed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecTokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl VecTokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Flatten a JSON value into tokens, object keys in map order.
    pub fn from_value(value: &Value) -> Self {
        let mut tokens = Vec::new();
        push_value(&mut tokens, value);
        Self::new(tokens)
    }

    /// Tokens not yet consumed.
    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }
}

impl From<Vec<Token>> for VecTokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

impl TokenStream for VecTokenStream {
    fn next_token(&mut self) -> Result<Token, ReadError> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token.clone())
            }
            None => Ok(Token::EndOfStream),
        }
    }

    fn error(&self, message: String) -> ReadError {
        ReadError::new(message, 1, self.pos.max(1))
    }
}

fn push_value(tokens: &mut Vec<Token>, value: &Value) {
    match value {
        Value::Null => tokens.push(Token::Null),
        Value::Bool(b) => tokens.push(Token::Boolean(*b)),
        Value::Number(n) => tokens.push(Token::Number(n.clone())),
        Value::String(s) => tokens.push(Token::String(s.clone())),
        Value::Array(items) => {
            tokens.push(Token::ArrayStart);
            for item in items {
                push_value(tokens, item);
            }
            tokens.push(Token::ArrayEnd);
        }
        Value::Object(map) => {
            tokens.push(Token::ObjectStart);
            for (key, item) in map {
                tokens.push(Token::FieldName(key.clone()));
                push_value(tokens, item);
            }
            tokens.push(Token::ObjectEnd);
        }
    }
}
