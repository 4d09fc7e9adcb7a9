//! JSON request reader

use cardinal_core::{ReadError, Span, Token, TokenStream};
use serde_json::Number;
use std::iter::Peekable;
use std::str::CharIndices;

// ============================================================================
// LEXER IMPLEMENTATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object,
    Array,
}

/// What the lexer accepts next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Value,
    KeyOrEnd { first: bool },
    ValueOrArrayEnd,
    AfterValue,
    End,
}

/// Lazily tokenizes a JSON document into request tokens.
pub struct JsonLexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
    stack: Vec<Frame>,
    state: State,
    span: Span,
}

impl<'a> JsonLexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
            stack: Vec::new(),
            state: State::Value,
            span: Span::default(),
        }
    }

    /// Span of the most recently returned token.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Tokenize the whole document, ending with `EndOfStream`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ReadError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_end = token == Token::EndOfStream;
            tokens.push(token);
            if is_end {
                return Ok(tokens);
            }
        }
    }

    fn scan(&mut self) -> Result<Token, ReadError> {
        loop {
            self.skip_whitespace();

            match self.state {
                State::End => {
                    return match self.peek_char() {
                        None => Ok(Token::EndOfStream),
                        Some(c) => Err(self.fail(format!("Trailing character after document: {}", c))),
                    };
                }
                State::AfterValue => match self.peek_char() {
                    Some(',') => {
                        self.advance();
                        self.state = match self.stack.last() {
                            Some(Frame::Object) => State::KeyOrEnd { first: false },
                            _ => State::Value,
                        };
                    }
                    Some('}') if self.stack.last() == Some(&Frame::Object) => {
                        self.advance();
                        self.close();
                        return Ok(Token::ObjectEnd);
                    }
                    Some(']') if self.stack.last() == Some(&Frame::Array) => {
                        self.advance();
                        self.close();
                        return Ok(Token::ArrayEnd);
                    }
                    None => return Err(self.fail("Unexpected end of input")),
                    Some(c) => return Err(self.fail(format!("Expected ',' or closing bracket, found {}", c))),
                },
                State::KeyOrEnd { first } => match self.peek_char() {
                    Some('"') => {
                        let key = self.scan_string()?;
                        self.skip_whitespace();
                        if self.peek_char() != Some(':') {
                            return Err(self.fail(format!("Expected ':' after key \"{}\"", key)));
                        }
                        self.advance();
                        self.state = State::Value;
                        return Ok(Token::FieldName(key));
                    }
                    Some('}') if first => {
                        self.advance();
                        self.close();
                        return Ok(Token::ObjectEnd);
                    }
                    None => return Err(self.fail("Unexpected end of input")),
                    Some(c) => return Err(self.fail(format!("Expected object key, found {}", c))),
                },
                State::ValueOrArrayEnd => {
                    if self.peek_char() == Some(']') {
                        self.advance();
                        self.close();
                        return Ok(Token::ArrayEnd);
                    }
                    self.state = State::Value;
                }
                State::Value => return self.scan_value(),
            }
        }
    }

    fn scan_value(&mut self) -> Result<Token, ReadError> {
        match self.peek_char() {
            None if self.stack.is_empty() => {
                self.state = State::End;
                Ok(Token::EndOfStream)
            }
            None => Err(self.fail("Unexpected end of input")),
            Some('{') => {
                self.advance();
                self.stack.push(Frame::Object);
                self.state = State::KeyOrEnd { first: true };
                Ok(Token::ObjectStart)
            }
            Some('[') => {
                self.advance();
                self.stack.push(Frame::Array);
                self.state = State::ValueOrArrayEnd;
                Ok(Token::ArrayStart)
            }
            Some('"') => {
                let value = self.scan_string()?;
                self.after_value();
                Ok(Token::String(value))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let number = self.scan_number()?;
                self.after_value();
                Ok(Token::Number(number))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let token = self.scan_literal()?;
                self.after_value();
                Ok(token)
            }
            Some(c) => Err(self.fail(format!("Unexpected character: {}", c))),
        }
    }

    fn close(&mut self) {
        self.stack.pop();
        self.after_value();
    }

    fn after_value(&mut self) {
        self.state = if self.stack.is_empty() {
            State::End
        } else {
            State::AfterValue
        };
    }

    /// Scan `true`, `false` or `null`.
    fn scan_literal(&mut self) -> Result<Token, ReadError> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() {
                self.advance();
            } else {
                break;
            }
        }

        match &self.source[start..self.pos] {
            "true" => Ok(Token::Boolean(true)),
            "false" => Ok(Token::Boolean(false)),
            "null" => Ok(Token::Null),
            other => Err(self.fail(format!("Unknown literal: {}", other))),
        }
    }

    /// Scan a string literal with escape sequences.
    fn scan_string(&mut self) -> Result<String, ReadError> {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return Err(self.fail("Unterminated string")),
                Some('"') => return Ok(value),
                Some('\\') => match self.advance() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('/') => value.push('/'),
                    Some('b') => value.push('\u{08}'),
                    Some('f') => value.push('\u{0C}'),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('u') => value.push(self.scan_unicode_escape()?),
                    Some(c) => return Err(self.fail(format!("Invalid escape: \\{}", c))),
                    None => return Err(self.fail("Unterminated string")),
                },
                Some(c) if (c as u32) < 0x20 => {
                    return Err(self.fail("Control character in string"));
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn scan_unicode_escape(&mut self) -> Result<char, ReadError> {
        let high = self.scan_hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high).ok_or_else(|| self.fail("Invalid unicode escape"));
        }

        // Surrogate pair: a second \uXXXX must follow.
        if self.advance() != Some('\\') || self.advance() != Some('u') {
            return Err(self.fail("Unpaired surrogate in unicode escape"));
        }
        let low = self.scan_hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(self.fail("Unpaired surrogate in unicode escape"));
        }
        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(code).ok_or_else(|| self.fail("Invalid unicode escape"))
    }

    fn scan_hex4(&mut self) -> Result<u32, ReadError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.fail("Invalid unicode escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    /// Scan a JSON number. Integers stay integral; anything with a
    /// fraction or exponent becomes a float.
    fn scan_number(&mut self) -> Result<Number, ReadError> {
        let start = self.pos;
        let mut is_float = false;

        if self.peek_char() == Some('-') {
            self.advance();
        }
        let digits_start = self.pos;
        self.skip_digits();
        let int_part = &self.source[digits_start..self.pos];
        if int_part.is_empty() || (int_part.len() > 1 && int_part.starts_with('0')) {
            return Err(self.fail(format!("Invalid number: {}", &self.source[start..self.pos])));
        }

        if self.peek_char() == Some('.') {
            is_float = true;
            self.advance();
            if !self.skip_digits() {
                return Err(self.fail("Expected digits after decimal point"));
            }
        }

        if matches!(self.peek_char(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.advance();
            }
            if !self.skip_digits() {
                return Err(self.fail("Expected digits in exponent"));
            }
        }

        let text = &self.source[start..self.pos];
        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Number::from(n));
            }
            if let Ok(n) = text.parse::<u64>() {
                return Ok(Number::from(n));
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| self.fail(format!("Invalid number: {}", text)))
    }

    /// Returns whether at least one digit was consumed.
    fn skip_digits(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        self.pos > start
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                _ => break,
            }
        }
    }

    fn fail(&self, message: impl Into<String>) -> ReadError {
        ReadError::new(message, self.line, self.column)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            self.column += 1;
            Some(c)
        } else {
            None
        }
    }
}

impl TokenStream for JsonLexer<'_> {
    fn next_token(&mut self) -> Result<Token, ReadError> {
        self.skip_whitespace();
        let start = self.pos;
        let line = self.line;
        let column = self.column;

        let token = self.scan()?;
        self.span = Span {
            start,
            end: self.pos,
            line,
            column,
        };
        Ok(token)
    }

    fn error(&self, message: String) -> ReadError {
        ReadError::new(message, self.span.line, self.span.column)
    }
}
