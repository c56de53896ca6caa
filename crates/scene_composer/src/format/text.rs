//! Text declaration format reader and writer
//!
//! Game object files and the configuration blobs embedded in them share one
//! brace-delimited syntax:
//!
//! ```text
//! embedded_components {
//!   id: "sprite"
//!   type: "sprite"
//!   data: "tile_set: \"/level/level.atlas\"\n"
//!   position { x: 0.0 y: 0.0 z: -0.1 }
//! }
//! ```
//!
//! A document is an ordered list of fields. Each field is `name: scalar` or
//! `name { ... }`; names may repeat and order is preserved. Scalars are kept
//! as written and converted on access, so numbers are never rounded by the
//! reader itself.

use std::fmt;

/// Text format errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Malformed input at a given line
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Input ended inside a construct
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// A field holds a value of the wrong shape
    #[error("line {line}: field `{field}` expected {expected}")]
    Type {
        /// 1-based line number of the field
        line: usize,
        /// Field name
        field: String,
        /// Expected value shape
        expected: &'static str,
    },
}

/// A field value
#[derive(Debug, Clone, PartialEq)]
pub enum TextValue {
    /// Quoted string, escapes resolved
    Str(String),
    /// Numeric literal as written
    Number(String),
    /// Bare identifier: enum values, `true`, `false`
    Ident(String),
    /// Nested message
    Message(TextMessage),
}

impl TextValue {
    fn describe(&self) -> &'static str {
        match self {
            TextValue::Str(_) => "string",
            TextValue::Number(_) => "number",
            TextValue::Ident(_) => "identifier",
            TextValue::Message(_) => "message",
        }
    }
}

/// A named field with the line it started on
#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    /// Field name
    pub name: String,
    /// Field value
    pub value: TextValue,
    /// 1-based source line, 0 for fields built in code
    pub line: usize,
}

/// An ordered list of fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMessage {
    fields: Vec<TextField>,
}

impl TextMessage {
    /// Create an empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete document
    pub fn parse(input: &str) -> Result<Self, FormatError> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Parser { tokens, pos: 0, depth: 0 };
        let message = parser.parse_fields(false)?;
        Ok(message)
    }

    /// Append a field
    pub fn push(&mut self, name: impl Into<String>, value: TextValue) {
        self.fields.push(TextField { name: name.into(), value, line: 0 });
    }

    /// Builder form of [`push`](Self::push)
    pub fn with(mut self, name: impl Into<String>, value: TextValue) -> Self {
        self.push(name, value);
        self
    }

    /// All fields in order
    pub fn fields(&self) -> &[TextField] {
        &self.fields
    }

    /// Whether the message has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a field with this name is present
    pub fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// All fields with the given name, in order
    pub fn named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a TextField> + 'n
    where
        'a: 'n,
    {
        self.fields.iter().filter(move |f| f.name == name)
    }

    /// Last field with the given name; later occurrences override earlier ones
    pub fn last(&self, name: &str) -> Option<&TextField> {
        self.fields.iter().rev().find(|f| f.name == name)
    }

    /// Names of fields not in `known`, first occurrence only
    pub fn unknown_fields(&self, known: &[&str]) -> Vec<&str> {
        let mut unknown: Vec<&str> = Vec::new();
        for field in &self.fields {
            let name = field.name.as_str();
            if !known.contains(&name) && !unknown.contains(&name) {
                unknown.push(name);
            }
        }
        unknown
    }

    /// String field
    pub fn get_str(&self, name: &str) -> Result<Option<&str>, FormatError> {
        self.last(name).map(as_str).transpose()
    }

    /// Floating point field; accepts `inf`/`nan` identifiers
    pub fn get_f32(&self, name: &str) -> Result<Option<f32>, FormatError> {
        self.last(name).map(as_f32).transpose()
    }

    /// Unsigned integer field
    pub fn get_u32(&self, name: &str) -> Result<Option<u32>, FormatError> {
        self.last(name).map(as_u32).transpose()
    }

    /// Boolean field: `true`/`false` or `1`/`0`
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, FormatError> {
        self.last(name).map(as_bool).transpose()
    }

    /// Identifier field (enum value)
    pub fn get_ident(&self, name: &str) -> Result<Option<&str>, FormatError> {
        self.last(name)
            .map(|field| match &field.value {
                TextValue::Ident(ident) => Ok(ident.as_str()),
                _ => Err(type_error(field, "identifier")),
            })
            .transpose()
    }

    /// Nested message field
    pub fn get_message(&self, name: &str) -> Result<Option<&TextMessage>, FormatError> {
        self.last(name).map(as_message).transpose()
    }

    /// Every occurrence of a repeated float field
    pub fn all_f32(&self, name: &str) -> Result<Vec<f32>, FormatError> {
        self.named(name).map(as_f32).collect()
    }

    /// Every occurrence of a repeated string field
    pub fn all_str(&self, name: &str) -> Result<Vec<&str>, FormatError> {
        self.named(name).map(as_str).collect()
    }

    /// Every occurrence of a repeated message field
    pub fn all_messages(&self, name: &str) -> Result<Vec<&TextMessage>, FormatError> {
        self.named(name).map(as_message).collect()
    }
}

fn type_error(field: &TextField, expected: &'static str) -> FormatError {
    log::trace!("field `{}` holds a {}, wanted {}", field.name, field.value.describe(), expected);
    FormatError::Type { line: field.line, field: field.name.clone(), expected }
}

fn as_str(field: &TextField) -> Result<&str, FormatError> {
    match &field.value {
        TextValue::Str(s) => Ok(s.as_str()),
        _ => Err(type_error(field, "string")),
    }
}

fn as_f32(field: &TextField) -> Result<f32, FormatError> {
    match &field.value {
        TextValue::Number(raw) => {
            let trimmed = raw.strip_suffix(['f', 'F']).unwrap_or(raw);
            trimmed.parse::<f32>().map_err(|_| type_error(field, "number"))
        }
        TextValue::Ident(ident) => match ident.to_ascii_lowercase().as_str() {
            "inf" | "infinity" => Ok(f32::INFINITY),
            "nan" => Ok(f32::NAN),
            _ => Err(type_error(field, "number")),
        },
        _ => Err(type_error(field, "number")),
    }
}

fn as_u32(field: &TextField) -> Result<u32, FormatError> {
    match &field.value {
        TextValue::Number(raw) => raw.parse::<u32>().map_err(|_| type_error(field, "unsigned integer")),
        _ => Err(type_error(field, "unsigned integer")),
    }
}

fn as_bool(field: &TextField) -> Result<bool, FormatError> {
    match &field.value {
        TextValue::Ident(ident) if ident == "true" || ident == "True" || ident == "t" => Ok(true),
        TextValue::Ident(ident) if ident == "false" || ident == "False" || ident == "f" => Ok(false),
        TextValue::Number(raw) if raw == "1" => Ok(true),
        TextValue::Number(raw) if raw == "0" => Ok(false),
        _ => Err(type_error(field, "boolean")),
    }
}

fn as_message(field: &TextField) -> Result<&TextMessage, FormatError> {
    match &field.value {
        TextValue::Message(message) => Ok(message),
        _ => Err(type_error(field, "message")),
    }
}

impl fmt::Display for TextMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fields(f, self, 0)
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, message: &TextMessage, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    for field in &message.fields {
        match &field.value {
            TextValue::Message(inner) => {
                writeln!(f, "{indent}{} {{", field.name)?;
                write_fields(f, inner, depth + 1)?;
                writeln!(f, "{indent}}}")?;
            }
            TextValue::Str(s) => writeln!(f, "{indent}{}: \"{}\"", field.name, escape(s))?,
            TextValue::Number(raw) | TextValue::Ident(raw) => writeln!(f, "{indent}{}: {raw}", field.name)?,
        }
    }
    Ok(())
}

/// Escape a string for a double-quoted literal
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    Colon,
    Open,
    Close,
    ListOpen,
    ListClose,
    Comma,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable(), line: 1 }
    }

    fn syntax(&self, message: impl Into<String>) -> FormatError {
        FormatError::Syntax { line: self.line, message: message.into() }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, FormatError> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            let line = self.line;
            match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                }
                c if c.is_whitespace() || c == ';' => {
                    self.chars.next();
                }
                '#' => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                ':' => {
                    self.chars.next();
                    tokens.push((Token::Colon, line));
                }
                '{' | '<' => {
                    self.chars.next();
                    tokens.push((Token::Open, line));
                }
                '}' | '>' => {
                    self.chars.next();
                    tokens.push((Token::Close, line));
                }
                '[' => {
                    self.chars.next();
                    tokens.push((Token::ListOpen, line));
                }
                ']' => {
                    self.chars.next();
                    tokens.push((Token::ListClose, line));
                }
                ',' => {
                    self.chars.next();
                    tokens.push((Token::Comma, line));
                }
                '"' | '\'' => {
                    let s = self.read_string(c)?;
                    tokens.push((Token::Str(s), line));
                }
                c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                    tokens.push((Token::Number(self.read_number()), line));
                }
                c if c.is_alphabetic() || c == '_' => {
                    tokens.push((Token::Ident(self.read_ident()), line));
                }
                other => return Err(self.syntax(format!("unexpected character `{other}`"))),
            }
        }
        Ok(tokens)
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        ident
    }

    fn read_number(&mut self) -> String {
        let mut raw = String::new();
        if let Some(&sign) = self.chars.peek() {
            if sign == '-' || sign == '+' {
                raw.push(sign);
                self.chars.next();
            }
        }
        while let Some(&c) = self.chars.peek() {
            let exponent_sign = (c == '-' || c == '+') && raw.ends_with(['e', 'E']);
            if c.is_ascii_alphanumeric() || c == '.' || exponent_sign {
                raw.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        raw
    }

    fn read_string(&mut self, quote: char) -> Result<String, FormatError> {
        self.chars.next();
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            let c = self
                .chars
                .next()
                .ok_or_else(|| FormatError::UnexpectedEof("unterminated string".to_string()))?;
            match c {
                c if c == quote => break,
                '\n' => return Err(self.syntax("newline in string literal")),
                '\\' => self.read_escape(&mut bytes)?,
                c => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        String::from_utf8(bytes).map_err(|_| self.syntax("string literal is not valid UTF-8"))
    }

    fn read_escape(&mut self, bytes: &mut Vec<u8>) -> Result<(), FormatError> {
        let c = self
            .chars
            .next()
            .ok_or_else(|| FormatError::UnexpectedEof("unterminated escape".to_string()))?;
        let byte = match c {
            'n' => b'\n',
            't' => b'\t',
            'r' => b'\r',
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0c,
            'v' => 0x0b,
            '\\' => b'\\',
            '\'' => b'\'',
            '"' => b'"',
            '?' => b'?',
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            self.chars.next();
                        }
                        None => break,
                    }
                }
                u8::try_from(value).map_err(|_| self.syntax("octal escape out of range"))?
            }
            'x' => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match self.chars.peek().and_then(|d| d.to_digit(16)) {
                        Some(digit) => {
                            value = value * 16 + digit;
                            self.chars.next();
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err(self.syntax("hex escape without digits"));
                }
                u8::try_from(value).map_err(|_| self.syntax("hex escape out of range"))?
            }
            other => return Err(self.syntax(format!("unknown escape `\\{other}`"))),
        };
        bytes.push(byte);
        Ok(())
    }
}

/// Deepest block nesting accepted by the parser
pub const MAX_NESTING_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |(_, line)| *line)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn syntax(&self, message: impl Into<String>) -> FormatError {
        FormatError::Syntax { line: self.line(), message: message.into() }
    }

    fn parse_fields(&mut self, nested: bool) -> Result<TextMessage, FormatError> {
        let mut message = TextMessage::new();
        loop {
            match self.peek() {
                None if nested => return Err(FormatError::UnexpectedEof("missing `}`".to_string())),
                None => return Ok(message),
                Some(Token::Close) if nested => {
                    self.next();
                    return Ok(message);
                }
                Some(Token::Comma) => {
                    self.next();
                }
                Some(Token::Ident(_)) => self.parse_field(&mut message)?,
                Some(other) => {
                    let found = format!("{other:?}");
                    return Err(self.syntax(format!("expected field name, found {found}")));
                }
            }
        }
    }

    fn parse_field(&mut self, message: &mut TextMessage) -> Result<(), FormatError> {
        let line = self.line();
        let Some(Token::Ident(name)) = self.next() else {
            return Err(self.syntax("expected field name"));
        };

        let had_colon = matches!(self.peek(), Some(Token::Colon));
        if had_colon {
            self.next();
        }

        match self.peek() {
            Some(Token::ListOpen) => {
                self.next();
                loop {
                    match self.peek() {
                        Some(Token::ListClose) => {
                            self.next();
                            break;
                        }
                        Some(Token::Comma) => {
                            self.next();
                        }
                        None => return Err(FormatError::UnexpectedEof("missing `]`".to_string())),
                        Some(_) => {
                            let line = self.line();
                            let value = self.parse_value()?;
                            message.fields.push(TextField { name: name.clone(), value, line });
                        }
                    }
                }
            }
            Some(Token::Open) => {
                let value = self.parse_value()?;
                message.fields.push(TextField { name, value, line });
            }
            Some(_) if had_colon => {
                let value = self.parse_value()?;
                message.fields.push(TextField { name, value, line });
            }
            Some(_) => return Err(self.syntax(format!("expected `:` or `{{` after `{name}`"))),
            None => return Err(FormatError::UnexpectedEof(format!("field `{name}` has no value"))),
        }
        Ok(())
    }

    fn parse_value(&mut self) -> Result<TextValue, FormatError> {
        match self.next() {
            Some(Token::Open) => {
                if self.depth == MAX_NESTING_DEPTH {
                    return Err(self.syntax(format!("blocks nested deeper than {MAX_NESTING_DEPTH}")));
                }
                self.depth += 1;
                let message = self.parse_fields(true)?;
                self.depth -= 1;
                Ok(TextValue::Message(message))
            }
            Some(Token::Str(first)) => {
                let mut s = first;
                // Adjacent literals concatenate
                while let Some(Token::Str(_)) = self.peek() {
                    if let Some(Token::Str(more)) = self.next() {
                        s.push_str(&more);
                    }
                }
                Ok(TextValue::Str(s))
            }
            Some(Token::Number(raw)) => Ok(TextValue::Number(raw)),
            Some(Token::Ident(ident)) => Ok(TextValue::Ident(ident)),
            Some(other) => Err(self.syntax(format!("expected value, found {other:?}"))),
            None => Err(FormatError::UnexpectedEof("expected value".to_string())),
        }
    }
}
