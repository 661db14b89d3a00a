//! Parser for the Python-style literals the dataset uses to serialize tag
//! lists, e.g. `['music', "live", 'tour 2023']`.
//!
//! Covers strings (single, double and triple quotes, `r`/`u`/`b` prefixes,
//! implicit concatenation), numbers, `True`/`False`/`None`, lists, tuples,
//! sets and dicts. A bare comma-separated sequence at the top level is a
//! tuple, as in Python.

use thiserror::Error;

/// Deepest container nesting accepted, about what Python's parser allows.
pub const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Element count for sequence-like literals.
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Literal::List(items) | Literal::Tuple(items) | Literal::Set(items) => Some(items.len()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("unknown name {0:?}")]
    UnknownName(String),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("containers nested deeper than {0} levels")]
    TooDeep(usize),
}

pub fn parse_literal(input: &str) -> Result<Literal, LiteralError> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_top_level()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(value),
        Some(found) => Err(LiteralError::UnexpectedChar {
            found,
            offset: parser.pos,
        }),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(found) => Err(LiteralError::UnexpectedChar {
                found,
                offset: self.pos - 1,
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn parse_top_level(&mut self) -> Result<Literal, LiteralError> {
        let first = self.parse_value()?;
        self.skip_whitespace();
        if self.peek() != Some(',') {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.peek() == Some(',') {
            self.pos += 1;
            self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
        }
        Ok(Literal::Tuple(items))
    }

    fn parse_value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_whitespace();
        let c = self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        match c {
            '[' | '(' | '{' => self.parse_container(c),
            '\'' | '"' => self.parse_string(),
            '-' | '+' | '.' | '0'..='9' => self.parse_number(),
            c if c.is_alphabetic() || c == '_' => {
                if matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B')
                    && matches!(self.peek_at(1), Some('\'' | '"'))
                {
                    return self.parse_string();
                }
                self.parse_name()
            }
            found => Err(LiteralError::UnexpectedChar {
                found,
                offset: self.pos,
            }),
        }
    }

    fn parse_container(&mut self, open: char) -> Result<Literal, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let value = match open {
            '[' => {
                self.pos += 1;
                self.parse_items(']').map(Literal::List)
            }
            '(' => self.parse_parenthesized(),
            _ => self.parse_braced(),
        };
        self.depth -= 1;
        value
    }

    /// Comma-separated values up to `close`, trailing comma allowed.
    fn parse_items(&mut self, close: char) -> Result<Vec<Literal>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(items),
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        offset: self.pos - 1,
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Literal, LiteralError> {
        self.expect('(')?;
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(Literal::Tuple(Vec::new()));
        }
        let first = self.parse_value()?;
        self.skip_whitespace();
        match self.bump() {
            // `(x)` is just a parenthesized value.
            Some(')') => Ok(first),
            Some(',') => {
                let mut items = vec![first];
                items.extend(self.parse_items(')')?);
                Ok(Literal::Tuple(items))
            }
            Some(found) => Err(LiteralError::UnexpectedChar {
                found,
                offset: self.pos - 1,
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn parse_braced(&mut self) -> Result<Literal, LiteralError> {
        self.expect('{')?;
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(Literal::Dict(Vec::new()));
        }
        let first = self.parse_value()?;
        self.skip_whitespace();
        if self.peek() != Some(':') {
            // A set: the first element is already parsed.
            let mut items = vec![first];
            match self.bump() {
                Some('}') => return Ok(Literal::Set(items)),
                Some(',') => {
                    for item in self.parse_items('}')? {
                        if !items.contains(&item) {
                            items.push(item);
                        }
                    }
                    return Ok(Literal::Set(items));
                }
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        offset: self.pos - 1,
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }

        let mut entries = Vec::new();
        let mut key = first;
        loop {
            self.expect(':')?;
            let value = self.parse_value()?;
            entries.push((key, value));
            self.skip_whitespace();
            match self.bump() {
                Some('}') => return Ok(Literal::Dict(entries)),
                Some(',') => {
                    self.skip_whitespace();
                    if self.peek() == Some('}') {
                        self.pos += 1;
                        return Ok(Literal::Dict(entries));
                    }
                    key = self.parse_value()?;
                }
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        offset: self.pos - 1,
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn parse_name(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        match name.as_str() {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            _ => Err(LiteralError::UnknownName(name)),
        }
    }

    fn parse_number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
            self.skip_whitespace();
        }
        let digits_start = self.pos;
        while let Some(c) = self.peek() {
            let exponent_sign =
                matches!(c, '+' | '-') && matches!(self.chars.get(self.pos - 1), Some('e' | 'E'));
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_') || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        let sign: String = self.chars[start..digits_start]
            .iter()
            .filter(|c| !c.is_whitespace())
            .collect();
        let digits: String = self.chars[digits_start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        let text = format!("{sign}{digits}");
        if digits.is_empty() {
            return Err(LiteralError::InvalidNumber(text));
        }
        if !digits.contains(['.', 'e', 'E']) {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Literal::Int(n));
            }
        }
        // Integers beyond i64 still parse as floats; only the shape matters here.
        text.parse::<f64>()
            .map(Literal::Float)
            .map_err(|_| LiteralError::InvalidNumber(text))
    }

    fn parse_string(&mut self) -> Result<Literal, LiteralError> {
        let mut out = String::new();
        self.parse_string_piece(&mut out)?;
        // Adjacent literals concatenate: 'a' "b" == 'ab'
        loop {
            let save = self.pos;
            self.skip_whitespace();
            let starts_string = match self.peek() {
                Some('\'' | '"') => true,
                Some('r' | 'R' | 'u' | 'U' | 'b' | 'B') => {
                    matches!(self.peek_at(1), Some('\'' | '"'))
                }
                _ => false,
            };
            if !starts_string {
                self.pos = save;
                return Ok(Literal::Str(out));
            }
            self.parse_string_piece(&mut out)?;
        }
    }

    fn parse_string_piece(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let start = self.pos;
        let mut raw = false;
        if let Some(prefix) = self.peek() {
            if prefix.is_alphabetic() {
                raw = matches!(prefix, 'r' | 'R');
                self.pos += 1;
            }
        }
        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        loop {
            let c = self
                .bump()
                .ok_or(LiteralError::UnterminatedString(start))?;
            if c == quote {
                if !triple {
                    return Ok(());
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.pos += 2;
                    return Ok(());
                }
                out.push(c);
                continue;
            }
            if c == '\n' && !triple {
                return Err(LiteralError::UnterminatedString(start));
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let escaped = self
                .bump()
                .ok_or(LiteralError::UnterminatedString(start))?;
            if raw {
                out.push('\\');
                out.push(escaped);
                continue;
            }
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                '\n' => {}
                'x' => out.push(self.parse_hex_escape(2).unwrap_or('\u{fffd}')),
                'u' => out.push(self.parse_hex_escape(4).unwrap_or('\u{fffd}')),
                'U' => out.push(self.parse_hex_escape(8).unwrap_or('\u{fffd}')),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn parse_hex_escape(&mut self, len: usize) -> Option<char> {
        let end = self.pos + len;
        if end > self.chars.len() {
            return None;
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        let code = u32::from_str_radix(&hex, 16).ok()?;
        self.pos = end;
        char::from_u32(code)
    }
}
