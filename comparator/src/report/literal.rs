//! Strict parser for non-JSON `CODE_ANALYSIS` payloads.
//!
//! Some pipelines store the nested report as a literal-data dump rather than
//! JSON: single-quoted strings, `True`/`False`/`None`, tuples, trailing
//! commas. This parser accepts exactly that literal grammar and nothing else.
//! It never evaluates anything, so an unparseable payload is just an error.

use std::iter::Peekable;
use std::str::CharIndices;

use serde_json::{Map, Number, Value};

const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unknown name {name:?} at offset {offset}")]
    UnknownName { name: String, offset: usize },
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),
    #[error("unsupported mapping key at offset {0}")]
    InvalidKey(usize),
    #[error("nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

/// Parse a complete literal expression into a JSON value. Mapping key order
/// is preserved.
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        chars: input.char_indices().peekable(),
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    match parser.chars.next() {
        None => Ok(value),
        Some((offset, ch)) => Err(LiteralError::UnexpectedChar { ch, offset }),
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.chars.next() {
            Some((_, ch)) if ch == expected => Ok(()),
            Some((offset, ch)) => Err(LiteralError::UnexpectedChar { ch, offset }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        let (offset, ch) = self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        match ch {
            '{' => self.nested(Self::mapping),
            '[' => self.nested(|p| p.items('[', ']').map(|(items, _)| Value::Array(items))),
            '(' => self.nested(Self::tuple),
            '\'' | '"' => self.strings().map(Value::String),
            '+' | '-' | '.' | '0'..='9' => self.number(),
            c if c.is_alphabetic() || c == '_' => self.constant(),
            _ => Err(LiteralError::UnexpectedChar { ch, offset }),
        }
    }

    fn nested<F>(&mut self, parse: F) -> Result<Value, LiteralError>
    where
        F: FnOnce(&mut Self) -> Result<Value, LiteralError>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn mapping(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.chars.next_if(|&(_, c)| c == '}').is_some() {
                return Ok(Value::Object(map));
            }

            let key = self.key()?;
            self.expect(':')?;
            let value = self.value()?;
            // Later duplicates win but keep the first key's position.
            map.insert(key, value);

            self.skip_whitespace();
            match self.chars.next() {
                Some((_, ',')) => {}
                Some((_, '}')) => return Ok(Value::Object(map)),
                Some((offset, ch)) => return Err(LiteralError::UnexpectedChar { ch, offset }),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn key(&mut self) -> Result<String, LiteralError> {
        self.skip_whitespace();
        let (offset, _) = self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        match self.value()? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
                Err(LiteralError::InvalidKey(offset))
            }
        }
    }

    /// Comma separated values up to `close`. Also reports whether the last
    /// token before `close` was a comma.
    fn items(&mut self, open: char, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.chars.next_if(|&(_, c)| c == close).is_some() {
                return Ok((items, trailing_comma));
            }

            items.push(self.value()?);

            self.skip_whitespace();
            match self.chars.next() {
                Some((_, ',')) => trailing_comma = true,
                Some((_, c)) if c == close => return Ok((items, false)),
                Some((offset, ch)) => return Err(LiteralError::UnexpectedChar { ch, offset }),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    /// `(x)` is a parenthesized value, `(x,)` and `(x, y)` are tuples.
    fn tuple(&mut self) -> Result<Value, LiteralError> {
        let (mut items, trailing_comma) = self.items('(', ')')?;
        if items.len() == 1 && !trailing_comma {
            if let Some(item) = items.pop() {
                return Ok(item);
            }
        }
        Ok(Value::Array(items))
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<String, LiteralError> {
        let mut out = self.string()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some((_, '\'' | '"')) => out.push_str(&self.string()?),
                _ => return Ok(out),
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let (_, quote) = self.chars.next().ok_or(LiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            let (offset, ch) = self.chars.next().ok_or(LiteralError::UnexpectedEnd)?;
            match ch {
                c if c == quote => return Ok(out),
                '\n' => return Err(LiteralError::UnexpectedChar { ch, offset }),
                '\\' => self.escape(offset, &mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, offset: usize, out: &mut String) -> Result<(), LiteralError> {
        let (_, ch) = self.chars.next().ok_or(LiteralError::UnexpectedEnd)?;
        match ch {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(ch),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            'x' => out.push(self.hex_char(2, offset)?),
            'u' => out.push(self.hex_char(4, offset)?),
            'U' => out.push(self.hex_char(8, offset)?),
            '0'..='7' => {
                let mut code = ch.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.chars.next_if(|&(_, d)| d.is_digit(8)) {
                        Some((_, d)) => code = code * 8 + d.to_digit(8).unwrap_or_default(),
                        None => break,
                    }
                }
                out.push(char::from_u32(code).ok_or(LiteralError::InvalidEscape(offset))?);
            }
            // Unknown escapes are kept verbatim.
            _ => {
                out.push('\\');
                out.push(ch);
            }
        }
        Ok(())
    }

    fn hex_char(&mut self, len: usize, offset: usize) -> Result<char, LiteralError> {
        let mut code: u32 = 0;
        for _ in 0..len {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or(LiteralError::InvalidEscape(offset))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(LiteralError::InvalidEscape(offset))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let mut text = String::new();
        if let Some((_, sign)) = self.chars.next_if(|&(_, c)| c == '+' || c == '-') {
            text.push(sign);
        }

        let mut prev = ' ';
        while let Some((_, c)) = self.chars.next_if(|&(_, c)| {
            c.is_ascii_alphanumeric()
                || c == '_'
                || c == '.'
                || (matches!(c, '+' | '-') && matches!(prev, 'e' | 'E'))
        }) {
            if c != '_' {
                text.push(c);
            }
            prev = c;
        }

        parse_number(&text)
    }

    fn constant(&mut self) -> Result<Value, LiteralError> {
        let (offset, _) = self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        let mut name = String::new();
        while let Some((_, c)) = self.chars.next_if(|&(_, c)| c.is_alphanumeric() || c == '_') {
            name.push(c);
        }
        match name.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            _ => Err(LiteralError::UnknownName { name, offset }),
        }
    }
}

fn parse_number(text: &str) -> Result<Value, LiteralError> {
    let invalid = || LiteralError::InvalidNumber(text.to_string());

    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };

    let radix = match digits.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let magnitude = digits.get(2..).unwrap_or_default();
        if magnitude.starts_with(['+', '-']) {
            return Err(invalid());
        }
        let signed = format!("{sign}{magnitude}");
        if let Ok(int) = i64::from_str_radix(&signed, radix) {
            return Ok(Value::from(int));
        }
        return match (sign, u64::from_str_radix(magnitude, radix)) {
            ("", Ok(int)) => Ok(Value::from(int)),
            _ => Err(invalid()),
        };
    }

    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }

    if !digits.contains(['.', 'e', 'E']) {
        // Decimal integers other than zero cannot start with 0.
        if digits.starts_with('0') && digits.contains(|c: char| c != '0') {
            return Err(invalid());
        }
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::from(int));
        }
        if let Ok(int) = text.parse::<u64>() {
            return Ok(Value::from(int));
        }
    }

    // Floats, and integers too large for 64 bits.
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(invalid)
}
