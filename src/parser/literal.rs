//! Strict reader for JavaScript data literals.
//!
//! Accepts objects (bare, quoted or numeric keys), arrays, strings in either
//! quote style, numbers, `true`/`false`/`null` and the minifier spellings
//! `!0`/`!1`. Anything that would need a JS engine (calls, operators,
//! identifiers in value position) is rejected, so a hostile bundle can at
//! worst produce a parse error.

use crate::error::ParseError;

/// Nesting beyond this is rejected instead of risking stack exhaustion.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Literal>),
    /// Members in first-appearance order; a repeated key keeps its slot
    /// and takes the later value.
    Object(Vec<(String, Literal)>),
}

impl Literal {
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "boolean",
            Literal::Number(_) => "number",
            Literal::String(_) => "string",
            Literal::Array(_) => "array",
            Literal::Object(_) => "object",
        }
    }

    pub fn as_array(&self) -> Option<&[Literal]> {
        match self {
            Literal::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Property lookup.
    pub fn get(&self, key: &str) -> Option<&Literal> {
        match self {
            Literal::Object(members) => members.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// First member of an object, in source order.
    pub fn first_entry(&self) -> Option<(&str, &Literal)> {
        match self {
            Literal::Object(members) => members.first().map(|(k, v)| (k.as_str(), v)),
            _ => None,
        }
    }
}

/// Read `name = <literal>` (optionally `;`-terminated) and return the value.
pub fn evaluate(snippet: &str) -> Result<Literal, ParseError> {
    let mut p = Reader::new(snippet);
    p.skip_ws();
    let start = p.pos;
    if p.identifier().is_none() {
        return Err(ParseError::at(start, "expected an assignment target"));
    }
    p.skip_ws();
    p.expect('=')?;
    p.skip_ws();
    let value = p.value(0)?;
    p.skip_ws();
    if p.peek() == Some(';') {
        p.bump();
        p.skip_ws();
    }
    p.finish()?;
    Ok(value)
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Reader { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() || c == '\u{feff}') {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(ParseError::at(
                self.pos,
                format!("expected '{}' but found '{}'", want, c),
            )),
            None => Err(ParseError::at(
                self.pos,
                format!("expected '{}' but reached end of input", want),
            )),
        }
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(ParseError::at(
                self.pos,
                format!("unexpected '{}' after literal", c),
            )),
        }
    }

    fn identifier(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                self.bump();
            }
            _ => return None,
        }
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        Some(&self.src[start..self.pos])
    }

    fn value(&mut self, depth: usize) -> Result<Literal, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::at(self.pos, "literal nested too deeply"));
        }
        let start = self.pos;
        match self.peek() {
            Some('{') => self.object(depth),
            Some('[') => self.array(depth),
            Some(q @ ('"' | '\'')) => self.string(q).map(Literal::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.number().map(Literal::Number)
            }
            Some('!') => {
                self.bump();
                match self.bump() {
                    Some('0') => Ok(Literal::Bool(true)),
                    Some('1') => Ok(Literal::Bool(false)),
                    _ => Err(ParseError::at(start, "only !0 and !1 are allowed")),
                }
            }
            Some(c) if is_ident_start(c) => match self.identifier().unwrap_or_default() {
                "true" => Ok(Literal::Bool(true)),
                "false" => Ok(Literal::Bool(false)),
                "null" => Ok(Literal::Null),
                other => Err(ParseError::at(
                    start,
                    format!("unexpected identifier `{}`; only data literals are allowed", other),
                )),
            },
            Some(c) => Err(ParseError::at(start, format!("unexpected '{}'", c))),
            None => Err(ParseError::at(start, "unexpected end of input")),
        }
    }

    fn object(&mut self, depth: usize) -> Result<Literal, ParseError> {
        self.expect('{')?;
        let mut members = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Literal::Object(members));
            }
            let key = self.key()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.value(depth + 1)?;
            match members.iter_mut().find(|(k, _)| *k == key) {
                Some((_, slot)) => *slot = value,
                None => members.push((key, value)),
            }
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => self.expect('}')?,
            }
        }
    }

    fn key(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.string(q),
            Some(c) if c.is_ascii_digit() => {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
                    self.bump();
                }
                Ok(self.src[start..self.pos].to_string())
            }
            _ => self
                .identifier()
                .map(str::to_string)
                .ok_or_else(|| ParseError::at(start, "expected an object key")),
        }
    }

    fn array(&mut self, depth: usize) -> Result<Literal, ParseError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Literal::Array(items));
            }
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                _ => self.expect(']')?,
            }
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let int_digits = self.digits();
        let mut frac_digits = 0;
        if self.peek() == Some('.') {
            self.bump();
            frac_digits = self.digits();
        }
        if int_digits == 0 && frac_digits == 0 {
            return Err(ParseError::at(start, "malformed number"));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('-' | '+')) {
                self.bump();
            }
            if self.digits() == 0 {
                return Err(ParseError::at(start, "malformed exponent"));
            }
        }
        let text = &self.src[start..self.pos];
        text.parse::<f64>()
            .map_err(|e| ParseError::at(start, format!("malformed number `{}`: {}", text, e)))
    }

    fn digits(&mut self) -> usize {
        let mut n = 0;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
            n += 1;
        }
        n
    }

    fn string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::at(start, "unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\n' | '\r') => {
                    return Err(ParseError::at(self.pos - 1, "line break inside string"))
                }
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let at = self.pos - 1;
        let c = self
            .bump()
            .ok_or_else(|| ParseError::at(at, "unterminated escape"))?;
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !matches!(self.peek(), Some(d) if d.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.hex(2, at)?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                let code = self.unicode_escape(at)?;
                out.push(code);
            }
            // Line continuation.
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            d if d.is_ascii_digit() => {
                return Err(ParseError::at(at, "octal escapes are not supported"));
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn unicode_escape(&mut self, at: usize) -> Result<char, ParseError> {
        if self.peek() == Some('{') {
            self.bump();
            let start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[start..self.pos];
            self.expect('}')?;
            let code = u32::from_str_radix(digits, 16)
                .map_err(|_| ParseError::at(at, "malformed \\u{...} escape"))?;
            return char::from_u32(code)
                .ok_or_else(|| ParseError::at(at, "escape is not a valid code point"));
        }

        let hi = self.hex(4, at)?;
        if (0xD800..0xDC00).contains(&hi)
            && self.peek() == Some('\\')
            && self.peek_at(1) == Some('u')
        {
            let save = self.pos;
            self.bump();
            self.bump();
            let lo = self.hex(4, at)?;
            if (0xDC00..0xE000).contains(&lo) {
                let code = 0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00);
                return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            self.pos = save;
        }
        Ok(char::from_u32(hi).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn hex(&mut self, len: usize, at: usize) -> Result<u32, ParseError> {
        let mut code = 0u32;
        for _ in 0..len {
            let d = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| ParseError::at(at, "malformed hex escape"))?;
            code = code * 16 + d;
        }
        Ok(code)
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}
