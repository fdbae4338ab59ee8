use super::error::{LiteralError, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Str(String),
    Int(i64),
    Float(f64),
    True,
    False,
    Null,

    Ident(String),

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Eq,

    Eof,
}

impl Token {
    /// Short human description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Str(_) => "string".into(),
            Token::Int(_) | Token::Float(_) => "number".into(),
            Token::True | Token::False => "boolean".into(),
            Token::Null => "null".into(),
            Token::Ident(name) => format!("identifier `{name}`"),
            Token::LParen => "`(`".into(),
            Token::RParen => "`)`".into(),
            Token::LBracket => "`[`".into(),
            Token::RBracket => "`]`".into(),
            Token::LBrace => "`{`".into(),
            Token::RBrace => "`}`".into(),
            Token::Comma => "`,`".into(),
            Token::Colon => "`:`".into(),
            Token::Eq => "`=`".into(),
            Token::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize the restricted literal notation. Stops at the first character
/// that cannot start a token.
pub fn lex(source: &str) -> Result<Vec<SpannedToken>, LiteralError> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<SpannedToken>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn tokenize(&mut self) -> Result<Vec<SpannedToken>, LiteralError> {
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(ch) = self.peek() else { break };

            match ch {
                b'(' => self.single(Token::LParen),
                b')' => self.single(Token::RParen),
                b'[' => self.single(Token::LBracket),
                b']' => self.single(Token::RBracket),
                b'{' => self.single(Token::LBrace),
                b'}' => self.single(Token::RBrace),
                b',' => self.single(Token::Comma),
                b':' => self.single(Token::Colon),
                b'=' => self.single(Token::Eq),
                b'"' | b'\'' => {
                    self.pos += 1;
                    self.lex_string(start, ch)?;
                }
                b'-' | b'0'..=b'9' => self.lex_number(start)?,
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_ident(start),
                _ => {
                    let unexpected = self
                        .source
                        .get(start..)
                        .and_then(|rest| rest.chars().next())
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Err(LiteralError::lexer(
                        format!("Unexpected character: '{unexpected}'"),
                        Span::new(start, start + unexpected.len_utf8()),
                    ));
                }
            }
        }

        self.tokens.push(SpannedToken {
            token: Token::Eof,
            span: Span::new(self.pos, self.pos),
        });
        Ok(std::mem::take(&mut self.tokens))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn single(&mut self, token: Token) {
        let start = self.pos;
        self.pos += 1;
        self.push(token, start, self.pos);
    }

    fn push(&mut self, token: Token, start: usize, end: usize) {
        self.tokens.push(SpannedToken {
            token,
            span: Span::new(start, end),
        });
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn lex_string(&mut self, start: usize, quote: u8) -> Result<(), LiteralError> {
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(LiteralError::lexer(
                    "Unterminated string literal",
                    Span::new(start, self.pos),
                ));
            };
            match ch {
                b'\n' => {
                    return Err(LiteralError::lexer(
                        "Unterminated string literal",
                        Span::new(start, self.pos),
                    ));
                }
                b'\\' => {
                    self.pos += 1;
                    self.lex_escape(&mut buf)?;
                }
                _ if ch == quote => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    buf.push(ch);
                    self.pos += 1;
                }
            }
        }
        // Only whole UTF-8 sequences from the source and encoded escapes end up in `buf`.
        let text = String::from_utf8(buf).map_err(|_| {
            LiteralError::lexer("Invalid UTF-8 in string literal", Span::new(start, self.pos))
        })?;
        self.push(Token::Str(text), start, self.pos);
        Ok(())
    }

    fn lex_escape(&mut self, buf: &mut Vec<u8>) -> Result<(), LiteralError> {
        let escape_start = self.pos - 1;
        let Some(ch) = self.peek() else {
            return Err(LiteralError::lexer(
                "Unterminated string literal",
                Span::new(escape_start, self.pos),
            ));
        };
        self.pos += 1;
        let decoded = match ch {
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'0' => '\0',
            b'\\' => '\\',
            b'\'' => '\'',
            b'"' => '"',
            b'/' => '/',
            b'u' => self.lex_unicode_escape(escape_start)?,
            other => {
                return Err(LiteralError::lexer(
                    format!("Unknown escape sequence: '\\{}'", char::from(other)),
                    Span::new(escape_start, self.pos),
                ));
            }
        };
        let mut utf8 = [0u8; 4];
        buf.extend_from_slice(decoded.encode_utf8(&mut utf8).as_bytes());
        Ok(())
    }

    /// `\uXXXX`, including a surrogate pair written as two escapes.
    fn lex_unicode_escape(&mut self, escape_start: usize) -> Result<char, LiteralError> {
        let high = self.read_hex4(escape_start)?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if self.bytes.get(self.pos..self.pos + 2) != Some(b"\\u".as_slice()) {
                return Err(LiteralError::lexer(
                    "Unpaired surrogate in \\u escape",
                    Span::new(escape_start, self.pos),
                ));
            }
            self.pos += 2;
            let low = self.read_hex4(escape_start)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(LiteralError::lexer(
                    "Unpaired surrogate in \\u escape",
                    Span::new(escape_start, self.pos),
                ));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| {
            LiteralError::lexer("Invalid \\u escape", Span::new(escape_start, self.pos))
        })
    }

    fn read_hex4(&mut self, escape_start: usize) -> Result<u32, LiteralError> {
        let digits = self
            .source
            .get(self.pos..self.pos + 4)
            .filter(|d| d.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| {
                LiteralError::lexer(
                    "Expected 4 hex digits after \\u",
                    Span::new(escape_start, self.pos),
                )
            })?;
        let value = u32::from_str_radix(digits, 16).map_err(|_| {
            LiteralError::lexer("Invalid \\u escape", Span::new(escape_start, self.pos))
        })?;
        self.pos += 4;
        Ok(value)
    }

    fn lex_number(&mut self, start: usize) -> Result<(), LiteralError> {
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        if !matches!(self.peek(), Some(b'0'..=b'9')) {
            return Err(LiteralError::lexer(
                "Expected digits after '-'",
                Span::new(start, self.pos),
            ));
        }
        self.skip_digits();

        let mut is_float = false;
        if self.peek() == Some(b'.') && self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit) {
            is_float = true;
            self.pos += 1;
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(b'0'..=b'9')) {
                is_float = true;
                self.skip_digits();
            } else {
                self.pos = save;
            }
        }

        let text = self.source.get(start..self.pos).unwrap_or_default();
        let token = if is_float {
            text.parse::<f64>().ok().filter(|f| f.is_finite()).map(Token::Float)
        } else {
            // Integers beyond i64 fall back to floating point, as JSON readers do.
            text.parse::<i64>()
                .map(Token::Int)
                .ok()
                .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(Token::Float))
        };
        match token {
            Some(token) => {
                self.push(token, start, self.pos);
                Ok(())
            }
            None => Err(LiteralError::lexer(
                format!("Number out of range: {text}"),
                Span::new(start, self.pos),
            )),
        }
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn lex_ident(&mut self, start: usize) {
        while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        let word = self.source.get(start..self.pos).unwrap_or_default();
        let token = match word {
            "true" | "True" => Token::True,
            "false" | "False" => Token::False,
            "null" | "None" => Token::Null,
            _ => Token::Ident(word.to_string()),
        };
        self.push(token, start, self.pos);
    }
}
