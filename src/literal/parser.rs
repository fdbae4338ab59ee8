use serde_json::{Map, Number, Value};

use super::error::{LiteralError, Span};
use super::lexer::{lex, SpannedToken, Token};
use crate::extract::WRAPPER_KEYS;

/// Maximum nesting of lists, mappings and calls.
pub const MAX_DEPTH: usize = 64;

/// Parse a restricted literal into a JSON value. Nothing is evaluated; the
/// input either matches the grammar or is rejected at its first stray token.
pub fn parse(source: &str) -> Result<Value, LiteralError> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(tokens);
    let value = parser.parse_top()?;
    parser.expect_eof()?;
    Ok(value)
}

/// Where a value sits. Calls in command position name a command; anywhere
/// else they only build a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Command,
    Nested,
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map_or(Span::new(0, 0), |t| t.span)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, LiteralError> {
        if self.peek() == expected {
            let sp = self.span();
            self.advance();
            Ok(sp)
        } else {
            Err(self.unexpected(&format!("expected {}", expected.describe())))
        }
    }

    fn expect_eof(&self) -> Result<(), LiteralError> {
        if matches!(self.peek(), Token::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("expected end of input"))
        }
    }

    fn unexpected(&self, context: &str) -> LiteralError {
        LiteralError::parser(
            format!("Unexpected {}, {context}", self.peek().describe()),
            self.span(),
        )
    }

    fn check_depth(&self, depth: usize) -> Result<(), LiteralError> {
        if depth > MAX_DEPTH {
            Err(LiteralError::parser(
                format!("Nesting deeper than {MAX_DEPTH} levels"),
                self.span(),
            ))
        } else {
            Ok(())
        }
    }

    // ── Grammar ────────────────────────────────────────────────────

    fn parse_top(&mut self) -> Result<Value, LiteralError> {
        if matches!(self.peek(), Token::LBracket) {
            self.parse_list(Slot::Command, 1)
        } else {
            self.parse_value(Slot::Command, 0)
        }
    }

    fn parse_value(&mut self, slot: Slot, depth: usize) -> Result<Value, LiteralError> {
        self.check_depth(depth)?;
        let span = self.span();
        match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                Ok(Value::String(s))
            }
            Token::Int(n) => {
                self.advance();
                Ok(Value::Number(n.into()))
            }
            Token::Float(f) => {
                self.advance();
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| LiteralError::parser("Number is not finite", span))
            }
            Token::True => {
                self.advance();
                Ok(Value::Bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Value::Bool(false))
            }
            Token::Null => {
                self.advance();
                Ok(Value::Null)
            }
            Token::LBracket => self.parse_list(Slot::Nested, depth + 1),
            Token::LBrace => self.parse_mapping(depth + 1),
            Token::Ident(name) => {
                self.advance();
                if matches!(self.peek(), Token::LParen) {
                    self.parse_call(name, slot, depth + 1)
                } else {
                    Err(LiteralError::parser(
                        format!("Bare identifier `{name}` is not a literal"),
                        span,
                    ))
                }
            }
            _ => Err(self.unexpected("expected a value")),
        }
    }

    /// Value of a mapping entry or keyword argument. A list under a wrapper
    /// key holds commands, so its calls are in command position.
    fn parse_entry(&mut self, key: &str, depth: usize) -> Result<Value, LiteralError> {
        if WRAPPER_KEYS.contains(&key) && matches!(self.peek(), Token::LBracket) {
            self.parse_list(Slot::Command, depth + 1)
        } else {
            self.parse_value(Slot::Nested, depth)
        }
    }

    /// `[` already peeked. Elements inherit `slot`.
    fn parse_list(&mut self, slot: Slot, depth: usize) -> Result<Value, LiteralError> {
        self.check_depth(depth)?;
        self.expect(&Token::LBracket)?;
        let mut items = Vec::new();
        loop {
            if matches!(self.peek(), Token::RBracket) {
                self.advance();
                break;
            }
            items.push(self.parse_value(slot, depth)?);
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RBracket => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("expected `,` or `]`")),
            }
        }
        Ok(Value::Array(items))
    }

    fn parse_mapping(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.expect(&Token::LBrace)?;
        let mut map = Map::new();
        loop {
            if matches!(self.peek(), Token::RBrace) {
                self.advance();
                break;
            }
            let key_span = self.span();
            let key = match self.advance() {
                Token::Str(s) | Token::Ident(s) => s,
                other => {
                    return Err(LiteralError::parser(
                        format!("Unexpected {}, expected a mapping key", other.describe()),
                        key_span,
                    ))
                }
            };
            self.expect(&Token::Colon)?;
            let value = self.parse_entry(&key, depth)?;
            insert_unique(&mut map, key, value, key_span)?;
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RBrace => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("expected `,` or `}`")),
            }
        }
        Ok(Value::Object(map))
    }

    /// Identifier already consumed; `(` is next. Only keyword arguments are accepted.
    fn parse_call(&mut self, name: String, slot: Slot, depth: usize) -> Result<Value, LiteralError> {
        self.expect(&Token::LParen)?;
        let mut kwargs = Map::new();
        loop {
            if matches!(self.peek(), Token::RParen) {
                self.advance();
                break;
            }
            let key_span = self.span();
            let Token::Ident(key) = self.peek().clone() else {
                return Err(self.unexpected("expected a keyword argument"));
            };
            self.advance();
            if !matches!(self.peek(), Token::Eq) {
                return Err(LiteralError::parser(
                    format!("Positional argument `{key}` is not supported, use `{key}=...`"),
                    key_span,
                ));
            }
            self.advance();
            let value = self.parse_entry(&key, depth)?;
            insert_unique(&mut kwargs, key, value, key_span)?;
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("expected `,` or `)`")),
            }
        }

        if name == "dict" || slot == Slot::Nested {
            return Ok(Value::Object(kwargs));
        }
        let mut record = Map::new();
        record.insert("command".into(), Value::String(name));
        record.insert("params".into(), Value::Object(kwargs));
        Ok(Value::Object(record))
    }
}

fn insert_unique(
    map: &mut Map<String, Value>,
    key: String,
    value: Value,
    span: Span,
) -> Result<(), LiteralError> {
    if map.contains_key(&key) {
        return Err(LiteralError::parser(format!("Duplicate key `{key}`"), span));
    }
    map.insert(key, value);
    Ok(())
}
