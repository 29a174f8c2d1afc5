//! Tokenizer: turns expression text into a flat vector of tokens.
//!
//! Single pass, no backtracking. Positions are character offsets into the
//! source text.

use crate::error::{ExprError, Result};
use log::trace;
use serde_json::Value as JsonValue;

/// Single-character punctuation, `=` included.
const PUNCTUATION: &str = "[],{}:.()=";

/// Prefix operators.
const OPERATORS: &str = "+!-";

/// A lexeme plus its literal value when it has one.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Raw source text (strings keep their quotes).
    pub text: String,
    /// Parsed payload of number and string literals.
    pub value: Option<JsonValue>,
    pub identifier: bool,
    pub position: usize,
}

impl Token {
    fn punctuation(ch: char, position: usize) -> Self {
        Token {
            text: ch.to_string(),
            value: None,
            identifier: false,
            position,
        }
    }
}

pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    tokens: Vec<Token>,
}

/// Tokenizes `text`.
pub fn lex(text: &str) -> Result<Vec<Token>> {
    Lexer::new(text).lex()
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        Lexer {
            chars: text.chars().collect(),
            index: 0,
            tokens: Vec::new(),
        }
    }

    pub fn lex(mut self) -> Result<Vec<Token>> {
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() || (ch == '.' && self.peek().is_some_and(|c| c.is_ascii_digit())) {
                self.read_number()?;
            } else if ch == '\'' || ch == '"' {
                self.read_string(ch)?;
            } else if PUNCTUATION.contains(ch) || OPERATORS.contains(ch) {
                self.tokens.push(Token::punctuation(ch, self.index));
                self.index += 1;
            } else if is_ident_start(ch) {
                self.read_ident();
            } else if is_whitespace(ch) {
                self.index += 1;
            } else {
                return Err(ExprError::UnexpectedCharacter {
                    ch,
                    position: self.index,
                });
            }
        }
        trace!(target: "scope_expression", "lexed {} tokens", self.tokens.len());
        Ok(self.tokens)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn read_number(&mut self) -> Result<()> {
        let start = self.index;
        let mut number = String::new();

        while let Some(raw) = self.current() {
            let ch = raw.to_ascii_lowercase();
            if ch == '.' || ch.is_ascii_digit() {
                number.push(ch);
            } else {
                let next = self.peek();
                let prev = number.chars().last();
                if ch == 'e' && next.is_some_and(is_exp_operator) {
                    number.push(ch);
                } else if ch == '+' || ch == '-' {
                    // A sign is only valid right after the exponent marker and
                    // must be followed by a digit.
                    if prev == Some('e') && next.is_some_and(|c| c.is_ascii_digit()) {
                        number.push(ch);
                    } else {
                        return Err(ExprError::InvalidExponent { position: self.index });
                    }
                } else {
                    break;
                }
            }
            self.index += 1;
        }

        let text: String = self.chars[start..self.index].iter().collect();
        // Runs such as `1.2.3` have no numeric value.
        let value = number
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .ok_or(ExprError::InvalidNumber { position: start })?;
        self.tokens.push(Token {
            text,
            value: Some(JsonValue::Number(value)),
            identifier: false,
            position: start,
        });
        Ok(())
    }

    fn read_string(&mut self, quote: char) -> Result<()> {
        let start = self.index;
        self.index += 1;
        let mut string = String::new();
        let mut escape = false;

        while let Some(ch) = self.current() {
            if escape {
                if ch == 'u' {
                    let c = self.read_unicode_escape()?;
                    string.push(c);
                } else {
                    string.push(unescape(ch));
                }
                escape = false;
            } else if ch == quote {
                self.index += 1;
                let text: String = self.chars[start..self.index].iter().collect();
                self.tokens.push(Token {
                    text,
                    value: Some(JsonValue::String(string)),
                    identifier: false,
                    position: start,
                });
                return Ok(());
            } else if ch == '\\' {
                escape = true;
            } else {
                string.push(ch);
            }
            self.index += 1;
        }

        Err(ExprError::UnmatchedQuote { position: start })
    }

    /// Reads `XXXX` after `\u`, leaving the cursor on the last hex digit.
    /// A high surrogate directly followed by an escaped low surrogate is
    /// combined into one code point.
    fn read_unicode_escape(&mut self) -> Result<char> {
        let position = self.index - 1;
        let high = self.hex4(self.index + 1).ok_or(ExprError::InvalidUnicodeEscape { position })?;
        self.index += 4;

        if (0xD800..0xDC00).contains(&high)
            && self.chars.get(self.index + 1) == Some(&'\\')
            && self.chars.get(self.index + 2) == Some(&'u')
        {
            if let Some(low) = self.hex4(self.index + 3).filter(|l| (0xDC00..0xE000).contains(l)) {
                self.index += 6;
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).ok_or(ExprError::InvalidUnicodeEscape { position });
            }
        }

        char::from_u32(high).ok_or(ExprError::InvalidUnicodeEscape { position })
    }

    fn hex4(&self, from: usize) -> Option<u32> {
        let digits = self.chars.get(from..from + 4)?;
        if !digits.iter().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let hex: String = digits.iter().collect();
        u32::from_str_radix(&hex, 16).ok()
    }

    fn read_ident(&mut self) {
        let start = self.index;
        while self.current().is_some_and(is_ident_part) {
            self.index += 1;
        }
        self.tokens.push(Token {
            text: self.chars[start..self.index].iter().collect(),
            value: None,
            identifier: true,
            position: start,
        });
    }
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        'f' => '\u{000C}',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{000B}',
        // `'`, `"` and every other escaped character stand for themselves.
        other => other,
    }
}

fn is_exp_operator(ch: char) -> bool {
    ch == '-' || ch == '+' || ch.is_ascii_digit()
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_part(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\r' | '\n' | '\t' | '\u{000B}' | '\u{00A0}')
}
