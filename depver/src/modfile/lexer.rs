//! Tokenizer for go.mod text

use std::sync::LazyLock;

use regex::Regex;

use super::error::{ErrorKind, ParseError, Position};

/// Printable non-space characters: letters, marks, numbers, punctuation and symbols
static PRINTABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{M}\p{N}\p{P}\p{S}]$").expect("valid printable character regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Eof,
    Newline,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    String,
    Ident,
    /// A comment that is the only thing on its line
    Comment,
    /// A comment that follows other tokens on its line; it also ends the line
    EolComment,
}

impl TokenKind {
    pub(crate) fn is_eol(self) -> bool {
        matches!(self, Self::Eof | Self::Newline | Self::EolComment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub pos: Position,
}

pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: Position,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: Position::START,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos.byte..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos.byte += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    fn token(&self, kind: TokenKind, start: Position) -> Token<'a> {
        Token {
            kind,
            text: &self.src[start.byte..self.pos.byte],
            pos: start,
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('/') if self.rest().starts_with("//") => return Ok(self.comment()),
                Some('/') if self.rest().starts_with("/*") => {
                    return Err(ParseError::new(self.pos, ErrorKind::BlockComment));
                }
                _ => break,
            }
        }

        let start = self.pos;
        let Some(c) = self.peek_char() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        let kind = match c {
            '\n' => TokenKind::Newline,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBrack,
            ']' => TokenKind::RBrack,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            '"' | '`' => return self.string(c),
            c if is_ident(c) => return self.ident(),
            c => return Err(ParseError::new(start, ErrorKind::UnexpectedChar(c))),
        };
        self.bump();
        Ok(self.token(kind, start))
    }

    /// Scans a `//` comment and the newline that ends it.
    fn comment(&mut self) -> Token<'a> {
        let start = self.pos;
        let line_start = self.src[..start.byte].rfind('\n').map_or(0, |i| i + 1);
        let suffix = !self.src[line_start..start.byte].trim().is_empty();

        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let text = self.src[start.byte..self.pos.byte].trim_end();
        self.bump();

        Token {
            kind: if suffix {
                TokenKind::EolComment
            } else {
                TokenKind::Comment
            },
            text,
            pos: start,
        }
    }

    fn string(&mut self, quote: char) -> Result<Token<'a>, ParseError> {
        let start = self.pos;
        self.bump();
        loop {
            match self.peek_char() {
                None => return Err(ParseError::new(start, ErrorKind::EofInString)),
                Some('\n') => return Err(ParseError::new(self.pos, ErrorKind::NewlineInString)),
                Some(c) => {
                    self.bump();
                    if c == quote {
                        break;
                    }
                    if c == '\\' && quote != '`' && self.bump().is_none() {
                        return Err(ParseError::new(start, ErrorKind::EofInString));
                    }
                }
            }
        }
        Ok(self.token(TokenKind::String, start))
    }

    fn ident(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !is_ident(c) || self.rest().starts_with("//") {
                break;
            }
            if self.rest().starts_with("/*") {
                return Err(ParseError::new(self.pos, ErrorKind::BlockComment));
            }
            self.bump();
        }
        Ok(self.token(TokenKind::Ident, start))
    }
}

fn is_ident(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_graphic() && !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | ',');
    }
    let mut buf = [0u8; 4];
    PRINTABLE_RE.is_match(c.encode_utf8(&mut buf))
}
