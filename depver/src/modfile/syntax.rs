//! Line-oriented syntax tree for go.mod files
//!
//! The tree keeps every statement with the comments attached to it, which is
//! where deprecation notices, retraction rationales and `// indirect` markers
//! live.

use super::error::{ErrorKind, ParseError, Position};
use super::lexer::{Lexer, Token, TokenKind};

/// A single `//` comment. An empty `token` marks a preserved blank line
/// inside a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    pub position: Position,
    pub token: String,
}

impl Comment {
    fn from_token(tok: &Token<'_>) -> Self {
        Self {
            position: tok.pos,
            token: tok.text.to_string(),
        }
    }

    /// Comment text without the leading `//`, or `None` for blank-line markers.
    pub fn text(&self) -> Option<&str> {
        self.token.strip_prefix("//")
    }
}

/// Comments attached to a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Whole-line comments directly above the statement
    pub before: Vec<Comment>,
    /// Comment at the end of the statement's line
    pub suffix: Vec<Comment>,
}

/// A single directive line, either top-level or inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub start: Position,
    /// Raw tokens; quoted strings keep their quotes
    pub tokens: Vec<String>,
    pub comments: Comments,
    pub in_block: bool,
}

/// A factored block such as `require ( ... )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBlock {
    pub start: Position,
    /// Tokens before the opening paren, normally just the verb
    pub tokens: Vec<String>,
    pub lines: Vec<Line>,
    /// Comments above the block header, plus the suffix of a one-line `()` block
    pub comments: Comments,
    /// Suffix comment on the opening `(` line
    pub lparen: Comments,
    /// Comments between the last line and the closing paren, and the suffix
    /// comment on the `)` line
    pub rparen: Comments,
}

/// A paragraph of comments not attached to any statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub start: Position,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Line(Line),
    Block(LineBlock),
    Comments(CommentBlock),
}

impl Stmt {
    pub fn comments(&self) -> &Comments {
        match self {
            Stmt::Line(line) => &line.comments,
            Stmt::Block(block) => &block.comments,
            Stmt::Comments(block) => &block.comments,
        }
    }

    fn comments_mut(&mut self) -> &mut Comments {
        match self {
            Stmt::Line(line) => &mut line.comments,
            Stmt::Block(block) => &mut block.comments,
            Stmt::Comments(block) => &mut block.comments,
        }
    }
}

/// The parsed statement list of a whole file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSyntax {
    pub stmts: Vec<Stmt>,
}

/// Builds the syntax tree. Stops at the first lexical or structural error.
pub(crate) fn parse_syntax(text: &str) -> Result<FileSyntax, ParseError> {
    SyntaxParser {
        lexer: Lexer::new(text),
        peeked: None,
    }
    .parse_file()
}

struct SyntaxParser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token<'a>>,
}

impl<'a> SyntaxParser<'a> {
    fn peek(&mut self) -> Result<Token<'a>, ParseError> {
        if let Some(tok) = self.peeked {
            return Ok(tok);
        }
        let tok = self.lexer.next_token()?;
        self.peeked = Some(tok);
        Ok(tok)
    }

    fn next(&mut self) -> Result<Token<'a>, ParseError> {
        match self.peeked.take() {
            Some(tok) => Ok(tok),
            None => self.lexer.next_token(),
        }
    }

    fn parse_file(mut self) -> Result<FileSyntax, ParseError> {
        let mut file = FileSyntax::default();
        let mut pending: Option<CommentBlock> = None;

        loop {
            let tok = self.peek()?;
            match tok.kind {
                TokenKind::Newline => {
                    self.next()?;
                    if let Some(block) = pending.take() {
                        file.stmts.push(Stmt::Comments(block));
                    }
                }
                TokenKind::Comment => {
                    self.next()?;
                    pending
                        .get_or_insert_with(|| CommentBlock {
                            start: tok.pos,
                            comments: Comments::default(),
                        })
                        .comments
                        .before
                        .push(Comment::from_token(&tok));
                }
                TokenKind::Eof => {
                    if let Some(block) = pending.take() {
                        file.stmts.push(Stmt::Comments(block));
                    }
                    return Ok(file);
                }
                _ => {
                    let mut stmt = self.parse_stmt()?;
                    if let Some(block) = pending.take() {
                        stmt.comments_mut().before = block.comments.before;
                    }
                    file.stmts.push(stmt);
                }
            }
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let first = self.next()?;
        let start = first.pos;
        let mut tokens = vec![first.text.to_string()];

        loop {
            let tok = self.next()?;
            match tok.kind {
                kind if kind.is_eol() => {
                    return Ok(Stmt::Line(Line {
                        start,
                        tokens,
                        comments: Comments {
                            before: Vec::new(),
                            suffix: suffix_of(&tok),
                        },
                        in_block: false,
                    }));
                }
                TokenKind::LParen => {
                    let next = self.peek()?;
                    if next.kind.is_eol() {
                        return self.parse_line_block(start, tokens).map(Stmt::Block);
                    }
                    if next.kind == TokenKind::RParen {
                        let rparen = self.next()?;
                        let end = self.peek()?;
                        if end.kind.is_eol() {
                            self.next()?;
                            return Ok(Stmt::Block(LineBlock {
                                start,
                                tokens,
                                lines: Vec::new(),
                                comments: Comments {
                                    before: Vec::new(),
                                    suffix: suffix_of(&end),
                                },
                                lparen: Comments::default(),
                                rparen: Comments::default(),
                            }));
                        }
                        // '( )' in the middle of a line
                        tokens.push(tok.text.to_string());
                        tokens.push(rparen.text.to_string());
                    } else {
                        tokens.push(tok.text.to_string());
                    }
                }
                _ => tokens.push(tok.text.to_string()),
            }
        }
    }

    fn parse_line_block(
        &mut self,
        start: Position,
        tokens: Vec<String>,
    ) -> Result<LineBlock, ParseError> {
        let mut block = LineBlock {
            start,
            tokens,
            lines: Vec::new(),
            comments: Comments::default(),
            lparen: Comments::default(),
            rparen: Comments::default(),
        };
        let mut comments: Vec<Comment> = Vec::new();

        loop {
            let tok = self.peek()?;
            match tok.kind {
                TokenKind::EolComment => {
                    self.next()?;
                    block.lparen.suffix.push(Comment::from_token(&tok));
                }
                TokenKind::Newline => {
                    self.next()?;
                    let keep_blank = match comments.last() {
                        None => !block.lines.is_empty(),
                        Some(last) => !last.token.is_empty(),
                    };
                    if keep_blank {
                        comments.push(Comment {
                            position: tok.pos,
                            token: String::new(),
                        });
                    }
                }
                TokenKind::Comment => {
                    self.next()?;
                    comments.push(Comment::from_token(&tok));
                }
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        tok.pos,
                        ErrorKind::UnterminatedBlock(start),
                    ));
                }
                TokenKind::RParen => {
                    self.next()?;
                    if comments.len() == 1 && comments[0].token.is_empty() {
                        comments.clear();
                    }
                    block.rparen.before = comments;
                    let end = self.peek()?;
                    if !end.kind.is_eol() {
                        return Err(ParseError::new(
                            end.pos,
                            ErrorKind::ExpectedNewlineAfterParen,
                        ));
                    }
                    self.next()?;
                    block.rparen.suffix = suffix_of(&end);
                    return Ok(block);
                }
                _ => {
                    let mut line = self.parse_line()?;
                    line.comments.before = std::mem::take(&mut comments);
                    block.lines.push(line);
                }
            }
        }
    }

    fn parse_line(&mut self) -> Result<Line, ParseError> {
        let first = self.next()?;
        let start = first.pos;
        let mut tokens = vec![first.text.to_string()];

        loop {
            let tok = self.next()?;
            if tok.kind.is_eol() {
                return Ok(Line {
                    start,
                    tokens,
                    comments: Comments {
                        before: Vec::new(),
                        suffix: suffix_of(&tok),
                    },
                    in_block: true,
                });
            }
            tokens.push(tok.text.to_string());
        }
    }
}

fn suffix_of(tok: &Token<'_>) -> Vec<Comment> {
    if tok.kind == TokenKind::EolComment {
        vec![Comment::from_token(tok)]
    } else {
        Vec::new()
    }
}

/// Interprets a directive argument: double-quoted strings are unquoted,
/// bare words are taken as-is but may not contain quote characters.
pub(crate) fn parse_string(arg: &str) -> Result<String, ErrorKind> {
    if arg.starts_with('"') {
        unquote(arg).map_err(ErrorKind::InvalidQuotedString)
    } else if arg.contains(['"', '\'', '`']) {
        Err(ErrorKind::InvalidQuotedString(
            "unquoted string cannot contain quote",
        ))
    } else {
        Ok(arg.to_string())
    }
}

/// Decodes a double-quoted string literal with Go escape rules.
fn unquote(literal: &str) -> Result<String, &'static str> {
    const INVALID: &str = "invalid syntax";

    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(INVALID)?;

    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\n' => return Err(INVALID),
            '\\' => {
                let escape = chars.next().ok_or(INVALID)?;
                match escape {
                    'a' => out.push(0x07),
                    'b' => out.push(0x08),
                    'f' => out.push(0x0c),
                    'n' => out.push(b'\n'),
                    'r' => out.push(b'\r'),
                    't' => out.push(b'\t'),
                    'v' => out.push(0x0b),
                    '\\' => out.push(b'\\'),
                    '"' => out.push(b'"'),
                    'x' => out.push(take_radix(&mut chars, 2, 16)? as u8),
                    '0'..='7' => {
                        let rest = take_radix(&mut chars, 2, 8)?;
                        let value = (escape as u32 - '0' as u32) * 64 + rest;
                        out.push(u8::try_from(value).map_err(|_| INVALID)?);
                    }
                    'u' | 'U' => {
                        let digits = if escape == 'u' { 4 } else { 8 };
                        let value = take_radix(&mut chars, digits, 16)?;
                        let decoded = char::from_u32(value).ok_or(INVALID)?;
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(decoded.encode_utf8(&mut buf).as_bytes());
                    }
                    _ => return Err(INVALID),
                }
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    String::from_utf8(out).map_err(|_| INVALID)
}

fn take_radix(chars: &mut std::str::Chars<'_>, count: usize, radix: u32) -> Result<u32, &'static str> {
    let mut value = 0u32;
    for _ in 0..count {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(radix))
            .ok_or("invalid syntax")?;
        value = value * radix + digit;
    }
    Ok(value)
}
