//! Tokens as delivered by the lexical analyzer

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Integer,
    Float,
    String,

    Add,    // +
    Sub,    // -
    Mul,    // *
    Div,    // /
    IntDiv, // \
    Mod,    // %
    Concat, // &
    LT,     // <
    GT,     // >
    LE,     // <=
    GE,     // >=
    EQ,     // =
    NE,     // <>
    And,    // and
    Or,     // or
    Not,    // not

    OpenBracket,
    CloseBracket,
    Comma,
    Colon,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(self, TokenKind::Integer | TokenKind::Float | TokenKind::String)
    }
}

/// Where a token was found in the original source. Rows and columns are
/// zero-origin; add one before showing them to humans.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub position: Position,
    /// Just past the last character of the token in the source.
    pub end: Position,
}

impl Token {
    /// A token whose source text is assumed to be its written form.
    pub fn new(kind: TokenKind, value: impl Into<String>, position: Position) -> Token {
        let mut token = Token {
            kind,
            value: value.into(),
            position,
            end: position,
        };
        let written = token.to_string();
        token.end = Position {
            offset: position.offset + written.len(),
            row: position.row,
            column: position.column + written.chars().count(),
        };
        token
    }

    /// A token read from the source between the given positions.
    pub fn spanning(
        kind: TokenKind,
        value: impl Into<String>,
        position: Position,
        end: Position,
    ) -> Token {
        Token {
            kind,
            value: value.into(),
            position,
            end,
        }
    }

    /// Two tokens are the same lexeme if they agree on everything except
    /// where they came from.
    pub fn same_lexeme(&self, other: &Token) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "\"{}\"", escape(&self.value)),
            _ => write!(f, "{}", self.value),
        }
    }
}

/// Inverse of the unescaping done when a string literal is read.
pub fn escape(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            _ => result.push(c),
        }
    }
    result
}
