//! Tokenizer turning Tinymoe source text into classified tokens

use std::fmt;
use tracing::debug;

use crate::language::{Position, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    InvalidCharacter(usize, char),
    UnclosedString(usize),
}

impl LexingError {
    pub fn offset(&self) -> usize {
        match self {
            LexingError::InvalidCharacter(offset, _) => *offset,
            LexingError::UnclosedString(offset) => *offset,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LexingError::InvalidCharacter(_, c) => format!("invalid character '{}'", c),
            LexingError::UnclosedString(_) => "unclosed string literal".to_string(),
        }
    }
}

impl fmt::Display for LexingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for LexingError {}

/// Split source text into tokens. Comments run from `--` to the end of the
/// line and are discarded along with whitespace.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexingError> {
    let mut lexer = Lexer::new(source);
    lexer.read_tokens()?;

    debug!("Read {} tokens", lexer.tokens.len());
    Ok(lexer.tokens)
}

/// Group tokens into statements, one per source line.
pub fn lines(tokens: &[Token]) -> Vec<&[Token]> {
    let mut result = Vec::new();
    let mut start = 0;

    for i in 1..=tokens.len() {
        if i == tokens.len() || tokens[i].position.row != tokens[start].position.row {
            result.push(&tokens[start..i]);
            start = i;
        }
    }

    result
}

struct Lexer<'i> {
    source: &'i str,
    offset: usize,
    row: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'i> Lexer<'i> {
    fn new(source: &'i str) -> Lexer<'i> {
        Lexer {
            source,
            offset: 0,
            row: 0,
            column: 0,
            tokens: Vec::new(),
        }
    }

    fn rest(&self) -> &'i str {
        &self.source[self.offset..]
    }

    fn position(&self) -> Position {
        Position {
            offset: self.offset,
            row: self.row,
            column: self.column,
        }
    }

    fn advance(&mut self, width: usize) {
        for c in self.source[self.offset..self.offset + width].chars() {
            if c == '\n' {
                self.row += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.offset += width;
    }

    fn push(&mut self, kind: TokenKind, value: &str, width: usize) {
        let position = self.position();
        self.advance(width);
        let end = self.position();
        self.tokens
            .push(Token::spanning(kind, value, position, end));
    }

    fn read_tokens(&mut self) -> Result<(), LexingError> {
        while let Some(c) = self
            .rest()
            .chars()
            .next()
        {
            let rest = self.rest();

            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else if rest.starts_with("--") {
                let width = rest
                    .find('\n')
                    .unwrap_or(rest.len());
                self.advance(width);
            } else if c.is_ascii_digit() {
                self.read_number();
            } else if c.is_alphabetic() || c == '_' {
                self.read_identifier();
            } else if c == '"' {
                self.read_string()?;
            } else {
                self.read_operator(c)?;
            }
        }
        Ok(())
    }

    fn read_number(&mut self) {
        let rest = self.rest();
        let re = regex!(r"^[0-9]+(\.[0-9]+)?");

        // a digit is always present, so this always matches
        let width = re
            .find(rest)
            .map(|found| found.end())
            .unwrap_or(1);
        let text = &rest[..width];

        let kind = if text.contains('.') {
            TokenKind::Float
        } else {
            TokenKind::Integer
        };
        self.push(kind, text, width);
    }

    fn read_identifier(&mut self) {
        let rest = self.rest();
        let width = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let text = &rest[..width];

        let kind = match text {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Identifier,
        };
        self.push(kind, text, width);
    }

    fn read_string(&mut self) -> Result<(), LexingError> {
        let rest = self.rest();
        let mut content = String::new();
        let mut escaped = false;

        for (i, c) in rest
            .char_indices()
            .skip(1)
        {
            if escaped {
                match c {
                    'n' => content.push('\n'),
                    't' => content.push('\t'),
                    _ => content.push(c),
                }
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                self.push(TokenKind::String, &content, i + 1);
                return Ok(());
            } else if c == '\n' {
                break;
            } else {
                content.push(c);
            }
        }

        Err(LexingError::UnclosedString(self.offset))
    }

    fn read_operator(&mut self, c: char) -> Result<(), LexingError> {
        let rest = self.rest();

        for (text, kind) in [
            ("<=", TokenKind::LE),
            (">=", TokenKind::GE),
            ("<>", TokenKind::NE),
        ] {
            if rest.starts_with(text) {
                self.push(kind, text, 2);
                return Ok(());
            }
        }

        let kind = match c {
            '+' => TokenKind::Add,
            '-' => TokenKind::Sub,
            '*' => TokenKind::Mul,
            '/' => TokenKind::Div,
            '\\' => TokenKind::IntDiv,
            '%' => TokenKind::Mod,
            '&' => TokenKind::Concat,
            '<' => TokenKind::LT,
            '>' => TokenKind::GT,
            '=' => TokenKind::EQ,
            '(' => TokenKind::OpenBracket,
            ')' => TokenKind::CloseBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            _ => return Err(LexingError::InvalidCharacter(self.offset, c)),
        };

        let text = &rest[..c.len_utf8()];
        self.push(kind, text, c.len_utf8());
        Ok(())
    }
}
