//! parser for the Tinymoe language

use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::language::{Expression, GrammarSymbol, LoadingError, Position, SymbolKind, Target, Token};
use crate::lexing::{self, LexingError};

mod chain;
mod error;
mod parser;
mod scope;

pub use error::ParsingError;
pub use parser::{count_statement_assignables, AssignableCount, Candidates, Parser};
pub use scope::{Frame, ScopeGuard, SymbolTable};

/// Read a file and return an owned String. We pass that ownership back to the
/// main function so that the Program created by parse() below can be built
/// from it.
pub fn load(filename: &Path) -> Result<String, LoadingError<'_>> {
    match std::fs::read_to_string(filename) {
        Ok(content) => Ok(content),
        Err(error) => {
            debug!(?error);
            match error.kind() {
                std::io::ErrorKind::NotFound => Err(LoadingError {
                    problem: "File not found".to_string(),
                    details: String::new(),
                    filename,
                }),
                _ => Err(LoadingError {
                    problem: "Failed reading".to_string(),
                    details: error
                        .kind()
                        .to_string(),
                    filename,
                }),
            }
        }
    }
}

/// One parsed line.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub row: usize,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A failure to read the program, located in the source text.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    Lexing(LexingError),
    Parsing {
        position: Position,
        error: ParsingError,
    },
}

impl SourceError {
    /// Byte offset into the source where the problem was found.
    pub fn offset(&self) -> usize {
        match self {
            SourceError::Lexing(error) => error.offset(),
            SourceError::Parsing { position, .. } => position.offset,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Lexing(error) => write!(f, "{}", error),
            SourceError::Parsing { position, error } => write!(
                f,
                "{}:{}: {}",
                position.row + 1,
                position.column + 1,
                error.message()
            ),
        }
    }
}

impl std::error::Error for SourceError {}

/// Parse text into a Program, one statement per line, or return the list
/// of errors encountered. A line which fails to parse is reported and
/// skipped, and parsing continues with the next one.
pub fn parse(filename: &Path, content: &str) -> Result<Program, Vec<SourceError>> {
    let tokens = lexing::tokenize(content).map_err(|error| vec![SourceError::Lexing(error)])?;

    let mut table = SymbolTable::new();
    let mut program = Program::default();
    let mut errors = Vec::new();

    for line in lexing::lines(&tokens) {
        let row = match line.first() {
            Some(token) => token.position.row,
            None => continue,
        };
        debug!("Line {} has {} tokens", row + 1, line.len());

        let parser = Parser::new(line, &table);
        let candidates = match parser.parse_statement(0) {
            Ok(candidates) => candidates,
            Err(error) => {
                errors.push(SourceError::Parsing {
                    position: locate(line, error.position()),
                    error,
                });
                continue;
            }
        };

        if candidates.len() > 1 {
            warn!(
                "Line {} is ambiguous, {} readings; using the first",
                row + 1,
                candidates.len()
            );
        }

        if let Some((_, expression)) = candidates
            .into_iter()
            .next()
        {
            if let Err(error) = declare(&mut table, &expression) {
                errors.push(SourceError::Parsing {
                    position: locate(line, error.position()),
                    error,
                });
                continue;
            }
            program
                .statements
                .push(Statement { row, expression });
        }
    }

    if table.depth() > 0 {
        debug!("{} blocks left open at end of file", table.depth());
    }

    if errors.is_empty() {
        debug!(
            "Parsed {} statement{} from {}",
            program
                .statements
                .len(),
            if program
                .statements
                .len()
                == 1
            {
                ""
            } else {
                "s"
            },
            filename.display()
        );
        Ok(program)
    } else {
        debug!("errors: {}", errors.len());
        Err(errors)
    }
}

/// Bring the effects of a statement into the symbol table: blocks open a
/// frame, `end` closes one, and new names become variables.
fn declare(table: &mut SymbolTable, statement: &Expression) -> Result<(), ParsingError> {
    let symbol = match statement.symbol() {
        Some(symbol) => symbol.clone(),
        None => return Ok(()),
    };

    if symbol.target() == Target::End {
        return match table.pop() {
            Some(_) => Ok(()),
            None => Err(ParsingError::no_match(0, "a block to end")),
        };
    }

    if symbol.kind() == SymbolKind::Block {
        table.push(Frame::body_of(&symbol));
    }

    let mut assignables = Vec::new();
    let mut arguments = Vec::new();
    let mut modified = Vec::new();
    statement.collect_new_assignables(&mut assignables, &mut arguments, &mut modified);

    for name in assignables
        .into_iter()
        .chain(arguments)
    {
        if let Expression::NewName { words, .. } = name {
            table.register(GrammarSymbol::variable(words));
        }
    }
    Ok(())
}

/// Where in the source a token index within a line points; the index one
/// past the last token means just after it.
fn locate(line: &[Token], index: usize) -> Position {
    if let Some(token) = line.get(index) {
        return token.position;
    }
    match line.last() {
        Some(token) => token.end,
        None => Position::default(),
    }
}
