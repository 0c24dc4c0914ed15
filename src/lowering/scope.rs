use std::collections::BTreeMap;
use std::fmt;

use crate::language::GrammarSymbol;

/// Turn the identity of a symbol, or the words of a name, into an
/// identifier for the lowered form.
pub fn mangle(text: &str) -> String {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// The lowered names of the symbols in scope where an expression is being
/// translated.
#[derive(Debug, Clone, Default)]
pub struct TranslationScope {
    names: BTreeMap<String, String>,
}

impl TranslationScope {
    pub fn new() -> TranslationScope {
        TranslationScope {
            names: BTreeMap::new(),
        }
    }

    /// Lower the symbol with the given identity to a specific name.
    pub fn bind(&mut self, unique_id: impl Into<String>, name: impl Into<String>) {
        self.names
            .insert(unique_id.into(), name.into());
    }

    pub fn name_of(&self, symbol: &GrammarSymbol) -> String {
        match self
            .names
            .get(symbol.unique_id())
        {
            Some(name) => name.clone(),
            None => mangle(symbol.unique_id()),
        }
    }
}

/// State accumulated over the translation of one declaration.
#[derive(Debug, Default)]
pub struct TranslationContext {
    unique: usize,
    pub locals: Vec<String>,
}

impl TranslationContext {
    pub fn new() -> TranslationContext {
        TranslationContext {
            unique: 0,
            locals: Vec::new(),
        }
    }

    /// A fresh name for the value a continuation receives.
    pub fn next_result(&mut self) -> String {
        self.unique += 1;
        format!("$result_{}", self.unique)
    }

    /// Note a variable first assigned in this declaration. Declared once
    /// no matter how often it is assigned.
    pub fn declare_local(&mut self, name: &str) {
        if !self
            .locals
            .iter()
            .any(|local| local == name)
        {
            self.locals
                .push(name.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoweringError {
    /// A form was used where a value is needed but does not produce one.
    NotAValue(String),
    /// A form has no lowering in the position it appears in.
    Unsupported(String),
}

impl LoweringError {
    pub fn message(&self) -> String {
        match self {
            LoweringError::NotAValue(form) => format!("{} does not produce a value", form),
            LoweringError::Unsupported(form) => format!("{} cannot be translated here", form),
        }
    }
}

impl fmt::Display for LoweringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for LoweringError {}
