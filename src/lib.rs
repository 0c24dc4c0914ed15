//! Tinymoe: the grammar engine of a language whose syntax is extended by
//! the programs written in it.

#[macro_use]
mod regex;

pub mod formatting;
pub mod language;
pub mod lexing;
pub mod lowering;
pub mod parsing;
pub mod problem;
