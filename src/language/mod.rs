// Types representing the Tinymoe grammar and the expressions parsed with it

mod error;
mod expression;
mod grammar;
mod token;

// Re-export all public symbols
pub use error::*;
pub use expression::*;
pub use grammar::*;
pub use token::*;
