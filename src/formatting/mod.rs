//! Turning expression trees back into source text, optionally highlighted

mod formatter;
mod renderer;
mod syntax;

pub use formatter::format_expression;
pub use renderer::{render, render_fragments, Terminal};
pub use syntax::{Identity, Render, Syntax};
