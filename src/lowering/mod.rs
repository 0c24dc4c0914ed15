//! Translation of parsed programs into continuation passing declarations

use tracing::debug;

use crate::parsing::Program;

pub mod ast;
mod scope;
mod translate;

pub use scope::{mangle, LoweringError, TranslationContext, TranslationScope};
pub use translate::{continuation_lambda, seal, translate_block, Step, Translation};

/// Lower a whole program into a single declaration named `main`.
pub fn lower(program: &Program) -> Result<ast::Declaration, LoweringError> {
    let mut declaration = ast::Declaration::new("main", Vec::new());
    let scope = TranslationScope::new();
    let mut context = TranslationContext::new();

    let body = translate_block(
        program
            .statements
            .iter()
            .map(|statement| &statement.expression),
        &scope,
        &mut context,
        &declaration,
    )?;

    declaration.body = body;
    declaration.locals = context.locals;
    debug!(
        "Lowered {} statements with {} locals",
        program
            .statements
            .len(),
        declaration
            .locals
            .len()
    );

    Ok(declaration)
}
