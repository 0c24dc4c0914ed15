//! Renderers for colourizing Tinymoe source

use owo_colors::OwoColorize;

use crate::formatting::formatter::format_expression;
use crate::formatting::{Render, Syntax};
use crate::language::Expression;

/// Embellish fragments with ANSI escapes to create syntax highlighting in
/// terminal output.
pub struct Terminal;

impl Render for Terminal {
    fn style(&self, syntax: Syntax, content: &str) -> String {
        match syntax {
            Syntax::Neutral => content.to_string(),
            Syntax::Keyword => content // keyword.control - #3465a4 (blue) bold
                .color(owo_colors::Rgb(52, 101, 164))
                .bold()
                .to_string(),
            Syntax::Type => content // entity.name.type - #8f5902 (brown) bold
                .color(owo_colors::Rgb(143, 89, 2))
                .bold()
                .to_string(),
            Syntax::Variable => content // variable.parameter - #729fcf (light blue) bold
                .color(owo_colors::Rgb(114, 159, 207))
                .bold()
                .to_string(),
            Syntax::Numeric => content // constant.numeric - #ad7fa8 (purple) bold
                .color(owo_colors::Rgb(173, 127, 168))
                .bold()
                .to_string(),
            Syntax::String => content // string - #4e9a06 (green) bold
                .color(owo_colors::Rgb(78, 154, 6))
                .bold()
                .to_string(),
            Syntax::Operator => content // keyword.operator - #cc0000 (red) bold
                .color(owo_colors::Rgb(204, 0, 0))
                .bold()
                .to_string(),
            Syntax::Structure => content // punctuation - #999999 (grey)
                .color(owo_colors::Rgb(153, 153, 153))
                .to_string(),
        }
    }
}

/// We do the rendering in two passes. First we convert the expression tree
/// into a Vec of "fragments" (Syntax tag, String pairs). Then second we
/// apply the specified renderer to each pair to result in an embellished or
/// plain String.
pub fn render(renderer: &impl Render, expression: &Expression) -> String {
    let fragments = format_expression(expression);
    render_fragments(renderer, &fragments)
}

/// Pass 2: apply markup to fragments and combine.
pub fn render_fragments(renderer: &impl Render, fragments: &[(Syntax, String)]) -> String {
    let mut output = String::new();

    for (syntax, content) in fragments {
        let styled = renderer.style(*syntax, content);
        output.push_str(&styled);
    }

    output
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::formatting::Identity;

    #[test]
    fn identity_concatenates() {
        let fragments = vec![
            (Syntax::Keyword, "set".to_string()),
            (Syntax::Neutral, " ".to_string()),
            (Syntax::Variable, "x".to_string()),
        ];
        assert_eq!(render_fragments(&Identity, &fragments), "set x");
    }

    #[test]
    fn terminal_keeps_neutral_content() {
        assert_eq!(Render::style(&Terminal, Syntax::Neutral, " "), " ");

        let styled = Render::style(&Terminal, Syntax::Keyword, "end");
        assert!(styled.contains("end"));
        assert!(styled.starts_with('\u{1b}'));
    }
}
