use crate::formatting::{Render, Syntax};
use crate::lexing::LexingError;
use crate::parsing::{ParsingError, SourceError};

/// Generate problem and detail messages for errors found reading a program
pub fn generate_error_message(error: &SourceError, renderer: &impl Render) -> (String, String) {
    match error {
        SourceError::Lexing(LexingError::InvalidCharacter(_, c)) => (
            format!("Invalid character '{}'", c),
            r#"
Programs are written with words, numbers, string literals, brackets,
commas, colons, and the operators + - * / \ % & < > <= >= = <>.
            "#
            .trim_ascii()
            .to_string(),
        ),
        SourceError::Lexing(LexingError::UnclosedString(_)) => {
            let example = renderer.style(Syntax::String, r#""say \"hello\"""#);
            (
                "Unclosed string literal".to_string(),
                format!(
                    "A string literal must end with '\"' on the same line it began. Quotes\ninside a string are written with a backslash, as in {}.",
                    example
                ),
            )
        }
        SourceError::Parsing { error, .. } => parsing_message(error, renderer),
    }
}

fn parsing_message(error: &ParsingError, renderer: &impl Render) -> (String, String) {
    let expected: Vec<&str> = error
        .failures()
        .into_iter()
        .filter_map(|failure| match failure {
            ParsingError::NoMatch { expected, .. } => Some(expected.as_str()),
            ParsingError::Aggregate(_) => None,
        })
        .collect();

    match expected[..] {
        [] => (
            "Unrecognized statement".to_string(),
            "None of the statements in scope match this line.".to_string(),
        ),
        ["a block to end"] => (
            "Nothing to end".to_string(),
            format!(
                "Each {} closes the block opened by an earlier statement such as {}.",
                renderer.style(Syntax::Keyword, "end"),
                renderer.style(Syntax::Keyword, "select")
            ),
        ),
        [single] => (
            format!("Expected {}", single),
            format!(
                "The parser was looking for {} but found something else.",
                single
            ),
        ),
        _ => {
            let mut details = String::from(
                "Several forms in scope could continue from here. The furthest any of\nthem got was this point, where they were looking for one of:\n",
            );
            for item in &expected {
                details.push_str("\n    ");
                details.push_str(item);
            }
            ("Unexpected input".to_string(), details)
        }
    }
}
