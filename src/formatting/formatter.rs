//! Code formatter turning expression trees back into Tinymoe source

use crate::formatting::Syntax;
use crate::language::{Expression, FragmentKind, GrammarSymbol, SymbolKind, Target, TokenKind};

/// Pass 1: convert an expression into tagged fragments. Brackets are put
/// back wherever the text would otherwise read as a different tree.
pub fn format_expression(expression: &Expression) -> Vec<(Syntax, String)> {
    let mut output = Formatter::new();
    output.append_expression(expression);
    output.fragments
}

struct Formatter {
    fragments: Vec<(Syntax, String)>,
}

impl Formatter {
    fn new() -> Formatter {
        Formatter {
            fragments: Vec::new(),
        }
    }

    fn append(&mut self, syntax: Syntax, content: &str) {
        self.fragments
            .push((syntax, content.to_string()));
    }

    fn append_space(&mut self) {
        self.append(Syntax::Neutral, " ");
    }

    fn append_bracketed(&mut self, expression: &Expression, brackets: bool) {
        if brackets {
            self.append(Syntax::Structure, "(");
            self.append_expression(expression);
            self.append(Syntax::Structure, ")");
        } else {
            self.append_expression(expression);
        }
    }

    fn append_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Literal(token) => {
                let syntax = match token.kind {
                    TokenKind::String => Syntax::String,
                    TokenKind::Integer | TokenKind::Float => Syntax::Numeric,
                    _ => Syntax::Neutral,
                };
                self.append(syntax, &token.to_string());
            }
            Expression::NewName { words, .. } => {
                self.append(Syntax::Variable, &words.join(" "));
            }
            Expression::Reference(symbol) => self.append_reference(symbol),
            Expression::Invoke {
                function,
                arguments,
            } => match function.as_ref() {
                Expression::Reference(symbol) => self.append_invocation(symbol, arguments),
                other => {
                    // not something the parser makes; written as a call
                    self.append_bracketed(other, true);
                    self.append_space();
                    self.append(Syntax::Keyword, "of");
                    self.append_space();
                    self.append_list(arguments);
                }
            },
            Expression::List(elements) => self.append_list(elements),
            Expression::Unary { operator, operand } => {
                self.append(Syntax::Operator, operator.symbol());
                if operator.symbol() == "not" {
                    self.append_space();
                }
                let atomic = matches!(
                    operand.as_ref(),
                    Expression::Literal(_)
                        | Expression::NewName { .. }
                        | Expression::Reference(_)
                        | Expression::List(_)
                );
                self.append_bracketed(operand, !atomic);
            }
            Expression::Binary {
                operator,
                first,
                second,
            } => {
                let tier = operator.tier();
                let left = match first.as_ref() {
                    Expression::Binary { operator, .. } => operator.tier() > tier,
                    other => ends_with_expression(other),
                };
                let right = match second.as_ref() {
                    Expression::Binary { operator, .. } => operator.tier() >= tier,
                    other => ends_with_expression(other),
                };

                self.append_bracketed(first, left);
                self.append_space();
                self.append(Syntax::Operator, operator.symbol());
                self.append_space();
                self.append_bracketed(second, right);
            }
        }
    }

    fn append_reference(&mut self, symbol: &GrammarSymbol) {
        let syntax = match (symbol.kind(), symbol.target()) {
            (SymbolKind::Type, _) => Syntax::Type,
            (_, Target::Custom) => Syntax::Variable,
            _ => Syntax::Keyword,
        };

        let words: Vec<&str> = symbol
            .fragments()
            .iter()
            .filter(|fragment| !fragment.is_placeholder())
            .map(|fragment| fragment.spelling())
            .collect();
        self.append(syntax, &words.join(" "));
    }

    fn append_invocation(&mut self, symbol: &GrammarSymbol, arguments: &[Expression]) {
        let fragments = symbol.fragments();
        let mut index = 0;

        for (i, fragment) in fragments
            .iter()
            .enumerate()
        {
            if i > 0 {
                self.append_space();
            }

            if !fragment.is_placeholder() {
                self.append(Syntax::Keyword, fragment.spelling());
                continue;
            }

            if let Some(argument) = arguments.get(index) {
                let extended = i == 0 && symbol.is_left_recursive();
                let last = i + 1 == fragments.len();
                let brackets = needs_brackets(fragment.kind(), extended, last, argument);
                self.append_bracketed(argument, brackets);
            }
            index += 1;
        }
    }

    fn append_list(&mut self, elements: &[Expression]) {
        self.append(Syntax::Structure, "(");
        for (i, element) in elements
            .iter()
            .enumerate()
        {
            if i > 0 {
                self.append(Syntax::Structure, ",");
                self.append_space();
            }
            self.append_expression(element);
        }
        self.append(Syntax::Structure, ")");
    }
}

/// The kind of the trailing placeholder of an invocation, if it ends in one.
fn trailing_slot(expression: &Expression) -> Option<FragmentKind> {
    match expression {
        Expression::Invoke { .. } => expression
            .symbol()
            .and_then(|symbol| {
                symbol
                    .fragments()
                    .last()
            })
            .filter(|fragment| fragment.is_placeholder())
            .map(|fragment| fragment.kind()),
        _ => None,
    }
}

/// An invocation ending in an expression would swallow whatever operator
/// follows it. That includes one whose trailing slot holds, unbracketed,
/// another invocation ending in an expression.
fn ends_with_expression(expression: &Expression) -> bool {
    let arguments = match expression {
        Expression::Invoke { arguments, .. } => arguments,
        _ => return false,
    };
    match trailing_slot(expression) {
        Some(FragmentKind::Expression) => true,
        Some(slot) => match arguments.last() {
            Some(argument) => {
                !needs_brackets(slot, false, true, argument) && ends_with_expression(argument)
            }
            None => false,
        },
        None => false,
    }
}

/// Whether an argument has to be bracketed to be read back in the given
/// placeholder. `extended` is the leading slot of a phrase which continues
/// an already parsed primitive; `last` is the final fragment of its symbol.
fn needs_brackets(slot: FragmentKind, extended: bool, last: bool, argument: &Expression) -> bool {
    match argument {
        Expression::Binary { .. } => !(last && slot == FragmentKind::Expression),
        Expression::Unary { .. } => extended,
        Expression::Invoke { .. } => {
            if extended {
                matches!(
                    trailing_slot(argument),
                    Some(FragmentKind::Primitive)
                        | Some(FragmentKind::Expression)
                        | Some(FragmentKind::Assignable)
                        | Some(FragmentKind::Argument)
                )
            } else if last {
                slot != FragmentKind::Expression && ends_with_expression(argument)
            } else {
                true
            }
        }
        _ => false,
    }
}
