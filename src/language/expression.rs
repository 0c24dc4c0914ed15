//! Expression trees produced by the parser

use serde::Serialize;
use std::rc::Rc;

use crate::formatting::{render, Identity};
use crate::language::{FragmentKind, GrammarSymbol, Target, Token};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    Positive,
    Negative,
    Not,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Positive => "+",
            UnaryOperator::Negative => "-",
            UnaryOperator::Not => "not",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum BinaryOperator {
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    LT,
    GT,
    LE,
    GE,
    EQ,
    NE,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Concat => "&",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::IntDiv => "\\",
            BinaryOperator::Mod => "%",
            BinaryOperator::LT => "<",
            BinaryOperator::GT => ">",
            BinaryOperator::LE => "<=",
            BinaryOperator::GE => ">=",
            BinaryOperator::EQ => "=",
            BinaryOperator::NE => "<>",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }

    /// Binding strength, tightest first. Operators within a tier associate
    /// to the left.
    pub fn tier(&self) -> u8 {
        match self {
            BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::IntDiv
            | BinaryOperator::Mod => 1,
            BinaryOperator::Add | BinaryOperator::Sub => 2,
            BinaryOperator::Concat => 3,
            BinaryOperator::LT
            | BinaryOperator::GT
            | BinaryOperator::LE
            | BinaryOperator::GE
            | BinaryOperator::EQ
            | BinaryOperator::NE => 4,
            BinaryOperator::And => 5,
            BinaryOperator::Or => 6,
        }
    }
}

/// Whether a freshly introduced name came from an assignable slot (and so
/// might have referred to something existing) or from an argument slot
/// (and so always shadows).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NameRole {
    Assignable,
    Argument,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Token),
    NewName {
        words: Vec<String>,
        role: NameRole,
    },
    Reference(Rc<GrammarSymbol>),
    Invoke {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    List(Vec<Expression>),
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        first: Box<Expression>,
        second: Box<Expression>,
    },
}

impl Expression {
    pub fn invoke(symbol: Rc<GrammarSymbol>, arguments: Vec<Expression>) -> Expression {
        Expression::Invoke {
            function: Box::new(Expression::Reference(symbol)),
            arguments,
        }
    }

    pub fn unary(operator: UnaryOperator, operand: Expression) -> Expression {
        Expression::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(operator: BinaryOperator, first: Expression, second: Expression) -> Expression {
        Expression::Binary {
            operator,
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    /// The symbol a Reference points at, or that an Invoke calls.
    pub fn symbol(&self) -> Option<&Rc<GrammarSymbol>> {
        match self {
            Expression::Reference(symbol) => Some(symbol),
            Expression::Invoke { function, .. } => match function.as_ref() {
                Expression::Reference(symbol) => Some(symbol),
                _ => None,
            },
            _ => None,
        }
    }

    /// The arguments of an invocation which sit in `<assignable>` slots.
    pub fn assignable_arguments(&self) -> Vec<&Expression> {
        match self {
            Expression::Invoke { arguments, .. } => match self.symbol() {
                Some(symbol) => symbol
                    .placeholders()
                    .zip(arguments.iter())
                    .filter(|(fragment, _)| fragment.kind() == FragmentKind::Assignable)
                    .map(|(_, argument)| argument)
                    .collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Debugging dump. Not meant to be parsed back.
    pub fn to_log(&self) -> String {
        match self {
            Expression::Literal(token) => token.to_string(),
            Expression::NewName { words, .. } => format!("$({})", words.join(" ")),
            Expression::Reference(symbol) => format!("[{}]", symbol.unique_id()),
            Expression::Invoke {
                function,
                arguments,
            } => {
                let arguments: Vec<String> = arguments
                    .iter()
                    .map(Expression::to_log)
                    .collect();
                format!("{}({})", function.to_log(), arguments.join(", "))
            }
            Expression::List(elements) => {
                let elements: Vec<String> = elements
                    .iter()
                    .map(Expression::to_log)
                    .collect();
                format!("{{{}}}", elements.join(", "))
            }
            Expression::Unary { operator, operand } => {
                format!("({} {})", operator.symbol(), operand.to_log())
            }
            Expression::Binary {
                operator,
                first,
                second,
            } => format!(
                "({} {} {})",
                first.to_log(),
                operator.symbol(),
                second.to_log()
            ),
        }
    }

    /// Source text which parses back to this expression.
    pub fn to_code(&self) -> String {
        render(&Identity, self)
    }

    /// Gather the names this expression introduces or assigns to:
    /// `assignables` receives new names from assignable slots, `arguments`
    /// new names from argument slots, and `modified` existing names that
    /// sit in assignable slots.
    pub fn collect_new_assignables<'a>(
        &'a self,
        assignables: &mut Vec<&'a Expression>,
        arguments: &mut Vec<&'a Expression>,
        modified: &mut Vec<&'a Expression>,
    ) {
        match self {
            Expression::Literal(_) | Expression::Reference(_) => {}
            Expression::NewName { role, .. } => match role {
                NameRole::Assignable => assignables.push(self),
                NameRole::Argument => arguments.push(self),
            },
            Expression::Invoke {
                arguments: values, ..
            } => {
                let symbol = self.symbol();
                let slots: Vec<FragmentKind> = match symbol {
                    Some(symbol) => symbol
                        .placeholders()
                        .map(|fragment| fragment.kind())
                        .collect(),
                    None => Vec::new(),
                };
                let names_field = matches!(
                    symbol.map(|symbol| symbol.target()),
                    Some(Target::GetField) | Some(Target::SetField)
                );

                for (index, value) in values
                    .iter()
                    .enumerate()
                {
                    // the <argument> of a field access names a field, not a binding
                    if names_field && index == 0 {
                        continue;
                    }
                    if slots.get(index) == Some(&FragmentKind::Assignable) {
                        if let Expression::Reference(_) = value {
                            modified.push(value);
                            continue;
                        }
                    }
                    value.collect_new_assignables(assignables, arguments, modified);
                }
            }
            Expression::List(elements) => {
                for element in elements {
                    element.collect_new_assignables(assignables, arguments, modified);
                }
            }
            Expression::Unary { operand, .. } => {
                operand.collect_new_assignables(assignables, arguments, modified);
            }
            Expression::Binary { first, second, .. } => {
                first.collect_new_assignables(assignables, arguments, modified);
                second.collect_new_assignables(assignables, arguments, modified);
            }
        }
    }
}

/// Structural equality. Source positions are not compared, and two
/// references are equal if they point at the same symbol or at symbols of
/// the same shape and meaning.
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expression::Literal(one), Expression::Literal(two)) => one.same_lexeme(two),
            (
                Expression::NewName { words, role },
                Expression::NewName {
                    words: words2,
                    role: role2,
                },
            ) => words == words2 && role == role2,
            (Expression::Reference(one), Expression::Reference(two)) => {
                Rc::ptr_eq(one, two)
                    || (one.unique_id() == two.unique_id()
                        && one.target() == two.target()
                        && one.kind() == two.kind())
            }
            (
                Expression::Invoke {
                    function,
                    arguments,
                },
                Expression::Invoke {
                    function: function2,
                    arguments: arguments2,
                },
            ) => function == function2 && arguments == arguments2,
            (Expression::List(one), Expression::List(two)) => one == two,
            (
                Expression::Unary { operator, operand },
                Expression::Unary {
                    operator: operator2,
                    operand: operand2,
                },
            ) => operator == operator2 && operand == operand2,
            (
                Expression::Binary {
                    operator,
                    first,
                    second,
                },
                Expression::Binary {
                    operator: operator2,
                    first: first2,
                    second: second2,
                },
            ) => operator == operator2 && first == first2 && second == second2,
            _ => false,
        }
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::language::{Position, SymbolKind, TokenKind};

    fn number(value: &str) -> Expression {
        Expression::Literal(Token::new(TokenKind::Integer, value, Position::default()))
    }

    fn name(words: &[&str], role: NameRole) -> Expression {
        Expression::NewName {
            words: words
                .iter()
                .map(|word| word.to_string())
                .collect(),
            role,
        }
    }

    fn assign() -> Rc<GrammarSymbol> {
        Rc::new(
            GrammarSymbol::builder(SymbolKind::Sentence, Target::Assign)
                .keyword("set")
                .placeholder(FragmentKind::Assignable)
                .keyword("to")
                .placeholder(FragmentKind::Expression)
                .build(),
        )
    }

    #[test]
    fn log_text() {
        let expression = Expression::binary(
            BinaryOperator::Add,
            number("1"),
            Expression::unary(UnaryOperator::Negative, number("2")),
        );
        assert_eq!(expression.to_log(), "(1 + (- 2))");

        let statement = Expression::invoke(
            assign(),
            vec![name(&["x"], NameRole::Assignable), number("3")],
        );
        assert_eq!(
            statement.to_log(),
            "[set <assignable> to <expression>]($(x), 3)"
        );
    }

    #[test]
    fn equality_ignores_positions() {
        let here = number("1");
        let there = Expression::Literal(Token::new(
            TokenKind::Integer,
            "1",
            Position {
                offset: 5,
                row: 1,
                column: 2,
            },
        ));
        assert_eq!(here, there);
        assert_ne!(here, number("2"));
    }

    #[test]
    fn collecting_new_names() {
        let statement = Expression::invoke(
            assign(),
            vec![
                name(&["x"], NameRole::Assignable),
                Expression::binary(BinaryOperator::Add, number("1"), number("2")),
            ],
        );

        let mut assignables = Vec::new();
        let mut arguments = Vec::new();
        let mut modified = Vec::new();
        statement.collect_new_assignables(&mut assignables, &mut arguments, &mut modified);

        assert_eq!(assignables, vec![&name(&["x"], NameRole::Assignable)]);
        assert!(arguments.is_empty());
        assert!(modified.is_empty());
    }

    #[test]
    fn collecting_modified_names() {
        let x = Rc::new(GrammarSymbol::variable(&["x"]));
        let statement = Expression::invoke(
            assign(),
            vec![Expression::Reference(x.clone()), number("2")],
        );

        let mut assignables = Vec::new();
        let mut arguments = Vec::new();
        let mut modified = Vec::new();
        statement.collect_new_assignables(&mut assignables, &mut arguments, &mut modified);

        assert!(assignables.is_empty());
        assert_eq!(modified, vec![&Expression::Reference(x)]);
    }

    #[test]
    fn field_names_are_not_bindings() {
        let set_field = Rc::new(
            GrammarSymbol::builder(SymbolKind::Sentence, Target::SetField)
                .keyword("set")
                .keyword("field")
                .placeholder(FragmentKind::Argument)
                .keyword("of")
                .placeholder(FragmentKind::Expression)
                .keyword("to")
                .placeholder(FragmentKind::Expression)
                .build(),
        );
        let statement = Expression::invoke(
            set_field,
            vec![
                name(&["name"], NameRole::Argument),
                number("1"),
                number("2"),
            ],
        );

        let mut assignables = Vec::new();
        let mut arguments = Vec::new();
        let mut modified = Vec::new();
        statement.collect_new_assignables(&mut assignables, &mut arguments, &mut modified);

        assert!(assignables.is_empty());
        assert!(arguments.is_empty());
        assert!(modified.is_empty());
    }

    #[test]
    fn arguments_nested_in_lists() {
        let list = Expression::List(vec![
            name(&["the", "item"], NameRole::Argument),
            number("4"),
        ]);

        let mut assignables = Vec::new();
        let mut arguments = Vec::new();
        let mut modified = Vec::new();
        list.collect_new_assignables(&mut assignables, &mut arguments, &mut modified);

        assert_eq!(arguments.len(), 1);
        assert_eq!(arguments[0].to_log(), "$(the item)");
    }
}
