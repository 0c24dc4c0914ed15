//! Translation of parsed expressions into the lowered form.
//!
//! Calls into user code become continuation passing: everything after such
//! a call is moved into a lambda handed to the callee. Translation of one
//! expression therefore yields a sequence of steps, some of which are
//! awaited calls, and the chain of continuations is only closed once the
//! whole block is known.

use tracing::trace;

use crate::language::{Expression, GrammarSymbol, SymbolKind, Target, TokenKind};
use crate::lowering::ast;
use crate::lowering::scope::{mangle, LoweringError, TranslationContext, TranslationScope};

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Statement(ast::Statement),
    /// A call whose result is only available inside `continuation`.
    Await {
        function: ast::Expression,
        arguments: Vec<ast::Expression>,
        continuation: ast::Lambda,
    },
}

/// The lowered form of one expression: steps which have to happen first,
/// and the value, if the expression has one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Translation {
    pub steps: Vec<Step>,
    pub value: Option<ast::Expression>,
}

/// A continuation for a call made from within `declaration`. It receives
/// the state and a fresh result variable; its body is filled in by `seal`.
pub fn continuation_lambda(context: &mut TranslationContext, declaration: &ast::Declaration) -> ast::Lambda {
    ast::Lambda {
        parameters: vec![
            declaration
                .state
                .clone(),
            context.next_result(),
        ],
        body: Vec::new(),
    }
}

/// Close the chain of continuations, working from the last step back, so
/// that each awaited call receives everything after it as its continuation
/// body. `tail` runs after the final step.
pub fn seal(steps: Vec<Step>, tail: Vec<ast::Statement>) -> Vec<ast::Statement> {
    steps
        .into_iter()
        .rev()
        .fold(tail, |rest, step| match step {
            Step::Statement(statement) => {
                let mut body = Vec::with_capacity(rest.len() + 1);
                body.push(statement);
                body.extend(rest);
                body
            }
            Step::Await {
                function,
                mut arguments,
                mut continuation,
            } => {
                let state = continuation
                    .parameters
                    .first()
                    .cloned()
                    .unwrap_or_default();
                continuation.body = rest;
                arguments.push(ast::Expression::Reference(state));
                arguments.push(ast::Expression::Lambda(continuation));
                vec![ast::Statement::Expression(ast::Expression::Invoke {
                    function: Box::new(function),
                    arguments,
                })]
            }
        })
}

/// Translate a sequence of statements into the body of `declaration`. The
/// body finishes by handing the declaration's result to its continuation.
pub fn translate_block<'a>(
    statements: impl IntoIterator<Item = &'a Expression>,
    scope: &TranslationScope,
    context: &mut TranslationContext,
    declaration: &ast::Declaration,
) -> Result<Vec<ast::Statement>, LoweringError> {
    let mut steps = Vec::new();

    for statement in statements {
        let translation = statement.translate(scope, context, declaration)?;
        steps.extend(translation.steps);
        if let Some(value) = translation.value {
            steps.push(Step::Statement(ast::Statement::Expression(value)));
        }
    }

    let finish = ast::Statement::Expression(ast::Expression::Invoke {
        function: Box::new(ast::Expression::reference(&declaration.continuation)),
        arguments: vec![
            ast::Expression::reference(&declaration.state),
            ast::Expression::reference(&declaration.result),
        ],
    });

    Ok(seal(steps, vec![finish]))
}

impl Expression {
    /// Lower this expression, as it appears inside `declaration`.
    pub fn translate(
        &self,
        scope: &TranslationScope,
        context: &mut TranslationContext,
        declaration: &ast::Declaration,
    ) -> Result<Translation, LoweringError> {
        let mut translator = Translator {
            scope,
            context,
            declaration,
            steps: Vec::new(),
        };
        let value = translator.expression(self)?;
        Ok(Translation {
            steps: translator.steps,
            value,
        })
    }
}

struct Translator<'a> {
    scope: &'a TranslationScope,
    context: &'a mut TranslationContext,
    declaration: &'a ast::Declaration,
    steps: Vec<Step>,
}

impl<'a> Translator<'a> {
    fn value(&mut self, expression: &Expression) -> Result<ast::Expression, LoweringError> {
        match self.expression(expression)? {
            Some(value) => Ok(value),
            None => Err(LoweringError::NotAValue(expression.to_log())),
        }
    }

    fn values(&mut self, expressions: &[Expression]) -> Result<Vec<ast::Expression>, LoweringError> {
        expressions
            .iter()
            .map(|expression| self.value(expression))
            .collect()
    }

    /// The elements of a `<list>` argument.
    fn elements(&mut self, expression: &Expression) -> Result<Vec<ast::Expression>, LoweringError> {
        match expression {
            Expression::List(elements) => self.values(elements),
            other => Ok(vec![self.value(other)?]),
        }
    }

    fn statement(&mut self, statement: ast::Statement) -> Option<ast::Expression> {
        self.steps
            .push(Step::Statement(statement));
        None
    }

    fn await_call(&mut self, function: ast::Expression, arguments: Vec<ast::Expression>) -> ast::Expression {
        let continuation = continuation_lambda(self.context, self.declaration);
        let result = continuation.parameters[1].clone();
        trace!("Awaiting {} into {}", function, result);

        self.steps
            .push(Step::Await {
                function,
                arguments,
                continuation,
            });
        ast::Expression::Reference(result)
    }

    fn expression(&mut self, expression: &Expression) -> Result<Option<ast::Expression>, LoweringError> {
        let value = match expression {
            Expression::Literal(token) => {
                let literal = match token.kind {
                    TokenKind::Integer => ast::Literal::Integer(token.value.clone()),
                    TokenKind::Float => ast::Literal::Float(token.value.clone()),
                    TokenKind::String => ast::Literal::String(token.value.clone()),
                    _ => return Err(LoweringError::Unsupported(token.to_string())),
                };
                ast::Expression::Literal(literal)
            }
            Expression::NewName { words, .. } => ast::Expression::Reference(mangle(&words.join(" "))),
            Expression::Reference(symbol) => self.reference(symbol)?,
            Expression::Invoke {
                function,
                arguments,
            } => {
                return match function.as_ref() {
                    Expression::Reference(symbol) => self.invoke(symbol, arguments),
                    other => {
                        let function = self.value(other)?;
                        let arguments = self.values(arguments)?;
                        Ok(Some(self.await_call(function, arguments)))
                    }
                };
            }
            Expression::List(elements) => ast::Expression::NewArray(self.values(elements)?),
            Expression::Unary { operator, operand } => ast::Expression::Unary {
                operator: *operator,
                operand: Box::new(self.value(operand)?),
            },
            Expression::Binary {
                operator,
                first,
                second,
            } => ast::Expression::Binary {
                operator: *operator,
                first: Box::new(self.value(first)?),
                second: Box::new(self.value(second)?),
            },
        };
        Ok(Some(value))
    }

    fn reference(&mut self, symbol: &GrammarSymbol) -> Result<ast::Expression, LoweringError> {
        if symbol.kind() == SymbolKind::Type {
            return Ok(ast::Expression::Type(mangle(symbol.unique_id())));
        }

        let value = match symbol.target() {
            Target::True => ast::Expression::Literal(ast::Literal::Boolean(true)),
            Target::False => ast::Expression::Literal(ast::Literal::Boolean(false)),
            Target::Null => ast::Expression::Literal(ast::Literal::Null),
            Target::TheResult => ast::Expression::reference(&self.declaration.result),
            Target::Custom => ast::Expression::Reference(self.scope.name_of(symbol)),
            _ => return Err(LoweringError::Unsupported(symbol.to_string())),
        };
        Ok(value)
    }

    /// The variable an `<assignable>` argument names. New names become
    /// locals of the declaration.
    fn assignable(&mut self, expression: &Expression) -> Result<String, LoweringError> {
        match expression {
            Expression::NewName { words, .. } => {
                let name = mangle(&words.join(" "));
                self.context
                    .declare_local(&name);
                Ok(name)
            }
            Expression::Reference(symbol) => match symbol.target() {
                Target::TheResult => Ok(self
                    .declaration
                    .result
                    .clone()),
                Target::Custom => Ok(self
                    .scope
                    .name_of(symbol)),
                _ => Err(LoweringError::Unsupported(expression.to_log())),
            },
            other => Err(LoweringError::Unsupported(other.to_log())),
        }
    }

    fn field_name(&self, expression: &Expression) -> Result<String, LoweringError> {
        match expression {
            Expression::NewName { words, .. } => Ok(mangle(&words.join(" "))),
            other => Err(LoweringError::Unsupported(other.to_log())),
        }
    }

    fn invoke(
        &mut self,
        symbol: &GrammarSymbol,
        arguments: &[Expression],
    ) -> Result<Option<ast::Expression>, LoweringError> {
        let argument = |index: usize| {
            arguments
                .get(index)
                .ok_or_else(|| LoweringError::Unsupported(symbol.to_string()))
        };

        let value = match symbol.target() {
            Target::Custom => {
                let values = self.values(arguments)?;
                let function = ast::Expression::Reference(
                    self.scope
                        .name_of(symbol),
                );
                let result = self.await_call(function, values);
                match symbol.kind() {
                    SymbolKind::Phrase => Some(result),
                    _ => None,
                }
            }
            Target::Invoke => {
                let function = self.value(argument(0)?)?;
                let values = self.elements(argument(1)?)?;
                Some(self.await_call(function, values))
            }
            Target::InvokeContinuation => {
                let function = self.value(argument(0)?)?;
                let packed = ast::Expression::NewArray(self.elements(argument(1)?)?);
                Some(self.await_call(function, vec![packed]))
            }
            Target::NewTypeOfFields => Some(ast::Expression::NewObject {
                type_: Box::new(self.value(argument(0)?)?),
                fields: self.elements(argument(1)?)?,
            }),
            Target::NewArray => Some(ast::Expression::NewArrayOfLength(Box::new(
                self.value(argument(0)?)?,
            ))),
            Target::GetArrayItem => {
                let index = self.value(argument(0)?)?;
                let array = self.value(argument(1)?)?;
                Some(ast::Expression::ArrayItem {
                    array: Box::new(array),
                    index: Box::new(index),
                })
            }
            Target::GetArrayLength => Some(ast::Expression::ArrayLength(Box::new(
                self.value(argument(0)?)?,
            ))),
            Target::IsType | Target::IsNotType => Some(ast::Expression::IsType {
                value: Box::new(self.value(argument(0)?)?),
                type_: Box::new(self.value(argument(1)?)?),
                negated: symbol.target() == Target::IsNotType,
            }),
            Target::GetField => {
                let name = self.field_name(argument(0)?)?;
                Some(ast::Expression::Field {
                    target: Box::new(self.value(argument(1)?)?),
                    name,
                })
            }
            Target::End => self.statement(ast::Statement::End),
            Target::Select => {
                let value = self.value(argument(0)?)?;
                self.statement(ast::Statement::Select(value))
            }
            Target::Case => {
                let value = self.value(argument(0)?)?;
                self.statement(ast::Statement::Case(value))
            }
            Target::CaseElse => self.statement(ast::Statement::CaseElse),
            Target::RedirectTo => {
                let function = self.value(argument(0)?)?;
                let forwarded = self
                    .declaration
                    .parameters
                    .iter()
                    .map(ast::Expression::reference)
                    .collect();
                self.await_call(function, forwarded);
                None
            }
            Target::Assign => {
                let value = self.value(argument(1)?)?;
                let name = self.assignable(argument(0)?)?;
                self.statement(ast::Statement::Assign { name, value })
            }
            Target::SetArrayItem => {
                let index = self.value(argument(0)?)?;
                let array = self.value(argument(1)?)?;
                let value = self.value(argument(2)?)?;
                self.statement(ast::Statement::SetArrayItem {
                    array,
                    index,
                    value,
                })
            }
            Target::SetField => {
                let name = self.field_name(argument(0)?)?;
                let target = self.value(argument(1)?)?;
                let value = self.value(argument(2)?)?;
                self.statement(ast::Statement::SetField {
                    target,
                    name,
                    value,
                })
            }
            _ => return Err(LoweringError::Unsupported(symbol.to_string())),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::language::{FragmentKind, GrammarSymbol};
    use crate::lexing::tokenize;
    use crate::parsing::{Parser, SymbolTable};
    use ast::{Declaration, Lambda, Literal, Statement};

    fn statement(table: &SymbolTable, source: &str) -> Expression {
        let tokens = tokenize(source).unwrap();
        let parser = Parser::new(&tokens, table);
        let mut found = parser
            .parse_statement(0)
            .unwrap();
        assert_eq!(found.len(), 1, "{}", source);
        found
            .remove(0)
            .1
    }

    fn integer(value: &str) -> ast::Expression {
        ast::Expression::Literal(Literal::Integer(value.to_string()))
    }

    fn finish() -> Statement {
        Statement::Expression(ast::Expression::Invoke {
            function: Box::new(ast::Expression::reference("$continuation")),
            arguments: vec![
                ast::Expression::reference("$state"),
                ast::Expression::reference("$the_result"),
            ],
        })
    }

    #[test]
    fn assignment_hoists_locals() {
        let table = SymbolTable::new();
        let parsed = statement(&table, "set x to 1 + 2");

        let declaration = Declaration::new("main", Vec::new());
        let mut context = TranslationContext::new();
        let body = translate_block([&parsed], &TranslationScope::new(), &mut context, &declaration).unwrap();

        assert_eq!(context.locals, vec!["x"]);
        assert_eq!(
            body,
            vec![
                Statement::Assign {
                    name: "x".to_string(),
                    value: ast::Expression::Binary {
                        operator: crate::language::BinaryOperator::Add,
                        first: Box::new(integer("1")),
                        second: Box::new(integer("2")),
                    },
                },
                finish(),
            ]
        );
    }

    #[test]
    fn the_result_is_the_declarations() {
        let table = SymbolTable::new();
        let parsed = statement(&table, "set the result to true");

        let declaration = Declaration::new("main", Vec::new());
        let mut context = TranslationContext::new();
        let translation = parsed
            .translate(&TranslationScope::new(), &mut context, &declaration)
            .unwrap();

        assert!(context
            .locals
            .is_empty());
        assert_eq!(translation.value, None);
        assert_eq!(
            translation.steps,
            vec![Step::Statement(Statement::Assign {
                name: "$the_result".to_string(),
                value: ast::Expression::Literal(Literal::Boolean(true)),
            })]
        );
    }

    #[test]
    fn phrases_become_continuations() {
        let mut table = SymbolTable::new();
        table.register(
            GrammarSymbol::builder(SymbolKind::Phrase, Target::Custom)
                .keyword("square")
                .keyword("of")
                .placeholder(FragmentKind::Primitive)
                .build(),
        );
        let parsed = statement(&table, "set y to square of 3");

        let declaration = Declaration::new("main", Vec::new());
        let mut context = TranslationContext::new();
        let mut scope = TranslationScope::new();
        scope.bind("square of <primitive>", "square");

        let body = translate_block([&parsed], &scope, &mut context, &declaration).unwrap();

        assert_eq!(
            body,
            vec![Statement::Expression(ast::Expression::Invoke {
                function: Box::new(ast::Expression::reference("square")),
                arguments: vec![
                    integer("3"),
                    ast::Expression::reference("$state"),
                    ast::Expression::Lambda(Lambda {
                        parameters: vec!["$state".to_string(), "$result_1".to_string()],
                        body: vec![
                            Statement::Assign {
                                name: "y".to_string(),
                                value: ast::Expression::reference("$result_1"),
                            },
                            finish(),
                        ],
                    }),
                ],
            })]
        );
    }

    #[test]
    fn continuations_pack_their_arguments() {
        let mut table = SymbolTable::new();
        table.register(GrammarSymbol::variable(&["k"]));
        let parsed = statement(&table, "set r to continuation k of (1, 2)");

        let declaration = Declaration::new("main", Vec::new());
        let mut context = TranslationContext::new();
        let translation = parsed
            .translate(&TranslationScope::new(), &mut context, &declaration)
            .unwrap();

        match &translation.steps[0] {
            Step::Await {
                function,
                arguments,
                continuation,
            } => {
                assert_eq!(*function, ast::Expression::reference("k"));
                assert_eq!(
                    *arguments,
                    vec![ast::Expression::NewArray(vec![integer("1"), integer("2")])]
                );
                assert_eq!(continuation.parameters[1], "$result_1");
                assert!(continuation
                    .body
                    .is_empty());
            }
            other => panic!("expected an awaited call, not {:?}", other),
        }
    }

    #[test]
    fn redirect_forwards_parameters() {
        let mut table = SymbolTable::new();
        table.register(GrammarSymbol::variable(&["other"]));
        let parsed = statement(&table, "redirect to other");

        let declaration = Declaration::new("forward", vec!["a".to_string(), "b".to_string()]);
        let mut context = TranslationContext::new();
        let translation = parsed
            .translate(&TranslationScope::new(), &mut context, &declaration)
            .unwrap();

        match &translation.steps[..] {
            [Step::Await { arguments, .. }] => assert_eq!(
                *arguments,
                vec![ast::Expression::reference("a"), ast::Expression::reference("b")]
            ),
            other => panic!("expected one awaited call, not {:?}", other),
        }
    }

    #[test]
    fn builtin_primitives() {
        let mut table = SymbolTable::new();
        table.register(GrammarSymbol::variable(&["a"]));

        let parsed = statement(&table, "set v to item 1 of array a");
        let declaration = Declaration::new("main", Vec::new());
        let mut context = TranslationContext::new();
        let translation = parsed
            .translate(&TranslationScope::new(), &mut context, &declaration)
            .unwrap();
        assert_eq!(
            translation.steps,
            vec![Step::Statement(Statement::Assign {
                name: "v".to_string(),
                value: ast::Expression::ArrayItem {
                    array: Box::new(ast::Expression::reference("a")),
                    index: Box::new(integer("1")),
                },
            })]
        );

        let parsed = statement(&table, "set field size of a to a is not integer");
        let translation = parsed
            .translate(&TranslationScope::new(), &mut context, &declaration)
            .unwrap();
        assert_eq!(
            translation.steps,
            vec![Step::Statement(Statement::SetField {
                target: ast::Expression::reference("a"),
                name: "size".to_string(),
                value: ast::Expression::IsType {
                    value: Box::new(ast::Expression::reference("a")),
                    type_: Box::new(ast::Expression::Type("integer".to_string())),
                    negated: true,
                },
            })]
        );
    }

    #[test]
    fn markers_stay_flat() {
        let mut table = SymbolTable::new();
        table.register(GrammarSymbol::variable(&["x"]));

        let parsed: Vec<Expression> = ["select x", "case 1", "case else", "end"]
            .iter()
            .map(|source| statement(&table, source))
            .collect();

        let declaration = Declaration::new("main", Vec::new());
        let mut context = TranslationContext::new();
        let body = translate_block(&parsed, &TranslationScope::new(), &mut context, &declaration).unwrap();

        assert_eq!(
            body,
            vec![
                Statement::Select(ast::Expression::reference("x")),
                Statement::Case(integer("1")),
                Statement::CaseElse,
                Statement::End,
                finish(),
            ]
        );
    }

    #[test]
    fn sealing_nests_in_order() {
        let declaration = Declaration::new("main", Vec::new());
        let mut context = TranslationContext::new();

        let first = continuation_lambda(&mut context, &declaration);
        let second = continuation_lambda(&mut context, &declaration);
        let steps = vec![
            Step::Await {
                function: ast::Expression::reference("f"),
                arguments: Vec::new(),
                continuation: first,
            },
            Step::Statement(Statement::End),
            Step::Await {
                function: ast::Expression::reference("g"),
                arguments: Vec::new(),
                continuation: second,
            },
        ];

        let sealed = seal(steps, vec![Statement::CaseElse]);
        assert_eq!(
            sealed
                .iter()
                .map(|statement| statement.to_string())
                .collect::<Vec<_>>(),
            vec![
                "f($state, function ($state, $result_1)\n    end\n    g($state, function ($state, $result_2)\n        case else\n    end)\nend)"
            ]
        );
    }

    #[test]
    fn sentences_are_not_values() {
        let table = SymbolTable::new();
        let parsed = statement(&table, "end");

        let declaration = Declaration::new("main", Vec::new());
        let mut context = TranslationContext::new();
        let mut translator = Translator {
            scope: &TranslationScope::new(),
            context: &mut context,
            declaration: &declaration,
            steps: Vec::new(),
        };
        assert_eq!(
            translator.value(&parsed),
            Err(LoweringError::NotAValue("[end]()".to_string()))
        );
    }
}
