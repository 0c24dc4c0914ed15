//! The backtracking parser. Every parse function returns all the ways the
//! input starting at a given token can be read, each tagged with the token
//! position just past what it consumed.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

use crate::language::{
    BinaryOperator, Expression, Fragment, FragmentKind, GrammarSymbol, NameRole, SymbolKind,
    Token, TokenKind, UnaryOperator,
};
use crate::parsing::chain::Chain;
use crate::parsing::error::{fold_into, ParsingError};
use crate::parsing::scope::SymbolTable;

/// Candidate readings of the input, or why there are none. An `Ok` vector
/// is never empty.
pub type Candidates = Result<Vec<(usize, Expression)>, ParsingError>;

type Tier<'i> = fn(&Parser<'i>, usize) -> Candidates;

const MULTIPLICATIVE: &[(TokenKind, BinaryOperator)] = &[
    (TokenKind::Mul, BinaryOperator::Mul),
    (TokenKind::Div, BinaryOperator::Div),
    (TokenKind::IntDiv, BinaryOperator::IntDiv),
    (TokenKind::Mod, BinaryOperator::Mod),
];

const ADDITIVE: &[(TokenKind, BinaryOperator)] = &[
    (TokenKind::Add, BinaryOperator::Add),
    (TokenKind::Sub, BinaryOperator::Sub),
];

const CONCATENATION: &[(TokenKind, BinaryOperator)] = &[(TokenKind::Concat, BinaryOperator::Concat)];

const RELATIONAL: &[(TokenKind, BinaryOperator)] = &[
    (TokenKind::LT, BinaryOperator::LT),
    (TokenKind::GT, BinaryOperator::GT),
    (TokenKind::LE, BinaryOperator::LE),
    (TokenKind::GE, BinaryOperator::GE),
    (TokenKind::EQ, BinaryOperator::EQ),
    (TokenKind::NE, BinaryOperator::NE),
];

const CONJUNCTION: &[(TokenKind, BinaryOperator)] = &[(TokenKind::And, BinaryOperator::And)];

const DISJUNCTION: &[(TokenKind, BinaryOperator)] = &[(TokenKind::Or, BinaryOperator::Or)];

/// How many new names a statement introduces through its assignable slots.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignableCount {
    Legal(usize),
    /// An assignable slot holds something that can be neither a variable nor
    /// a new name; the statement has to be read some other way.
    Illegal(Expression),
}

/// Classify the expressions sitting in a statement's assignable slots.
pub fn count_statement_assignables(assignables: &[&Expression]) -> AssignableCount {
    let mut count = 0;
    for expression in assignables {
        match expression {
            Expression::NewName { .. } => count += 1,
            Expression::Reference(_) => {}
            _ => return AssignableCount::Illegal((*expression).clone()),
        }
    }
    AssignableCount::Legal(count)
}

/// A parser over one statement's worth of tokens.
#[derive(Debug)]
pub struct Parser<'i> {
    tokens: &'i [Token],
    types: Vec<Rc<GrammarSymbol>>,
    primitives: Vec<Rc<GrammarSymbol>>,
    lists: Vec<Rc<GrammarSymbol>>,
    extensions: Vec<Rc<GrammarSymbol>>,
    statements: Vec<Rc<GrammarSymbol>>,
    abandoned: RefCell<Option<ParsingError>>,
}

impl<'i> Parser<'i> {
    /// Prepare to parse the given tokens against the symbols currently
    /// visible in the table.
    pub fn new(tokens: &'i [Token], table: &SymbolTable) -> Parser<'i> {
        let mut parser = Parser {
            tokens,
            types: Vec::new(),
            primitives: Vec::new(),
            lists: Vec::new(),
            extensions: Vec::new(),
            statements: Vec::new(),
            abandoned: RefCell::new(None),
        };

        for symbol in table.visible() {
            match symbol.kind() {
                SymbolKind::Type => parser
                    .types
                    .push(symbol.clone()),
                SymbolKind::Symbol | SymbolKind::Phrase => {
                    if symbol.is_left_recursive() {
                        parser
                            .extensions
                            .push(symbol.clone());
                        continue;
                    }
                    let leading = symbol
                        .fragments()
                        .first()
                        .map(Fragment::kind);
                    match leading {
                        Some(FragmentKind::Name | FragmentKind::Type | FragmentKind::Argument) => {
                            parser
                                .primitives
                                .push(symbol.clone())
                        }
                        Some(FragmentKind::List) => parser
                            .lists
                            .push(symbol.clone()),
                        // a primitive can't begin with an expression or an
                        // assignable without reading itself forever
                        _ => debug!("Ignoring {}, it cannot begin a primitive", symbol),
                    }
                }
                SymbolKind::Sentence | SymbolKind::Block => parser
                    .statements
                    .push(symbol.clone()),
            }
        }

        parser
    }

    pub fn tokens(&self) -> &'i [Token] {
        self.tokens
    }

    fn token(&self, position: usize) -> Option<&'i Token> {
        self.tokens
            .get(position)
    }

    fn is_kind(&self, position: usize, kind: TokenKind) -> bool {
        self.token(position)
            .map(|token| token.kind == kind)
            .unwrap_or(false)
    }

    /// Remember the failure of an alternative that was given up on without
    /// failing the parse as a whole, so that it can still be reported if
    /// nothing ends up matching.
    fn abandon(&self, error: ParsingError) {
        fold_into(&mut self.abandoned.borrow_mut(), error);
    }

    /// Match one keyword fragment against the token at `position`.
    pub fn parse_token(&self, fragment: &Fragment, position: usize) -> Result<usize, ParsingError> {
        match self.token(position) {
            Some(token) if !token.kind.is_literal() && fragment.accepts(token) => Ok(position + 1),
            _ => Err(ParsingError::no_match(position, expected_keyword(fragment))),
        }
    }

    /// Parse the sub-grammar a placeholder fragment asks for.
    pub fn parse_fragment(&self, fragment: &Fragment, position: usize) -> Candidates {
        match fragment.kind() {
            FragmentKind::Name => {
                let next = self.parse_token(fragment, position)?;
                let token = &self.tokens[position];
                Ok(vec![(next, Expression::Literal(token.clone()))])
            }
            FragmentKind::Type => self.parse_type(position),
            FragmentKind::Primitive => self.parse_primitive(position),
            FragmentKind::Expression => self.parse_expression(position),
            FragmentKind::List => self.parse_list(position),
            FragmentKind::Assignable => self.parse_assignable(position),
            FragmentKind::Argument => self.parse_argument(position),
        }
    }

    /// Match the fragments of `symbol` from `begin` onwards, appending the
    /// placeholder arguments found to `chain`.
    fn parse_symbol_from(
        &self,
        symbol: &GrammarSymbol,
        begin: usize,
        chain: Chain,
        position: usize,
    ) -> Result<Vec<(usize, Chain)>, ParsingError> {
        let fragment = match symbol
            .fragments()
            .get(begin)
        {
            Some(fragment) => fragment,
            None => return Ok(vec![(position, chain)]),
        };

        if !fragment.is_placeholder() {
            let next = self.parse_token(fragment, position)?;
            return self.parse_symbol_from(symbol, begin + 1, chain, next);
        }

        let mut results = Vec::new();
        let mut failure = None;

        for (next, argument) in self.parse_fragment(fragment, position)? {
            match self.parse_symbol_from(symbol, begin + 1, chain.append(argument), next) {
                Ok(found) => results.extend(found),
                Err(error) => fold_into(&mut failure, error),
            }
        }

        if results.is_empty() {
            Err(failure.unwrap_or_else(|| ParsingError::no_match(position, symbol.to_string())))
        } else {
            if let Some(error) = failure {
                self.abandon(error);
            }
            Ok(results)
        }
    }

    /// All the ways `symbol` matches starting at `position`.
    pub fn parse_symbol(&self, symbol: &Rc<GrammarSymbol>, position: usize) -> Candidates {
        trace!("Trying {} at {}", symbol, position);

        let found = self.parse_symbol_from(symbol, 0, Chain::new(), position)?;
        Ok(found
            .into_iter()
            .map(|(next, chain)| (next, assemble(symbol, &chain)))
            .collect())
    }

    /// Try each of the given symbols, keeping every match.
    fn parse_any_symbol(
        &self,
        symbols: &[Rc<GrammarSymbol>],
        position: usize,
        expected: &str,
    ) -> Candidates {
        let mut results = Vec::new();
        let mut failure = None;

        for symbol in symbols {
            match self.parse_symbol(symbol, position) {
                Ok(found) => results.extend(found),
                Err(error) => fold_into(&mut failure, error),
            }
        }

        if results.is_empty() {
            Err(failure.unwrap_or_else(|| ParsingError::no_match(position, expected)))
        } else {
            Ok(results)
        }
    }

    /// `<type>`
    pub fn parse_type(&self, position: usize) -> Candidates {
        self.parse_any_symbol(&self.types, position, "a type")
    }

    /// A literal, a unary operator applied to a primitive, a parenthesized
    /// expression, or a symbol beginning with a keyword, a type, an
    /// argument or a list.
    pub fn parse_short_primitive(&self, position: usize) -> Candidates {
        let token = match self.token(position) {
            Some(token) => token,
            None => return Err(ParsingError::no_match(position, "a primitive")),
        };

        if token
            .kind
            .is_literal()
        {
            return Ok(vec![(position + 1, Expression::Literal(token.clone()))]);
        }

        let mut results = Vec::new();
        let mut failure = None;

        let operator = match token.kind {
            TokenKind::Add => Some(UnaryOperator::Positive),
            TokenKind::Sub => Some(UnaryOperator::Negative),
            TokenKind::Not => Some(UnaryOperator::Not),
            _ => None,
        };

        if let Some(operator) = operator {
            match self.parse_primitive(position + 1) {
                Ok(found) => results.extend(
                    found
                        .into_iter()
                        .map(|(next, operand)| (next, Expression::unary(operator, operand))),
                ),
                Err(error) => fold_into(&mut failure, error),
            }
        } else if token.kind == TokenKind::OpenBracket {
            match self.parse_expression(position + 1) {
                Ok(found) => {
                    for (next, inner) in found {
                        if self.is_kind(next, TokenKind::CloseBracket) {
                            results.push((next + 1, inner));
                        } else {
                            fold_into(&mut failure, ParsingError::no_match(next, "\")\""));
                        }
                    }
                }
                Err(error) => fold_into(&mut failure, error),
            }
            if !self
                .lists
                .is_empty()
            {
                match self.parse_any_symbol(&self.lists, position, "a primitive") {
                    Ok(found) => results.extend(found),
                    Err(error) => fold_into(&mut failure, error),
                }
            }
        } else {
            match self.parse_any_symbol(&self.primitives, position, "a primitive") {
                Ok(found) => results.extend(found),
                Err(error) => fold_into(&mut failure, error),
            }
        }

        if results.is_empty() {
            Err(failure.unwrap_or_else(|| ParsingError::no_match(position, "a primitive")))
        } else {
            if let Some(error) = failure {
                self.abandon(error);
            }
            Ok(results)
        }
    }

    /// `<primitive>`: a short primitive, extended by any number of phrases
    /// which themselves begin with a primitive.
    pub fn parse_primitive(&self, position: usize) -> Candidates {
        let mut results = self.parse_short_primitive(position)?;

        // every extension consumes at least one more token, so this
        // eventually runs out of things to try
        let mut index = 0;
        while index < results.len() {
            let next = results[index].0;
            let seed = Chain::new().append(
                results[index]
                    .1
                    .clone(),
            );

            for symbol in &self.extensions {
                match self.parse_symbol_from(symbol, 1, seed.clone(), next) {
                    Ok(found) => {
                        for (end, chain) in found {
                            results.push((end, assemble(symbol, &chain)));
                        }
                    }
                    Err(error) => self.abandon(error),
                }
            }
            index += 1;
        }

        Ok(results)
    }

    /// `<list>`: a parenthesized, comma separated list of expressions.
    pub fn parse_list(&self, position: usize) -> Candidates {
        if !self.is_kind(position, TokenKind::OpenBracket) {
            return Err(ParsingError::no_match(position, "\"(\""));
        }
        if self.is_kind(position + 1, TokenKind::CloseBracket) {
            return Ok(vec![(position + 2, Expression::List(Vec::new()))]);
        }

        let mut results = Vec::new();
        let mut failure = None;
        let mut pending = vec![(position + 1, Chain::new())];

        while let Some((start, chain)) = pending.pop() {
            let found = match self.parse_expression(start) {
                Ok(found) => found,
                Err(error) => {
                    fold_into(&mut failure, error);
                    continue;
                }
            };

            for (next, element) in found {
                let elements = chain.append(element);
                match self.token(next) {
                    Some(token) if token.kind == TokenKind::Comma => {
                        pending.push((next + 1, elements));
                    }
                    Some(token) if token.kind == TokenKind::CloseBracket => {
                        results.push((next + 1, Expression::List(elements.to_vec())));
                    }
                    _ => fold_into(&mut failure, ParsingError::no_match(next, "\",\" or \")\"")),
                }
            }
        }

        if results.is_empty() {
            Err(failure.unwrap_or_else(|| ParsingError::no_match(position, "a list")))
        } else {
            if let Some(error) = failure {
                self.abandon(error);
            }
            Ok(results)
        }
    }

    fn parse_name(&self, position: usize, role: NameRole) -> Candidates {
        let mut words = Vec::new();
        let mut results = Vec::new();

        while let Some(token) = self.token(position + words.len()) {
            if token.kind != TokenKind::Identifier {
                break;
            }
            words.push(
                token
                    .value
                    .clone(),
            );
            results.push((
                position + words.len(),
                Expression::NewName {
                    words: words.clone(),
                    role,
                },
            ));
        }

        if results.is_empty() {
            Err(ParsingError::no_match(position, "a name"))
        } else {
            Ok(results)
        }
    }

    /// `<argument>`: a new name made of one or more identifiers. Every
    /// length is a candidate.
    pub fn parse_argument(&self, position: usize) -> Candidates {
        self.parse_name(position, NameRole::Argument)
    }

    /// `<assignable>`: anything a primitive can be, or a new name. A new
    /// name is not offered where some primitive reading covers exactly the
    /// same tokens; names resolve before they are introduced.
    pub fn parse_assignable(&self, position: usize) -> Candidates {
        let mut failure = None;

        let existing = match self.parse_primitive(position) {
            Ok(found) => found,
            Err(error) => {
                fold_into(&mut failure, error);
                Vec::new()
            }
        };
        let fresh = match self.parse_name(position, NameRole::Assignable) {
            Ok(found) => found,
            Err(error) => {
                fold_into(&mut failure, error);
                Vec::new()
            }
        };

        let mut results = Vec::with_capacity(existing.len() + fresh.len());
        for (next, name) in fresh {
            let shadowed = existing
                .iter()
                .any(|(end, _)| *end == next);
            if !shadowed {
                results.push((next, name));
            }
        }
        results.splice(0..0, existing);

        match failure {
            Some(error) if results.is_empty() => Err(error),
            _ => Ok(results),
        }
    }

    /// One tier of left associative binary operators over the tier below.
    fn parse_binary(
        &self,
        position: usize,
        operand: Tier<'i>,
        operators: &[(TokenKind, BinaryOperator)],
    ) -> Candidates {
        let mut pending = operand(self, position)?;
        let mut results = Vec::with_capacity(pending.len());

        while let Some((next, first)) = pending.pop() {
            let operator = self
                .token(next)
                .and_then(|token| {
                    operators
                        .iter()
                        .find(|(kind, _)| *kind == token.kind)
                        .map(|(_, operator)| *operator)
                });

            if let Some(operator) = operator {
                match operand(self, next + 1) {
                    Ok(found) => {
                        for (end, second) in found {
                            pending.push((end, Expression::binary(operator, first.clone(), second)));
                        }
                    }
                    Err(error) => self.abandon(error),
                }
            }
            results.push((next, first));
        }

        Ok(results)
    }

    /// `*` `/` `\` `%`
    pub fn parse_exp1(&self, position: usize) -> Candidates {
        self.parse_binary(position, Parser::parse_primitive, MULTIPLICATIVE)
    }

    /// `+` `-`
    pub fn parse_exp2(&self, position: usize) -> Candidates {
        self.parse_binary(position, Parser::parse_exp1, ADDITIVE)
    }

    /// `&`
    pub fn parse_exp3(&self, position: usize) -> Candidates {
        self.parse_binary(position, Parser::parse_exp2, CONCATENATION)
    }

    /// `<` `>` `<=` `>=` `=` `<>`
    pub fn parse_exp4(&self, position: usize) -> Candidates {
        self.parse_binary(position, Parser::parse_exp3, RELATIONAL)
    }

    /// `and`
    pub fn parse_exp5(&self, position: usize) -> Candidates {
        self.parse_binary(position, Parser::parse_exp4, CONJUNCTION)
    }

    /// `<expression>`, the loosest tier being `or`.
    pub fn parse_expression(&self, position: usize) -> Candidates {
        self.parse_binary(position, Parser::parse_exp5, DISJUNCTION)
    }

    /// The readings of the tokens from `position` to the end as one
    /// expression.
    pub fn parse_complete_expression(&self, position: usize) -> Candidates {
        let found = self.parse_expression(position)?;
        let complete = self.complete(found)?;
        debug!("Expression has {} complete readings", complete.len());
        Ok(complete)
    }

    /// The readings of the tokens from `position` to the end as a sentence
    /// or block. Readings whose assignable slots cannot be assigned are
    /// discarded, and of the rest only those introducing the fewest new
    /// names are kept.
    pub fn parse_statement(&self, position: usize) -> Candidates {
        let found = self.parse_any_symbol(&self.statements, position, "a statement")?;
        let complete = self.complete(found)?;

        let mut fewest = usize::MAX;
        let mut counted = Vec::with_capacity(complete.len());
        let mut failure = None;

        for (next, statement) in complete {
            match count_statement_assignables(&statement.assignable_arguments()) {
                AssignableCount::Legal(count) => {
                    fewest = fewest.min(count);
                    counted.push((count, next, statement));
                }
                AssignableCount::Illegal(expression) => fold_into(
                    &mut failure,
                    ParsingError::no_match(
                        position,
                        format!("something assignable instead of {}", expression.to_log()),
                    ),
                ),
            }
        }

        let results: Vec<(usize, Expression)> = counted
            .into_iter()
            .filter(|(count, _, _)| *count == fewest)
            .map(|(_, next, statement)| (next, statement))
            .collect();

        debug!("Statement has {} readings", results.len());

        if results.is_empty() {
            Err(failure.unwrap_or_else(|| ParsingError::no_match(position, "a statement")))
        } else {
            Ok(results)
        }
    }

    /// Keep only the candidates which reach the end of the tokens.
    fn complete(&self, found: Vec<(usize, Expression)>) -> Candidates {
        let end = self
            .tokens
            .len();
        let mut failure = self
            .abandoned
            .borrow_mut()
            .take();

        let mut results = Vec::new();
        for (next, expression) in found {
            if next == end {
                results.push((next, expression));
            } else {
                fold_into(&mut failure, ParsingError::no_match(next, "end of statement"));
            }
        }

        if results.is_empty() {
            Err(failure.unwrap_or_else(|| ParsingError::no_match(end, "end of statement")))
        } else {
            Ok(results)
        }
    }
}

/// The expression a completed match of `symbol` stands for.
fn assemble(symbol: &Rc<GrammarSymbol>, chain: &Chain) -> Expression {
    match symbol.kind() {
        SymbolKind::Symbol | SymbolKind::Type if chain.len() == 0 => {
            Expression::Reference(symbol.clone())
        }
        _ => Expression::invoke(symbol.clone(), chain.to_vec()),
    }
}

fn expected_keyword(fragment: &Fragment) -> String {
    fragment
        .identifiers()
        .iter()
        .map(|spelling| format!("\"{}\"", spelling))
        .collect::<Vec<_>>()
        .join(" or ")
}
