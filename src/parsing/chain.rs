//! Persistent list of the sub-expressions matched so far.
//!
//! Alternatives that fan out from a common prefix share that prefix; nothing
//! is ever modified after it has been linked in.

use std::rc::Rc;

use crate::language::Expression;

#[derive(Debug)]
struct Link {
    expression: Expression,
    previous: Option<Rc<Link>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Chain {
    last: Option<Rc<Link>>,
}

impl Chain {
    pub(crate) fn new() -> Chain {
        Chain { last: None }
    }

    /// A new chain with one more expression at the end. This chain is left
    /// untouched.
    pub(crate) fn append(&self, expression: Expression) -> Chain {
        Chain {
            last: Some(Rc::new(Link {
                expression,
                previous: self
                    .last
                    .clone(),
            })),
        }
    }

    pub(crate) fn len(&self) -> usize {
        let mut count = 0;
        let mut link = self
            .last
            .as_ref();
        while let Some(current) = link {
            count += 1;
            link = current
                .previous
                .as_ref();
        }
        count
    }

    /// The expressions in the order they were appended.
    pub(crate) fn to_vec(&self) -> Vec<Expression> {
        let mut result = Vec::with_capacity(self.len());
        let mut link = self
            .last
            .as_ref();
        while let Some(current) = link {
            result.push(
                current
                    .expression
                    .clone(),
            );
            link = current
                .previous
                .as_ref();
        }
        result.reverse();
        result
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::language::{Position, Token, TokenKind};

    fn number(value: &str) -> Expression {
        Expression::Literal(Token::new(TokenKind::Integer, value, Position::default()))
    }

    #[test]
    fn order_is_preserved() {
        let chain = Chain::new()
            .append(number("1"))
            .append(number("2"))
            .append(number("3"));
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.to_vec(), vec![number("1"), number("2"), number("3")]);
    }

    #[test]
    fn branches_share_a_prefix() {
        let prefix = Chain::new().append(number("1"));
        let left = prefix.append(number("2"));
        let right = prefix.append(number("3"));

        assert_eq!(prefix.to_vec(), vec![number("1")]);
        assert_eq!(left.to_vec(), vec![number("1"), number("2")]);
        assert_eq!(right.to_vec(), vec![number("1"), number("3")]);
    }

    #[test]
    fn empty() {
        let chain = Chain::new();
        assert_eq!(chain.len(), 0);
        assert!(chain
            .to_vec()
            .is_empty());
    }
}
