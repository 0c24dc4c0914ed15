use std::fmt;

/// Why a parse attempt failed. Positions are token indices into the window
/// being parsed; the length of the window stands for end of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    NoMatch { position: usize, expected: String },
    Aggregate(Vec<ParsingError>),
}

impl ParsingError {
    pub fn no_match(position: usize, expected: impl Into<String>) -> ParsingError {
        ParsingError::NoMatch {
            position,
            expected: expected.into(),
        }
    }

    /// How far into the input the failed attempt got.
    pub fn position(&self) -> usize {
        match self {
            ParsingError::NoMatch { position, .. } => *position,
            ParsingError::Aggregate(errors) => errors
                .iter()
                .map(ParsingError::position)
                .max()
                .unwrap_or(0),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ParsingError::NoMatch { expected, .. } => format!("expected {}", expected),
            ParsingError::Aggregate(errors) => {
                let expected: Vec<&str> = errors
                    .iter()
                    .filter_map(|error| match error {
                        ParsingError::NoMatch { expected, .. } => Some(expected.as_str()),
                        ParsingError::Aggregate(_) => None,
                    })
                    .collect();
                match expected.len() {
                    0 => "no alternative matched".to_string(),
                    1 => format!("expected {}", expected[0]),
                    _ => format!("expected one of {}", expected.join(", ")),
                }
            }
        }
    }

    /// The individual failures this error is made of.
    pub fn failures(&self) -> Vec<&ParsingError> {
        match self {
            ParsingError::NoMatch { .. } => vec![self],
            ParsingError::Aggregate(errors) => errors
                .iter()
                .flat_map(ParsingError::failures)
                .collect(),
        }
    }

    /// Combine the failures of two sibling alternatives. The deeper failure
    /// is the more informative one and wins outright; failures at the same
    /// depth are all kept, without duplicates, ordered by what they expected.
    pub fn fold(self, other: ParsingError) -> ParsingError {
        let mine = self.position();
        let theirs = other.position();

        let mut failures: Vec<ParsingError> = if mine > theirs {
            self.into_failures()
        } else if mine < theirs {
            other.into_failures()
        } else {
            let mut combined = self.into_failures();
            combined.extend(other.into_failures());
            combined
        };

        failures.sort_by(|one, two| one.expected().cmp(two.expected()));
        failures.dedup();

        ParsingError::Aggregate(failures)
    }

    fn expected(&self) -> &str {
        match self {
            ParsingError::NoMatch { expected, .. } => expected,
            ParsingError::Aggregate(_) => "",
        }
    }

    fn into_failures(self) -> Vec<ParsingError> {
        match self {
            ParsingError::NoMatch { .. } => vec![self],
            ParsingError::Aggregate(errors) => errors
                .into_iter()
                .flat_map(ParsingError::into_failures)
                .collect(),
        }
    }
}

/// Accumulate the failure of one more alternative.
pub(crate) fn fold_into(accumulated: &mut Option<ParsingError>, error: ParsingError) {
    *accumulated = Some(match accumulated.take() {
        Some(previous) => previous.fold(error),
        None => error,
    });
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at token {}", self.message(), self.position())
    }
}

impl std::error::Error for ParsingError {}

#[cfg(test)]
mod check {
    use super::*;

    #[test]
    fn deeper_failure_wins() {
        let shallow = ParsingError::no_match(1, "\"to\"");
        let deep = ParsingError::no_match(4, "\")\"");

        let folded = shallow
            .clone()
            .fold(deep.clone());
        assert_eq!(folded.position(), 4);
        assert_eq!(folded, ParsingError::Aggregate(vec![deep.clone()]));

        // and regardless of order
        let folded = deep
            .clone()
            .fold(shallow);
        assert_eq!(folded, ParsingError::Aggregate(vec![deep]));
    }

    #[test]
    fn equal_depth_keeps_both() {
        let one = ParsingError::no_match(2, "\"to\"");
        let two = ParsingError::no_match(2, "an expression");

        let folded = one
            .clone()
            .fold(two.clone());
        assert_eq!(folded.position(), 2);
        assert_eq!(folded, ParsingError::Aggregate(vec![one.clone(), two.clone()]));

        // deterministic irrespective of fold order
        let other = two.fold(one);
        assert_eq!(folded, other);
    }

    #[test]
    fn duplicates_collapse() {
        let one = ParsingError::no_match(3, "a type");
        let folded = one
            .clone()
            .fold(one.clone())
            .fold(one.clone());
        assert_eq!(folded, ParsingError::Aggregate(vec![one]));
    }

    #[test]
    fn nested_aggregates_flatten() {
        let a = ParsingError::no_match(5, "\"of\"");
        let b = ParsingError::no_match(5, "\"is\"");
        let c = ParsingError::no_match(5, "\"and\"");

        let left = a
            .clone()
            .fold(b.clone());
        let folded = left.fold(c.clone());
        assert_eq!(folded.failures(), vec![&c, &b, &a]);
        assert_eq!(
            folded.message(),
            "expected one of \"and\", \"is\", \"of\""
        );
    }

    #[test]
    fn accumulating() {
        let mut accumulated = None;
        fold_into(&mut accumulated, ParsingError::no_match(0, "a primitive"));
        assert_eq!(
            accumulated,
            Some(ParsingError::no_match(0, "a primitive"))
        );

        fold_into(&mut accumulated, ParsingError::no_match(1, "\")\""));
        assert_eq!(
            accumulated.map(|error| error.position()),
            Some(1)
        );
    }
}
