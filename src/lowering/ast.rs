//! The lowered form: declarations made of plain statements, where every
//! call to user code passes an explicit continuation.

use serde::Serialize;
use std::fmt;

use crate::language::{escape, BinaryOperator, UnaryOperator};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Integer(String),
    Float(String),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Literal(Literal),
    Reference(String),
    Type(String),
    Invoke {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    NewArray(Vec<Expression>),
    NewArrayOfLength(Box<Expression>),
    NewObject {
        #[serde(rename = "type")]
        type_: Box<Expression>,
        fields: Vec<Expression>,
    },
    ArrayItem {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    ArrayLength(Box<Expression>),
    IsType {
        value: Box<Expression>,
        #[serde(rename = "type")]
        type_: Box<Expression>,
        negated: bool,
    },
    Field {
        target: Box<Expression>,
        name: String,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        first: Box<Expression>,
        second: Box<Expression>,
    },
    Lambda(Lambda),
}

impl Expression {
    pub fn reference(name: impl Into<String>) -> Expression {
        Expression::Reference(name.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lambda {
    pub parameters: Vec<String>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Assign {
        name: String,
        value: Expression,
    },
    SetArrayItem {
        array: Expression,
        index: Expression,
        value: Expression,
    },
    SetField {
        target: Expression,
        name: String,
        value: Expression,
    },
    Expression(Expression),
    Select(Expression),
    Case(Expression),
    CaseElse,
    End,
}

/// A function in lowered form. Every declaration takes, after its own
/// parameters, the state threaded through the program and the continuation
/// to call with its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub parameters: Vec<String>,
    pub state: String,
    pub continuation: String,
    pub result: String,
    pub locals: Vec<String>,
    pub body: Vec<Statement>,
}

impl Declaration {
    pub fn new(name: impl Into<String>, parameters: Vec<String>) -> Declaration {
        Declaration {
            name: name.into(),
            parameters,
            state: "$state".to_string(),
            continuation: "$continuation".to_string(),
            result: "$the_result".to_string(),
            locals: Vec::new(),
            body: Vec::new(),
        }
    }
}

const INDENT: &str = "    ";

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_list(f: &mut fmt::Formatter<'_>, expressions: &[Expression], depth: usize) -> fmt::Result {
    for (i, expression) in expressions
        .iter()
        .enumerate()
    {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_expression(f, expression, depth)?;
    }
    Ok(())
}

fn write_expression(f: &mut fmt::Formatter<'_>, expression: &Expression, depth: usize) -> fmt::Result {
    match expression {
        Expression::Literal(literal) => write!(f, "{}", literal),
        Expression::Reference(name) => f.write_str(name),
        Expression::Type(name) => write!(f, "<{}>", name),
        Expression::Invoke {
            function,
            arguments,
        } => {
            write_expression(f, function, depth)?;
            f.write_str("(")?;
            write_list(f, arguments, depth)?;
            f.write_str(")")
        }
        Expression::NewArray(elements) => {
            f.write_str("[")?;
            write_list(f, elements, depth)?;
            f.write_str("]")
        }
        Expression::NewArrayOfLength(length) => {
            f.write_str("new array[")?;
            write_expression(f, length, depth)?;
            f.write_str("]")
        }
        Expression::NewObject { type_, fields } => {
            f.write_str("new ")?;
            write_expression(f, type_, depth)?;
            f.write_str("(")?;
            write_list(f, fields, depth)?;
            f.write_str(")")
        }
        Expression::ArrayItem { array, index } => {
            write_expression(f, array, depth)?;
            f.write_str("[")?;
            write_expression(f, index, depth)?;
            f.write_str("]")
        }
        Expression::ArrayLength(array) => {
            f.write_str("length(")?;
            write_expression(f, array, depth)?;
            f.write_str(")")
        }
        Expression::IsType {
            value,
            type_,
            negated,
        } => {
            f.write_str("(")?;
            write_expression(f, value, depth)?;
            f.write_str(if *negated { " is not " } else { " is " })?;
            write_expression(f, type_, depth)?;
            f.write_str(")")
        }
        Expression::Field { target, name } => {
            write_expression(f, target, depth)?;
            write!(f, ".{}", name)
        }
        Expression::Unary { operator, operand } => {
            write!(f, "({} ", operator.symbol())?;
            write_expression(f, operand, depth)?;
            f.write_str(")")
        }
        Expression::Binary {
            operator,
            first,
            second,
        } => {
            f.write_str("(")?;
            write_expression(f, first, depth)?;
            write!(f, " {} ", operator.symbol())?;
            write_expression(f, second, depth)?;
            f.write_str(")")
        }
        Expression::Lambda(lambda) => write_lambda(f, lambda, depth),
    }
}

fn write_lambda(f: &mut fmt::Formatter<'_>, lambda: &Lambda, depth: usize) -> fmt::Result {
    writeln!(f, "function ({})", lambda.parameters.join(", "))?;
    write_statements(f, &lambda.body, depth + 1)?;
    write_indent(f, depth)?;
    f.write_str("end")
}

fn write_statements(f: &mut fmt::Formatter<'_>, statements: &[Statement], depth: usize) -> fmt::Result {
    for statement in statements {
        write_indent(f, depth)?;
        write_statement(f, statement, depth)?;
        writeln!(f)?;
    }
    Ok(())
}

fn write_statement(f: &mut fmt::Formatter<'_>, statement: &Statement, depth: usize) -> fmt::Result {
    match statement {
        Statement::Assign { name, value } => {
            write!(f, "{} = ", name)?;
            write_expression(f, value, depth)
        }
        Statement::SetArrayItem {
            array,
            index,
            value,
        } => {
            write_expression(f, array, depth)?;
            f.write_str("[")?;
            write_expression(f, index, depth)?;
            f.write_str("] = ")?;
            write_expression(f, value, depth)
        }
        Statement::SetField {
            target,
            name,
            value,
        } => {
            write_expression(f, target, depth)?;
            write!(f, ".{} = ", name)?;
            write_expression(f, value, depth)
        }
        Statement::Expression(expression) => write_expression(f, expression, depth),
        Statement::Select(value) => {
            f.write_str("select ")?;
            write_expression(f, value, depth)
        }
        Statement::Case(value) => {
            f.write_str("case ")?;
            write_expression(f, value, depth)
        }
        Statement::CaseElse => f.write_str("case else"),
        Statement::End => f.write_str("end"),
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(text) | Literal::Float(text) => f.write_str(text),
            Literal::String(text) => write!(f, "\"{}\"", escape(text)),
            Literal::Boolean(value) => write!(f, "{}", value),
            Literal::Null => f.write_str("null"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expression(f, self, 0)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, self, 0)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parameters = self
            .parameters
            .clone();
        parameters.push(
            self.state
                .clone(),
        );
        parameters.push(
            self.continuation
                .clone(),
        );

        writeln!(f, "function {}({})", self.name, parameters.join(", "))?;
        write_indent(f, 1)?;
        writeln!(f, "var {}", self.result)?;
        for local in &self.locals {
            write_indent(f, 1)?;
            writeln!(f, "var {}", local)?;
        }
        write_statements(f, &self.body, 1)?;
        f.write_str("end")
    }
}
