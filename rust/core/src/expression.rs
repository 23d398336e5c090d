// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric and string expressions evaluated against feature attributes
//!
//! Numeric expressions are infix arithmetic over literals and bracketed
//! attribute references, e.g. `[levels] * 3.2 + 1` or `max([height], 4)`.
//! Expressions are parsed once with nom and evaluated per feature.

use crate::error::{Error, Result};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, map_res},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Min,
    Max,
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Variable(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    fn eval<F: Fn(&str) -> f64>(&self, lookup: &F) -> f64 {
        match self {
            Self::Number(v) => *v,
            Self::Variable(name) => lookup(name),
            Self::Neg(inner) => -inner.eval(lookup),
            Self::Binary(op, lhs, rhs) => {
                let a = lhs.eval(lookup);
                let b = rhs.eval(lookup);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    // Division by zero evaluates to zero
                    BinaryOp::Div if b == 0.0 => 0.0,
                    BinaryOp::Div => a / b,
                    BinaryOp::Mod if b == 0.0 => 0.0,
                    BinaryOp::Mod => a % b,
                }
            }
            Self::Call(function, args) => {
                let values = args.iter().map(|a| a.eval(lookup));
                match function {
                    Function::Min => values.fold(f64::INFINITY, f64::min),
                    Function::Max => values.fold(f64::NEG_INFINITY, f64::max),
                    Function::Abs => args.first().map(|a| a.eval(lookup).abs()).unwrap_or(0.0),
                }
            }
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::Neg(inner) => inner.collect_variables(out),
            Self::Binary(_, lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Self::Call(_, args) => args.iter().for_each(|a| a.collect_variables(out)),
        }
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn fold_binary(first: Expr, rest: Vec<(char, Expr)>) -> Expr {
    rest.into_iter().fold(first, |acc, (op, rhs)| {
        let op = match op {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Sub,
            '*' => BinaryOp::Mul,
            '/' => BinaryOp::Div,
            _ => BinaryOp::Mod,
        };
        Expr::Binary(op, Box::new(acc), Box::new(rhs))
    })
}

fn parse_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_term(input)?;
    let (input, rest) = many0(pair(ws(alt((char('+'), char('-')))), parse_term))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn parse_term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_factor(input)?;
    let (input, rest) =
        many0(pair(ws(alt((char('*'), char('/'), char('%')))), parse_factor))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn parse_factor(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        map(preceded(char('-'), parse_factor), |e| Expr::Neg(Box::new(e))),
        parse_variable,
        parse_call,
        map(double, Expr::Number),
        delimited(char('('), parse_expr, char(')')),
    )))(input)
}

fn parse_variable(input: &str) -> IResult<&str, Expr> {
    map(
        delimited(char('['), take_while1(|c: char| c != ']'), char(']')),
        |name: &str| Expr::Variable(name.trim().to_string()),
    )(input)
}

fn parse_call(input: &str) -> IResult<&str, Expr> {
    map_res(
        pair(
            take_while1(|c: char| c.is_ascii_alphabetic()),
            delimited(
                ws(char('(')),
                separated_list1(ws(char(',')), parse_expr),
                ws(char(')')),
            ),
        ),
        |(name, args): (&str, Vec<Expr>)| {
            Function::from_name(name)
                .map(|f| Expr::Call(f, args))
                .ok_or("unknown function")
        },
    )(input)
}

/// Parsed numeric expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NumericExpression {
    source: String,
    expr: Expr,
}

impl NumericExpression {
    /// Parse an expression such as `[height] * 2`
    pub fn parse(source: &str) -> Result<Self> {
        match all_consuming(parse_expr)(source) {
            Ok((_, expr)) => Ok(Self {
                source: source.to_string(),
                expr,
            }),
            Err(e) => Err(Error::expression(source, e.to_string())),
        }
    }

    /// Expression that always evaluates to `value`
    pub fn constant(value: f64) -> Self {
        Self {
            source: value.to_string(),
            expr: Expr::Number(value),
        }
    }

    /// Expression that reads one variable
    pub fn variable(name: &str) -> Self {
        Self {
            source: format!("[{}]", name),
            expr: Expr::Variable(name.to_string()),
        }
    }

    /// Source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct variable names in first-use order
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.expr.collect_variables(&mut out);
        out
    }

    /// Evaluate with a variable lookup
    pub fn eval<F: Fn(&str) -> f64>(&self, lookup: F) -> f64 {
        self.expr.eval(&lookup)
    }
}

impl FromStr for NumericExpression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NumericExpression {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<NumericExpression> for String {
    fn from(expr: NumericExpression) -> Self {
        expr.source
    }
}

impl fmt::Display for NumericExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// Text template with bracketed attribute substitutions, e.g. `"[name] ([id])"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StringExpression {
    source: String,
    segments: Vec<Segment>,
}

impl StringExpression {
    pub fn new(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find('[') {
            let Some(close) = rest[open..].find(']') else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            segments.push(Segment::Variable(rest[open + 1..open + close].trim().to_string()));
            rest = &rest[open + close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Substitute variables using `lookup`
    pub fn eval<F: Fn(&str) -> String>(&self, lookup: F) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => out.push_str(&lookup(name)),
            }
        }
        out
    }
}

impl From<String> for StringExpression {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<StringExpression> for String {
    fn from(expr: StringExpression) -> Self {
        expr.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_vars(_: &str) -> f64 {
        0.0
    }

    #[test]
    fn test_precedence() {
        let expr = NumericExpression::parse("2 + 3 * 4").unwrap();
        assert_eq!(expr.eval(no_vars), 14.0);

        let expr = NumericExpression::parse("(2 + 3) * 4").unwrap();
        assert_eq!(expr.eval(no_vars), 20.0);
    }

    #[test]
    fn test_left_associative_subtraction() {
        let expr = NumericExpression::parse("10 - 4 - 3").unwrap();
        assert_eq!(expr.eval(no_vars), 3.0);
    }

    #[test]
    fn test_unary_minus() {
        let expr = NumericExpression::parse("-[a] * 2").unwrap();
        assert_eq!(expr.eval(|_| 3.0), -6.0);
    }

    #[test]
    fn test_variables() {
        let expr = NumericExpression::parse("[levels] * 3.5 + [levels] + [roof_height]").unwrap();
        assert_eq!(expr.variables(), vec!["levels", "roof_height"]);
        let value = expr.eval(|name| match name {
            "levels" => 4.0,
            "roof_height" => 2.0,
            _ => 0.0,
        });
        assert_eq!(value, 20.0);
    }

    #[test]
    fn test_functions() {
        let expr = NumericExpression::parse("max([h], 5, 2) + min(1, 0.5) + abs(-2)").unwrap();
        assert_eq!(expr.eval(|_| 7.0), 9.5);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let expr = NumericExpression::parse("10 / [zero] + 7 % 0").unwrap();
        assert_eq!(expr.eval(no_vars), 0.0);
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(NumericExpression::parse("2 +").is_err());
        assert!(NumericExpression::parse("[unclosed").is_err());
        assert!(NumericExpression::parse("sqrt(4)").is_err());
    }

    #[test]
    fn test_deserialize_from_string() {
        let expr: NumericExpression = serde_json::from_str("\"[height] * 2\"").unwrap();
        assert_eq!(expr.source(), "[height] * 2");
        assert_eq!(expr.eval(|_| 4.0), 8.0);
        assert!(serde_json::from_str::<NumericExpression>("\"* 2\"").is_err());
    }

    #[test]
    fn test_string_expression() {
        let expr = StringExpression::new("[name] (#[id])");
        let out = expr.eval(|name| match name {
            "name" => "Town Hall".to_string(),
            "id" => "42".to_string(),
            _ => String::new(),
        });
        assert_eq!(out, "Town Hall (#42)");
    }

    #[test]
    fn test_string_expression_unclosed_bracket_is_literal() {
        let expr = StringExpression::new("bldg [name");
        assert_eq!(expr.eval(|_| "x".to_string()), "bldg [name");
    }
}
