//! Filter expression parser using nom.
//!
//! Parses the textual filters accepted by the CLI into predicates. Every
//! condition goes through the builder functions, so parsed filters obey the
//! same validation as hand-built ones.
//!
//! # Syntax Overview
//!
//! ```text
//! Id IN (0, 1) AND NOT (UserName STARTSWITH 'K' OR Email IS NULL)
//! ─┬ ─┬ ──┬───  ─┬─ ─┬─ ──────────┬────────── ─┬ ───────┬──────
//!  │  │   │      │   │            │            │        │
//!  │  │   │      │   │            │            │        └── null test
//!  │  │   │      │   │            │            └── OR binds looser than AND
//!  │  │   │      │   │            └── string match (CONTAINS, ~, ENDSWITH)
//!  │  │   │      │   └── negation of a group or condition
//!  │  │   │      └── conjunction
//!  │  │   └── literal list
//!  │  └── set membership (NOT IN also works)
//!  └── member name
//! ```
//!
//! Comparison operators are `= != <> > >= < <=`. Literals are `'strings'`,
//! integers, decimals, `true`, `false` and `null`. Keywords are
//! case-insensitive.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{map, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
};

use crate::ast::builders;
use crate::ast::predicate::{CompareOp, Predicate, StringMatch};
use crate::error::{ShadowError, ShadowResult};
use crate::value::Value;

/// Parse a complete filter expression into a predicate.
pub fn parse_predicate(input: &str) -> ShadowResult<Predicate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ShadowError::parse(0, "Empty filter expression"));
    }

    match parse_expr(trimmed) {
        Ok(("", expr)) => expr.build(),
        Ok((remaining, _)) => Err(ShadowError::parse(
            trimmed.len() - remaining.len(),
            format!("Unexpected trailing content: '{}'", remaining),
        )),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ShadowError::parse(
            trimmed.len() - e.input.len(),
            format!("Expected a condition near '{}'", e.input),
        )),
        Err(nom::Err::Incomplete(_)) => Err(ShadowError::parse(trimmed.len(), "Unexpected end of input")),
    }
}

/// Parsed but not yet validated expression.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Cond(Condition),
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    member: String,
    test: Test,
}

#[derive(Debug, Clone, PartialEq)]
enum Test {
    Compare(CompareOp, Value),
    IsNull,
    IsNotNull,
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Like(StringMatch, String),
}

impl Expr {
    fn build(self) -> ShadowResult<Predicate> {
        match self {
            Expr::Not(inner) => Ok(builders::not(inner.build()?)),
            Expr::And(left, right) => builders::and([left.build()?, right.build()?]),
            Expr::Or(left, right) => builders::or([left.build()?, right.build()?]),
            Expr::Cond(cond) => cond.build(),
        }
    }
}

impl Condition {
    fn build(self) -> ShadowResult<Predicate> {
        let member = self.member.as_str();
        match self.test {
            Test::Compare(op, v) => match op {
                CompareOp::Eq => builders::equals(member, v),
                CompareOp::Ne => builders::not_equals(member, v),
                CompareOp::Gt => builders::greater_than(member, v),
                CompareOp::Ge => builders::greater_than_or_equal(member, v),
                CompareOp::Lt => builders::less_than(member, v),
                CompareOp::Le => builders::less_than_or_equal(member, v),
            },
            Test::IsNull => builders::equals(member, Value::Null),
            Test::IsNotNull => builders::not_equals(member, Value::Null),
            Test::In(values) => builders::collection_contains(values, member),
            Test::NotIn(values) => builders::collection_not_contains(values, member),
            Test::Like(StringMatch::Contains, s) => builders::contains(member, &s),
            Test::Like(StringMatch::StartsWith, s) => builders::starts_with(member, &s),
            Test::Like(StringMatch::EndsWith, s) => builders::ends_with(member, &s),
        }
    }
}

/// Match a keyword that is not the prefix of a longer word.
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| {
        let (rest, matched) = tag_no_case(kw)(input)?;
        if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)));
        }
        Ok((rest, matched))
    }
}

/// OR binds loosest.
fn parse_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_and(input)?;
    let (input, rest) = many0(preceded(
        delimited(multispace0, keyword("OR"), multispace0),
        parse_and,
    ))(input)?;
    Ok((input, fold(first, rest, Expr::Or)))
}

fn parse_and(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_unary(input)?;
    let (input, rest) = many0(preceded(
        delimited(multispace0, keyword("AND"), multispace0),
        parse_unary,
    ))(input)?;
    Ok((input, fold(first, rest, Expr::And)))
}

fn fold(first: Expr, rest: Vec<Expr>, combine: fn(Box<Expr>, Box<Expr>) -> Expr) -> Expr {
    rest.into_iter()
        .fold(first, |left, right| combine(Box::new(left), Box::new(right)))
}

fn parse_unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(
            preceded(pair(keyword("NOT"), multispace0), parse_unary),
            |e| Expr::Not(Box::new(e)),
        ),
        delimited(
            pair(char('('), multispace0),
            parse_expr,
            pair(multispace0, char(')')),
        ),
        map(parse_condition, Expr::Cond),
    ))(input)
}

/// Parse a member name; dotted names such as `dbo.Users.Id` are allowed.
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
    ))(input)
}

fn parse_condition(input: &str) -> IResult<&str, Condition> {
    let (input, member) = parse_identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, test) = alt((parse_null_test, parse_in_test, parse_like_test, parse_compare))(input)?;

    Ok((
        input,
        Condition {
            member: member.to_string(),
            test,
        },
    ))
}

/// `IS NULL` / `IS NOT NULL`
fn parse_null_test(input: &str) -> IResult<&str, Test> {
    let (input, _) = pair(keyword("IS"), multispace1)(input)?;
    let (input, not) = opt(pair(keyword("NOT"), multispace1))(input)?;
    let (input, _) = keyword("NULL")(input)?;
    Ok((input, if not.is_some() { Test::IsNotNull } else { Test::IsNull }))
}

/// `IN (...)` / `NOT IN (...)`
fn parse_in_test(input: &str) -> IResult<&str, Test> {
    let (input, not) = opt(pair(keyword("NOT"), multispace1))(input)?;
    let (input, _) = pair(keyword("IN"), multispace0)(input)?;
    let (input, values) = delimited(
        pair(char('('), multispace0),
        separated_list1(delimited(multispace0, char(','), multispace0), parse_literal),
        pair(multispace0, char(')')),
    )(input)?;
    Ok((
        input,
        if not.is_some() {
            Test::NotIn(values)
        } else {
            Test::In(values)
        },
    ))
}

/// `CONTAINS 'x'`, `~ 'x'`, `STARTSWITH 'x'`, `ENDSWITH 'x'`
fn parse_like_test(input: &str) -> IResult<&str, Test> {
    let (input, kind) = alt((
        value(StringMatch::Contains, keyword("CONTAINS")),
        value(StringMatch::Contains, tag("~")),
        value(StringMatch::StartsWith, keyword("STARTSWITH")),
        value(StringMatch::EndsWith, keyword("ENDSWITH")),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, literal) = parse_quoted_string(input)?;
    Ok((input, Test::Like(kind, literal)))
}

fn parse_compare(input: &str) -> IResult<&str, Test> {
    let (input, op) = alt((
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Ne, tag("<>")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Eq, tag("=")),
        value(CompareOp::Gt, tag(">")),
        value(CompareOp::Lt, tag("<")),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, literal) = parse_literal(input)?;
    Ok((input, Test::Compare(op, literal)))
}

fn parse_literal(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), keyword("true")),
        value(Value::Bool(false), keyword("false")),
        value(Value::Null, keyword("null")),
        map(parse_quoted_string, Value::String),
        parse_number,
    ))(input)
}

/// Parse a number. Integers become `Int32` when they fit, else `Int64`.
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, num_str) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;

    let parsed = if num_str.contains('.') {
        num_str.parse::<f64>().ok().map(Value::Double)
    } else {
        num_str.parse::<i64>().ok().map(|n| match i32::try_from(n) {
            Ok(small) => Value::Int32(small),
            Err(_) => Value::Int64(n),
        })
    };

    match parsed {
        Some(v) => Ok((rest, v)),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Digit))),
    }
}

/// Parse a single-quoted string; `''` inside stands for one quote.
fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    let (mut input, _) = char('\'')(input)?;
    let mut out = String::new();
    loop {
        let (rest, chunk) = take_while(|c| c != '\'')(input)?;
        out.push_str(chunk);
        let (rest, _) = char('\'')(rest)?;
        match char::<&str, Error<&str>>('\'')(rest) {
            Ok((rest, _)) => {
                out.push('\'');
                input = rest;
            }
            Err(_) => return Ok((rest, out)),
        }
    }
}
