//! Free-text amount expressions.
//!
//! Vendors type amounts like `12+30+5` into a single cell. The evaluator keeps
//! digits, `.` and the four operators, drops an unfinished operator tail and
//! evaluates the rest with the usual precedence. Anything it cannot make sense
//! of evaluates to zero; the function never fails.

use std::str::FromStr;

use nom::{
    IResult, Parser,
    branch::alt,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::many0,
    sequence::preceded,
};
use rust_decimal::Decimal;

const OPERATORS: &[char] = &['+', '-', '*', '/'];

/// Postfix instruction produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Push(Decimal),
    Neg,
    Add,
    Sub,
    Mul,
    Div,
}

/// Evaluates a free-text amount expression.
///
/// Returns zero for blank, malformed, overflowing or divide-by-zero input.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use bahi_core::settlement::expression::evaluate;
///
/// assert_eq!(evaluate("5+3-"), dec!(8));
/// assert_eq!(evaluate("2+3*4"), dec!(14));
/// assert_eq!(evaluate("abc"), dec!(0));
/// ```
#[must_use]
pub fn evaluate(expression: &str) -> Decimal {
    let sanitized = sanitize(expression);
    if sanitized.is_empty() {
        return Decimal::ZERO;
    }

    // `++` and `--` are increment/decrement tokens in the grammar these cells
    // were historically evaluated with, so they never form a valid expression.
    if sanitized.contains("++") || sanitized.contains("--") {
        return Decimal::ZERO;
    }

    match all_consuming(sum).parse(sanitized.as_str()) {
        Ok((_, ops)) => run(&ops).unwrap_or(Decimal::ZERO),
        Err(_) => Decimal::ZERO,
    }
}

/// Strips foreign characters and any trailing run of operators or dots.
#[must_use]
pub fn sanitize(expression: &str) -> String {
    let kept: String = expression
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || OPERATORS.contains(c))
        .collect();

    kept.trim_end_matches(|c: char| c == '.' || OPERATORS.contains(&c))
        .to_string()
}

fn run(ops: &[Op]) -> Option<Decimal> {
    let mut stack: Vec<Decimal> = Vec::with_capacity(ops.len());

    for op in ops {
        match op {
            Op::Push(value) => stack.push(*value),
            Op::Neg => {
                let value = stack.pop()?;
                stack.push(-value);
            }
            Op::Add | Op::Sub | Op::Mul | Op::Div => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                let result = match op {
                    Op::Add => a.checked_add(b),
                    Op::Sub => a.checked_sub(b),
                    Op::Mul => a.checked_mul(b),
                    _ => a.checked_div(b),
                }?;
                stack.push(result);
            }
        }
    }

    if stack.len() == 1 { stack.pop() } else { None }
}

fn number(input: &str) -> IResult<&str, Decimal> {
    map_res(
        alt((
            recognize((digit1, opt((char('.'), digit0)))),
            recognize((char('.'), digit1)),
        )),
        |text: &str| Decimal::from_str(text.trim_end_matches('.')),
    )
    .parse(input)
}

fn unary(input: &str) -> IResult<&str, Vec<Op>> {
    alt((
        preceded(char('-'), unary).map(|mut ops| {
            ops.push(Op::Neg);
            ops
        }),
        preceded(char('+'), unary),
        number.map(|value| vec![Op::Push(value)]),
    ))
    .parse(input)
}

fn product(input: &str) -> IResult<&str, Vec<Op>> {
    (unary, many0((one_of("*/"), unary)))
        .map(|(first, rest)| {
            rest.into_iter().fold(first, |mut acc, (operator, right)| {
                acc.extend(right);
                acc.push(if operator == '*' { Op::Mul } else { Op::Div });
                acc
            })
        })
        .parse(input)
}

// Lowest precedence: addition and subtraction.
fn sum(input: &str) -> IResult<&str, Vec<Op>> {
    (product, many0((one_of("+-"), product)))
        .map(|(first, rest)| {
            rest.into_iter().fold(first, |mut acc, (operator, right)| {
                acc.extend(right);
                acc.push(if operator == '+' { Op::Add } else { Op::Sub });
                acc
            })
        })
        .parse(input)
}
