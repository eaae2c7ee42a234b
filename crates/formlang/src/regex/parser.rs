use std::iter::Peekable;

use itertools::PeekingNext;

use super::{RegexError, RegexErrorType, RegexResult};
use crate::error::Location;
use crate::symbol::{is_terminal, Symbol};

/// A parsed regular expression over single-character literals.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The empty word: empty input, `()`, or a missing side of `|`
    Empty,
    Literal(Symbol),
    Star(Box<Expr>),
    Alternation(Box<Expr>, Box<Expr>),
    Concatenation(Box<Expr>, Box<Expr>),
}

fn is_operator(c: char) -> bool {
    matches!(c, '(' | ')' | '*' | '|')
}

fn error_at(column: usize, error: RegexErrorType) -> RegexError {
    RegexError::at(Location::column(column), error)
}

// Whole-text pass so the first unsupported character is reported even when
// the structure breaks earlier
fn check_characters(text: &str) -> RegexResult<()> {
    match text
        .chars()
        .enumerate()
        .find(|(_, c)| !(is_terminal(*c) || is_operator(*c) || c.is_whitespace()))
    {
        Some((idx, c)) => Err(error_at(idx + 1, RegexErrorType::UnsupportedCharacter(c))),
        None => Ok(()),
    }
}

fn alternation<I: Iterator<Item = (usize, char)>>(input: &mut Peekable<I>) -> RegexResult<Expr> {
    let mut expr = concatenation(input)?;
    while input.peeking_next(|&(_, c)| c == '|').is_some() {
        let rhs = concatenation(input)?;
        expr = Expr::Alternation(Box::new(expr), Box::new(rhs));
    }
    Ok(expr)
}

fn concatenation<I: Iterator<Item = (usize, char)>>(input: &mut Peekable<I>) -> RegexResult<Expr> {
    let mut expr: Option<Expr> = None;

    while let Some(&(column, c)) = input.peek() {
        let atom = match c {
            '|' | ')' => break,
            '*' => return Err(error_at(column, RegexErrorType::DanglingStar)),
            '(' => {
                input.next();
                group(input, column)?
            }
            c if is_terminal(c) => {
                input.next();
                Expr::Literal(c)
            }
            c => return Err(error_at(column, RegexErrorType::UnsupportedCharacter(c))),
        };
        let atom = star(input, atom)?;

        expr = Some(match expr {
            Some(lhs) => Expr::Concatenation(Box::new(lhs), Box::new(atom)),
            None => atom,
        });
    }

    Ok(expr.unwrap_or(Expr::Empty))
}

fn star<I: Iterator<Item = (usize, char)>>(input: &mut Peekable<I>, atom: Expr) -> RegexResult<Expr> {
    if input.peeking_next(|&(_, c)| c == '*').is_none() {
        return Ok(atom);
    }
    if let Some(&(column, '*')) = input.peek() {
        return Err(error_at(column, RegexErrorType::DanglingStar));
    }
    Ok(Expr::Star(Box::new(atom)))
}

fn group<I: Iterator<Item = (usize, char)>>(input: &mut Peekable<I>, open: usize) -> RegexResult<Expr> {
    let expr = alternation(input)?;
    match input.next() {
        Some((_, ')')) => Ok(expr),
        _ => Err(error_at(open, RegexErrorType::UnbalancedParenthesis)),
    }
}

/// Parse `text` into an expression tree. Whitespace is ignored and columns
/// in errors are 1-based character offsets into `text`.
pub fn parse(text: &str) -> RegexResult<Expr> {
    check_characters(text)?;

    let mut input = text
        .chars()
        .enumerate()
        .map(|(idx, c)| (idx + 1, c))
        .filter(|(_, c)| !c.is_whitespace())
        .peekable();

    let expr = alternation(&mut input)?;
    match input.next() {
        None => Ok(expr),
        Some((column, _)) => Err(error_at(column, RegexErrorType::UnexpectedParenthesis)),
    }
}
