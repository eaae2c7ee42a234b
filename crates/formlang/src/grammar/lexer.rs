use itertools::PeekingNext;

use super::{CompileErrorType, Result};
use crate::symbol::{is_epsilon, is_nonterminal, is_terminal, Symbol};

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Token {
    Arrow,
    Or,
    Epsilon,
    Nonterminal(Symbol),
    Terminal(Symbol),
}

pub fn lex_arrow(line: &mut impl PeekingNext<Item = char>) -> Result<Token> {
    line.next(); // Consume the dash
    if line.peeking_next(|&c| c == '>').is_none() {
        return Err(CompileErrorType::UnexpectedCharacter('-'));
    }
    Ok(Token::Arrow)
}

pub fn lex_line(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    let mut line_chars = line.chars().peekable();

    while let Some(&c) = line_chars.peek() {
        if c == '-' {
            tokens.push(lex_arrow(&mut line_chars)?);
            continue;
        }

        line_chars.next();
        if c == '|' {
            tokens.push(Token::Or);
        } else if is_epsilon(c) {
            tokens.push(Token::Epsilon);
        } else if is_terminal(c) {
            tokens.push(Token::Terminal(c));
        } else if is_nonterminal(c) {
            tokens.push(Token::Nonterminal(c));
        } else if !c.is_whitespace() {
            return Err(CompileErrorType::UnexpectedCharacter(c));
        }
    }

    Ok(tokens)
}
