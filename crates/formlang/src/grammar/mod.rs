/*
    This module parses and stores right-regular grammars
*/

mod convert;
mod lexer;
mod verifier;

use std::fmt::{self, Display};

use crate::error::{Error, ErrorKind, ErrorType, Location};
use crate::symbol::{Symbol, EPSILON};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use lexer::Token;
use verifier::{verify_rules, IntermediateRuleset};

#[derive(Debug, PartialEq)]
pub enum CompileErrorType {
    // There is nothing to parse
    EmptyGrammar,
    // A character outside the grammar's vocabulary
    UnexpectedCharacter(char),
    // The line does not start with a single uppercase nonterminal
    MissingHead,
    // The head is not followed by `->`
    MissingArrow,
    // `->` appears in a right-hand side
    UnexpectedArrow,
    // Nothing between two `|`
    EmptyAlternative,
    // An alternative that is not `&`, `a` or `aB`
    MalformedAlternative(String),
    // `X -> &` where X is not the start symbol
    EpsilonOutsideStart(Symbol),
    // `X -> aS` while the start symbol S derives the empty word
    ReentersNullableStart(Symbol),
}

impl ErrorType for CompileErrorType {
    fn kind(&self) -> ErrorKind {
        match self {
            CompileErrorType::EpsilonOutsideStart(_) | CompileErrorType::ReentersNullableStart(_) => {
                ErrorKind::Semantic
            }
            _ => ErrorKind::Syntax,
        }
    }
}

impl Display for CompileErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileErrorType::EmptyGrammar => write!(f, "The grammar has no productions"),
            CompileErrorType::UnexpectedCharacter(c) => write!(f, "Unexpected character `{}`", c),
            CompileErrorType::MissingHead => write!(f, "A production must start with an uppercase nonterminal"),
            CompileErrorType::MissingArrow => write!(f, "Expected `->` after the nonterminal"),
            CompileErrorType::UnexpectedArrow => write!(f, "Unexpected `->` in a right-hand side"),
            CompileErrorType::EmptyAlternative => write!(f, "Empty alternative, use `&` for the empty word"),
            CompileErrorType::MalformedAlternative(text) => {
                write!(f, "`{}` is not a terminal optionally followed by a nonterminal", text)
            }
            CompileErrorType::EpsilonOutsideStart(head) => {
                write!(f, "`{}` derives `&`, only the start symbol may derive the empty word", head)
            }
            CompileErrorType::ReentersNullableStart(head) => write!(
                f,
                "`{}` leads back to the start symbol, which must not happen when the start symbol derives `&`",
                head
            ),
        }
    }
}

pub type CompileError = Error<CompileErrorType>;
pub type CompileErrors = Vec<CompileError>;

pub type Result<T> = std::result::Result<T, CompileErrorType>;
pub type LineResult<T> = std::result::Result<T, CompileError>;
pub type FileResult<T> = std::result::Result<T, CompileErrors>;

/// One right-hand side of a right-regular production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    /// `&`
    Empty,
    /// `a`
    Terminal(Symbol),
    /// `aB`
    Step(Symbol, Symbol),
}

impl Production {
    pub fn terminal(&self) -> Symbol {
        match self {
            Production::Empty => EPSILON,
            Production::Terminal(t) | Production::Step(t, _) => *t,
        }
    }

    pub fn nonterminal(&self) -> Option<Symbol> {
        match self {
            Production::Step(_, n) => Some(*n),
            _ => None,
        }
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Production::Empty => write!(f, "{}", EPSILON),
            Production::Terminal(t) => write!(f, "{}", t),
            Production::Step(t, n) => write!(f, "{}{}", t, n),
        }
    }
}

// The alternatives of a nonterminal
pub type Alternatives = IndexSet<Production>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grammar {
    pub text: String,
    pub nonterminals: IndexSet<Symbol>,
    /// Terminals, plus `&` when some production derives the empty word
    pub terminals: IndexSet<Symbol>,
    pub productions: IndexMap<Symbol, Alternatives>,
    pub start: Option<Symbol>,
    pub valid: bool,
}

#[derive(PartialEq, Debug)]
struct Rule {
    head: Symbol,
    alternatives: Alternatives,
    location: Location,
}

fn parse_alternative(tokens: &[Token]) -> Result<Production> {
    match tokens {
        [Token::Epsilon] => Ok(Production::Empty),
        [Token::Terminal(t)] => Ok(Production::Terminal(*t)),
        [Token::Terminal(t), Token::Nonterminal(n)] => Ok(Production::Step(*t, *n)),
        [] => Err(CompileErrorType::EmptyAlternative),
        _ if tokens.contains(&Token::Arrow) => Err(CompileErrorType::UnexpectedArrow),
        _ => Err(CompileErrorType::MalformedAlternative(render_tokens(tokens))),
    }
}

fn render_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            Token::Arrow => "->".to_string(),
            Token::Or => "|".to_string(),
            Token::Epsilon => EPSILON.to_string(),
            Token::Nonterminal(c) | Token::Terminal(c) => c.to_string(),
        })
        .collect()
}

fn parse_line(tokens: &[Token], location: Location) -> Result<Rule> {
    let head = match tokens.first() {
        Some(Token::Nonterminal(head)) => *head,
        _ => return Err(CompileErrorType::MissingHead),
    };

    if tokens.get(1) != Some(&Token::Arrow) {
        return Err(CompileErrorType::MissingArrow);
    }

    let alternatives = tokens[2..]
        .split(|t| *t == Token::Or)
        .map(parse_alternative)
        .collect::<Result<Alternatives>>()?;

    Ok(Rule {
        head,
        alternatives,
        location,
    })
}

fn parse_lex_line(line: &str, location: Location) -> LineResult<Rule> {
    lexer::lex_line(line)
        .and_then(|tokens| parse_line(&tokens, location))
        .map_err(|error| CompileError { location, error })
}

fn is_continuation(previous: &str, line: &str) -> bool {
    line.starts_with('|') || previous.ends_with('|') || previous.ends_with("->")
}

// Joins productions split over several lines and drops blank ones,
// keeping the number of the line each production starts on
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (num, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match lines.last_mut() {
            Some((_, previous)) if is_continuation(previous, line) => {
                previous.push(' ');
                previous.push_str(line);
            }
            _ => lines.push((num + 1, line.to_string())),
        }
    }
    lines
}

impl Grammar {
    /// Parse grammar text such as `S -> aS | b`.
    ///
    /// Parsing is all-or-nothing: every syntax error is reported, and no
    /// grammar is produced unless all lines are well formed and the epsilon
    /// rules hold. The first line's head is the start symbol.
    pub fn parse(text: &str) -> FileResult<Grammar> {
        let lines = logical_lines(text);
        if lines.is_empty() {
            return Err(vec![CompileError::new(CompileErrorType::EmptyGrammar)]);
        }

        let (rules, errors): (Vec<_>, Vec<_>) = lines
            .iter()
            .map(|(num, line)| parse_lex_line(line, Location::line(*num)))
            .partition_result();
        if !errors.is_empty() {
            return Err(errors);
        }

        let start = rules[0].head;
        let mut ruleset = IntermediateRuleset::with_capacity(rules.len());
        for rule in rules {
            ruleset
                .entry(rule.head)
                .or_insert_with(|| (Alternatives::new(), rule.location))
                .0
                .extend(rule.alternatives);
        }

        verify_rules(start, &ruleset)?;

        let productions = ruleset
            .into_iter()
            .map(|(head, (alternatives, _))| (head, alternatives))
            .collect();
        Ok(Grammar::from_productions(text.to_string(), start, productions))
    }

    /// Parse, falling back to an invalid grammar that keeps the text.
    pub fn from_text(text: &str) -> Grammar {
        Grammar::parse(text).unwrap_or_else(|_| Grammar::invalid(text))
    }

    pub fn invalid(text: &str) -> Grammar {
        Grammar {
            text: text.to_string(),
            ..Grammar::default()
        }
    }

    pub(crate) fn from_productions(text: String, start: Symbol, productions: IndexMap<Symbol, Alternatives>) -> Grammar {
        let terminals = productions
            .values()
            .flat_map(|alternatives| alternatives.iter().map(Production::terminal))
            .collect();
        let nonterminals = productions
            .iter()
            .flat_map(|(head, alternatives)| {
                std::iter::once(*head).chain(alternatives.iter().filter_map(Production::nonterminal))
            })
            .collect();

        Grammar {
            text,
            nonterminals,
            terminals,
            productions,
            start: Some(start),
            valid: true,
        }
    }

    /// Whether the start symbol derives the empty word.
    pub fn derives_empty(&self) -> bool {
        self.start
            .and_then(|start| self.productions.get(&start))
            .is_some_and(|alternatives| alternatives.contains(&Production::Empty))
    }
}

impl Display for Grammar {
    /// One line per nonterminal, start symbol first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heads = self
            .start
            .into_iter()
            .chain(self.productions.keys().copied().filter(|head| Some(*head) != self.start));
        for head in heads {
            if let Some(alternatives) = self.productions.get(&head).filter(|a| !a.is_empty()) {
                writeln!(f, "{} -> {}", head, alternatives.iter().join(" | "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternatives(productions: &[Production]) -> Alternatives {
        productions.iter().copied().collect()
    }

    #[test]
    fn test_parse_normal_alternative() {
        assert_eq!(parse_alternative(&[Token::Epsilon]), Ok(Production::Empty));
        assert_eq!(parse_alternative(&[Token::Terminal('a')]), Ok(Production::Terminal('a')));
        assert_eq!(
            parse_alternative(&[Token::Terminal('0'), Token::Nonterminal('B')]),
            Ok(Production::Step('0', 'B'))
        );
    }

    #[test]
    fn test_parse_malformed_alternative() {
        assert_eq!(parse_alternative(&[]), Err(CompileErrorType::EmptyAlternative));
        assert_eq!(
            parse_alternative(&[Token::Nonterminal('B')]),
            Err(CompileErrorType::MalformedAlternative("B".to_string()))
        );
        assert_eq!(
            parse_alternative(&[Token::Terminal('a'), Token::Terminal('b')]),
            Err(CompileErrorType::MalformedAlternative("ab".to_string()))
        );
        assert_eq!(
            parse_alternative(&[Token::Terminal('a'), Token::Arrow]),
            Err(CompileErrorType::UnexpectedArrow)
        );
    }

    #[test]
    fn test_parse_normal_line() {
        let tokens = lexer::lex_line("S -> aS | a | &").unwrap();
        let rule = parse_line(&tokens, Location::line(1)).unwrap();
        assert_eq!(
            rule,
            Rule {
                head: 'S',
                alternatives: alternatives(&[Production::Step('a', 'S'), Production::Terminal('a'), Production::Empty]),
                location: Location::line(1),
            }
        );
    }

    #[test]
    fn test_parse_malformed_line() {
        let parse = |text: &str| parse_line(&lexer::lex_line(text).unwrap(), Location::default());
        assert_eq!(parse(""), Err(CompileErrorType::MissingHead));
        assert_eq!(parse("a -> b"), Err(CompileErrorType::MissingHead));
        assert_eq!(parse("SA -> b"), Err(CompileErrorType::MissingArrow));
        assert_eq!(parse("S a"), Err(CompileErrorType::MissingArrow));
        assert_eq!(parse("S -> a |"), Err(CompileErrorType::EmptyAlternative));
    }

    #[test]
    fn test_parse_grammar() {
        let grammar = Grammar::parse("S -> aA | &\nA -> bA | b\n").unwrap();
        assert!(grammar.valid);
        assert_eq!(grammar.start, Some('S'));
        assert_eq!(grammar.nonterminals, ['S', 'A'].into_iter().collect::<IndexSet<Symbol>>());
        assert_eq!(grammar.terminals, ['a', EPSILON, 'b'].into_iter().collect::<IndexSet<Symbol>>());
        assert_eq!(grammar.productions[&'A'], alternatives(&[Production::Step('b', 'A'), Production::Terminal('b')]));
        assert!(grammar.derives_empty());
    }

    #[test]
    fn test_continuation_lines_and_repeated_heads() {
        let grammar = Grammar::parse("S -> aS |\n    b\n\nS -> c\n  | d").unwrap();
        assert_eq!(grammar.productions.len(), 1);
        assert_eq!(grammar.productions[&'S'].len(), 4);
        assert_eq!(grammar.to_string(), "S -> aS | b | c | d\n");
    }

    #[test]
    fn test_parse_malformed_grammar() {
        let errors = Grammar::parse("S -> aA\nA => b\nB -> bb").unwrap_err();
        assert_eq!(
            errors,
            vec![
                CompileError {
                    location: Location::line(2),
                    error: CompileErrorType::UnexpectedCharacter('='),
                },
                CompileError {
                    location: Location::line(3),
                    error: CompileErrorType::MalformedAlternative("bb".to_string()),
                },
            ]
        );
        assert_eq!(errors[0].kind(), ErrorKind::Syntax);

        assert_eq!(
            Grammar::parse("  \n\n").unwrap_err()[0].error,
            CompileErrorType::EmptyGrammar
        );
    }

    #[test]
    fn test_semantic_errors_invalidate_grammar() {
        let errors = Grammar::parse("S -> aA\nA -> &").unwrap_err();
        assert_eq!(errors[0].error, CompileErrorType::EpsilonOutsideStart('A'));
        assert_eq!(errors[0].kind(), ErrorKind::Semantic);

        let grammar = Grammar::from_text("S -> aS | &");
        assert!(!grammar.valid);
        assert_eq!(grammar.text, "S -> aS | &");
        assert!(grammar.productions.is_empty());
        assert_eq!(grammar.start, None);
    }
}
