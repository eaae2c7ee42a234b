/*
    This module compiles regular expressions straight to a DFA
*/

mod parser;
mod tree;

use std::collections::VecDeque;
use std::fmt::{self, Display};

use crate::automaton::Automaton;
use crate::error::{Error, ErrorKind, ErrorType};
use crate::state::StateSet;
use indexmap::IndexMap;
use itertools::Itertools;

pub use parser::{parse, Expr};
pub use tree::{Node, NodeKind, Position, SyntaxTree};

#[derive(Debug, PartialEq)]
pub enum RegexErrorType {
    // Only lowercase letters, digits, `(`, `)`, `*` and `|` are accepted
    UnsupportedCharacter(char),
    // `(` without a matching `)`
    UnbalancedParenthesis,
    // `)` without a matching `(`
    UnexpectedParenthesis,
    // `*` with nothing to repeat
    DanglingStar,
}

impl ErrorType for RegexErrorType {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Syntax
    }
}

impl Display for RegexErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegexErrorType::UnsupportedCharacter(c) => write!(f, "Unsupported character `{}`", c),
            RegexErrorType::UnbalancedParenthesis => write!(f, "This `(` is never closed"),
            RegexErrorType::UnexpectedParenthesis => write!(f, "This `)` has no matching `(`"),
            RegexErrorType::DanglingStar => write!(f, "`*` must follow a symbol or a group"),
        }
    }
}

pub type RegexError = Error<RegexErrorType>;
pub type RegexResult<T> = Result<T, RegexError>;

// Display key of a DFA state before renaming
fn position_label(positions: &StateSet) -> String {
    format!("{{{}}}", positions.iter().join(","))
}

impl SyntaxTree {
    /// Build the DFA whose states are sets of positions.
    ///
    /// The initial state is `firstpos(root)`; moving on `a` from a state
    /// unions `followpos(p)` over its positions `p` labelled `a`. A state is
    /// final when it holds the end marker.
    pub fn to_dfa(&self) -> Automaton {
        let mut dfa = Automaton::new();
        for &symbol in self.alphabet() {
            dfa.insert_symbol(symbol);
        }

        let mut labels: IndexMap<Vec<Position>, String> = IndexMap::new();
        let mut worklist: VecDeque<(StateSet, String)> = VecDeque::new();

        let mut discover = |dfa: &mut Automaton, set: StateSet, worklist: &mut VecDeque<(StateSet, String)>| {
            let key = set.to_vec();
            if let Some(label) = labels.get(&key) {
                return label.clone();
            }
            let label = position_label(&set);
            dfa.insert_state(&label);
            if set.contains(self.end) {
                dfa.insert_final(&label);
            }
            labels.insert(key, label.clone());
            worklist.push_back((set, label.clone()));
            label
        };

        let initial = discover(&mut dfa, self.root.firstpos.clone(), &mut worklist);
        dfa.replace_initial(Some(&initial));

        while let Some((current, source)) = worklist.pop_front() {
            for &symbol in self.alphabet() {
                let mut next = StateSet::with_capacity(self.positions());
                for position in current.iter().filter(|&p| self.symbol(p) == Some(symbol)) {
                    if let Some(follow) = self.followpos(position) {
                        next.union_with(follow);
                    }
                }
                if next.is_empty() {
                    continue;
                }

                let target = discover(&mut dfa, next, &mut worklist);
                dfa.add_transition(&source, symbol, &target);
            }
        }

        dfa.rename_states();
        dfa.set_determinized(true);
        dfa
    }
}

/// Compile a regular expression into a deterministic automaton.
pub fn compile(text: &str) -> RegexResult<Automaton> {
    let expr = parse(text)?;
    Ok(SyntaxTree::new(&expr).to_dfa())
}
