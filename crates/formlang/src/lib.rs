//! Finite automata, right-regular grammars and regular expressions.
//!
//! This crate provides:
//! - An editable automaton model with epsilon closure and reachability
//! - Subset construction (NFA to DFA conversion)
//! - Moore's table-filling DFA minimization
//! - Union and intersection of DFAs
//! - Grammar <-> automaton conversion
//! - Direct regex to DFA compilation from position sets
//! - PyO3 bindings behind the `python` feature

pub mod automaton;
pub mod command;
pub mod error;
pub mod generator;
pub mod grammar;
mod minimize;
mod product;
#[cfg(feature = "python")]
mod python_bindings;
pub mod regex;
mod rename;
mod state;
mod subset_construction;
mod symbol;

pub use automaton::{Automaton, AutomatonError, AutomatonErrorType, AutomatonResult, Transition, ACCEPT_STATE};
pub use command::Command;
pub use error::{Error, ErrorKind, ErrorType, Location};
pub use grammar::{Grammar, Production};
#[cfg(feature = "python")]
pub use python_bindings::formlang;
pub use rename::LabelPool;
pub use state::{StateId, StateSet};
pub use symbol::{is_epsilon, is_nonterminal, is_terminal, Symbol, EPSILON};
