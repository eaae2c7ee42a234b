//! Editor commands applied to an automaton in place.

use crate::automaton::{Automaton, AutomatonResult};
use crate::symbol::Symbol;

/// One user-triggered change to an automaton.
#[derive(Debug, Clone, Copy)]
pub enum Command<'a> {
    AddState(&'a str),
    DeleteState(&'a str),
    AddSymbol(Symbol),
    DeleteSymbol(Symbol),
    SetInitial(&'a str),
    AddFinal(&'a str),
    RemoveFinal(&'a str),
    UpdateTransition { state: &'a str, symbol: Symbol, text: &'a str },
    Determinize,
    Minimize,
    Union(&'a Automaton),
    Intersection(&'a Automaton),
}

impl Automaton {
    /// Apply a command and report whether anything changed.
    ///
    /// A failing command leaves the automaton as it was, except that a
    /// rejected transition text stays on its cell for display.
    pub fn apply(&mut self, command: Command<'_>) -> AutomatonResult<bool> {
        match command {
            Command::AddState(state) => self.add_state(state),
            Command::DeleteState(state) => Ok(self.delete_state(state)),
            Command::AddSymbol(symbol) => self.add_symbol(symbol),
            Command::DeleteSymbol(symbol) => Ok(self.delete_symbol(symbol)),
            Command::SetInitial(state) => {
                let changed = self.initial() != Some(state);
                self.set_initial(state)?;
                Ok(changed)
            }
            Command::AddFinal(state) => {
                let changed = !self.is_final(state);
                self.add_final(state)?;
                Ok(changed)
            }
            Command::RemoveFinal(state) => Ok(self.remove_final(state)),
            Command::UpdateTransition { state, symbol, text } => {
                self.update_transition(state, symbol, text)?;
                Ok(true)
            }
            Command::Determinize => self.replace_with(Ok(self.determinize())),
            Command::Minimize => self.replace_with(self.minimize()),
            Command::Union(other) => self.replace_with(self.union(other)),
            Command::Intersection(other) => self.replace_with(self.intersection(other)),
        }
    }

    fn replace_with(&mut self, result: AutomatonResult<Automaton>) -> AutomatonResult<bool> {
        let next = result?;
        let changed = *self != next;
        *self = next;
        Ok(changed)
    }
}
