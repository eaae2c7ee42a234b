//! Finite automaton over string-labelled states.
//!
//! One structure serves both the nondeterministic automata produced from
//! grammars and the deterministic ones produced by the transforms: every
//! `(state, symbol)` cell holds a *set* of targets, and [`Automaton::is_determinized`]
//! records whether the last construction step guaranteed at most one.

use crate::error::{Error, ErrorKind, ErrorType};
use crate::state::{StateId, StateSet};
use crate::symbol::{is_epsilon, is_terminal, Symbol, EPSILON};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use std::collections::{BTreeSet, VecDeque};
use std::fmt::{self, Display};

/// Label of the accepting sentinel state added when compiling a grammar.
pub const ACCEPT_STATE: &str = "$";

#[derive(Debug, PartialEq)]
pub enum AutomatonErrorType {
    // The referenced state does not exist
    UnknownState(String),
    // The referenced symbol is not in the alphabet
    UnknownSymbol(Symbol),
    // Only terminals and the epsilon marker can be symbols
    InvalidSymbol(Symbol),
    // State labels are uppercase letters, digits and the accept sentinel
    InvalidStateLabel(String),
    // A transition cell was edited with text that is not a state list
    InvalidTransitionText(String),
    // The operation needs deterministic operands
    NotDeterministic(&'static str),
    // The operation needs an initial state
    MissingInitialState(&'static str),
    // The automaton accepts nothing, so there is nothing to express
    EmptyLanguage,
    // More states than single-letter nonterminals
    TooManyStates(usize),
    // More random words requested than one call hands out
    TooManySamples(usize),
}

impl ErrorType for AutomatonErrorType {
    fn kind(&self) -> ErrorKind {
        match self {
            AutomatonErrorType::UnknownState(_)
            | AutomatonErrorType::UnknownSymbol(_)
            | AutomatonErrorType::InvalidSymbol(_)
            | AutomatonErrorType::InvalidStateLabel(_)
            | AutomatonErrorType::InvalidTransitionText(_) => ErrorKind::IllFormedEdit,
            AutomatonErrorType::NotDeterministic(_)
            | AutomatonErrorType::MissingInitialState(_)
            | AutomatonErrorType::TooManyStates(_)
            | AutomatonErrorType::TooManySamples(_) => ErrorKind::Precondition,
            AutomatonErrorType::EmptyLanguage => ErrorKind::Semantic,
        }
    }
}

impl Display for AutomatonErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomatonErrorType::UnknownState(state) => write!(f, "No state named `{}`", state),
            AutomatonErrorType::UnknownSymbol(symbol) => write!(f, "Symbol `{}` is not in the alphabet", symbol),
            AutomatonErrorType::InvalidSymbol(symbol) => write!(f, "`{}` cannot be used as a symbol", symbol),
            AutomatonErrorType::InvalidStateLabel(label) => write!(f, "`{}` is not a valid state label", label),
            AutomatonErrorType::InvalidTransitionText(text) => {
                write!(f, "`{}` is not a comma-separated list of states", text)
            }
            AutomatonErrorType::NotDeterministic(operation) => {
                write!(f, "{} requires a deterministic automaton, determinize it first", operation)
            }
            AutomatonErrorType::MissingInitialState(operation) => {
                write!(f, "{} requires an initial state", operation)
            }
            AutomatonErrorType::EmptyLanguage => write!(f, "The automaton does not accept any word"),
            AutomatonErrorType::TooManyStates(count) => {
                write!(f, "{} states cannot be named with single-letter nonterminals", count)
            }
            AutomatonErrorType::TooManySamples(count) => {
                write!(f, "Cannot sample {} words, at most {} per call", count, crate::generator::MAX_SAMPLES)
            }
        }
    }
}

pub type AutomatonError = Error<AutomatonErrorType>;
pub type AutomatonResult<T> = Result<T, AutomatonError>;

/// One cell of the transition table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    targets: BTreeSet<String>,
    /// Raw text of the last edit that failed to parse, kept for display
    rejected: Option<String>,
}

impl Transition {
    pub fn targets(&self) -> &BTreeSet<String> {
        &self.targets
    }

    /// The single target of a deterministic cell.
    pub fn target(&self) -> Option<&str> {
        self.targets.iter().next().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected.is_some()
    }

    /// Display text: the sorted targets, `-` when there are none, or the raw
    /// text of a rejected edit.
    pub fn text(&self) -> String {
        match &self.rejected {
            Some(raw) => raw.clone(),
            None if self.targets.is_empty() => "-".to_string(),
            None => self.targets.iter().join(", "),
        }
    }
}

/// A finite automaton with string state labels and single-character symbols.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Automaton {
    states: IndexSet<String>,
    alphabet: IndexSet<Symbol>,
    /// Row per state, one cell per alphabet symbol
    transitions: IndexMap<String, IndexMap<Symbol, Transition>>,
    initial: Option<String>,
    finals: IndexSet<String>,
    determinized: bool,
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '$'
}

fn is_valid_label(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() || first == '$' => chars.all(is_label_char),
        _ => false,
    }
}

/// Parse the text of a transition cell: `-`, empty, or comma-separated labels.
/// Whitespace is ignored and a leading `-` is tolerated.
fn parse_targets(raw: &str) -> Option<BTreeSet<String>> {
    let text: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let text = text.strip_prefix('-').unwrap_or(&text);
    if text.is_empty() {
        return Some(BTreeSet::new());
    }

    let segments = text.split(',').collect_vec();
    if segments.first().is_some_and(|s| s.is_empty()) || segments.last().is_some_and(|s| s.is_empty()) {
        return None;
    }

    segments
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .map(|segment| is_valid_label(segment).then(|| segment.to_string()))
        .collect()
}

impl Automaton {
    /// Create a new empty automaton.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> &IndexSet<String> {
        &self.states
    }

    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.alphabet
    }

    pub fn initial(&self) -> Option<&str> {
        self.initial.as_deref()
    }

    pub fn finals(&self) -> &IndexSet<String> {
        &self.finals
    }

    pub fn is_final(&self, state: &str) -> bool {
        self.finals.contains(state)
    }

    /// Whether the last construction step produced a deterministic machine.
    pub fn is_determinized(&self) -> bool {
        self.determinized
    }

    pub(crate) fn set_determinized(&mut self, determinized: bool) {
        self.determinized = determinized;
    }

    /// Get the cell for a state on a symbol.
    pub fn transition(&self, state: &str, symbol: Symbol) -> Option<&Transition> {
        self.transitions.get(state).and_then(|row| row.get(&symbol))
    }

    /// Get all cells as an iterator, row by row.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, Symbol, &Transition)> + '_ {
        self.transitions
            .iter()
            .flat_map(|(state, row)| row.iter().map(move |(&symbol, cell)| (state.as_str(), symbol, cell)))
    }

    /// Targets of a state on a symbol; empty for unknown pairs.
    pub fn targets(&self, state: &str, symbol: Symbol) -> impl Iterator<Item = &str> + '_ {
        self.transition(state, symbol)
            .into_iter()
            .flat_map(|cell| cell.targets.iter().map(String::as_str))
    }

    /// Whether the state has at least one outgoing transition.
    pub fn has_outgoing(&self, state: &str) -> bool {
        self.transitions
            .get(state)
            .is_some_and(|row| row.values().any(|cell| !cell.is_empty()))
    }

    // Structural mutation used by the constructions. Labels are not checked.

    pub(crate) fn insert_state(&mut self, state: &str) -> bool {
        if self.states.contains(state) {
            return false;
        }
        self.states.insert(state.to_string());
        let row = self.alphabet.iter().map(|&symbol| (symbol, Transition::default())).collect();
        self.transitions.insert(state.to_string(), row);
        true
    }

    pub(crate) fn insert_symbol(&mut self, symbol: Symbol) -> bool {
        if !self.alphabet.insert(symbol) {
            return false;
        }
        for row in self.transitions.values_mut() {
            row.insert(symbol, Transition::default());
        }
        true
    }

    pub(crate) fn insert_final(&mut self, state: &str) {
        self.insert_state(state);
        self.finals.insert(state.to_string());
    }

    pub(crate) fn replace_initial(&mut self, state: Option<&str>) {
        if let Some(state) = state {
            self.insert_state(state);
        }
        self.initial = state.map(str::to_string);
    }

    /// Add a transition, creating the states and symbol as needed.
    pub(crate) fn add_transition(&mut self, source: &str, symbol: Symbol, destination: &str) {
        self.insert_state(source);
        self.insert_state(destination);
        self.insert_symbol(symbol);
        if let Some(cell) = self.transitions.get_mut(source).and_then(|row| row.get_mut(&symbol)) {
            cell.targets.insert(destination.to_string());
        }
    }

    // Editor operations

    /// Add a state. Returns `false` if it already exists.
    pub fn add_state(&mut self, state: &str) -> AutomatonResult<bool> {
        if !is_valid_label(state) {
            return Err(AutomatonError::new(AutomatonErrorType::InvalidStateLabel(state.to_string())));
        }
        Ok(self.insert_state(state))
    }

    /// Delete a state, pruning every reference to it.
    pub fn delete_state(&mut self, state: &str) -> bool {
        if !self.states.shift_remove(state) {
            return false;
        }
        self.transitions.shift_remove(state);
        for cell in self.transitions.values_mut().flat_map(|row| row.values_mut()) {
            cell.targets.remove(state);
        }
        self.finals.shift_remove(state);
        if self.initial.as_deref() == Some(state) {
            self.initial = None;
        }
        true
    }

    /// Add a symbol (a terminal or the epsilon marker).
    pub fn add_symbol(&mut self, symbol: Symbol) -> AutomatonResult<bool> {
        if !is_terminal(symbol) && !is_epsilon(symbol) {
            return Err(AutomatonError::new(AutomatonErrorType::InvalidSymbol(symbol)));
        }
        Ok(self.insert_symbol(symbol))
    }

    /// Delete a symbol and its column.
    pub fn delete_symbol(&mut self, symbol: Symbol) -> bool {
        if !self.alphabet.shift_remove(&symbol) {
            return false;
        }
        for row in self.transitions.values_mut() {
            row.shift_remove(&symbol);
        }
        true
    }

    fn require_state(&self, state: &str) -> AutomatonResult<()> {
        if self.states.contains(state) {
            Ok(())
        } else {
            Err(AutomatonError::new(AutomatonErrorType::UnknownState(state.to_string())))
        }
    }

    pub fn set_initial(&mut self, state: &str) -> AutomatonResult<()> {
        self.require_state(state)?;
        self.initial = Some(state.to_string());
        Ok(())
    }

    pub fn add_final(&mut self, state: &str) -> AutomatonResult<()> {
        self.require_state(state)?;
        self.finals.insert(state.to_string());
        Ok(())
    }

    pub fn remove_final(&mut self, state: &str) -> bool {
        self.finals.shift_remove(state)
    }

    /// Replace the targets of one cell from free-form text such as `A, B`.
    ///
    /// Text that does not parse is kept on the cell for display and the
    /// previous targets stay in place. Referenced states that do not exist
    /// yet are created. Any successful edit clears the determinized flag.
    pub fn update_transition(&mut self, state: &str, symbol: Symbol, raw: &str) -> AutomatonResult<()> {
        self.require_state(state)?;
        if !self.alphabet.contains(&symbol) {
            return Err(AutomatonError::new(AutomatonErrorType::UnknownSymbol(symbol)));
        }

        let Some(targets) = parse_targets(raw) else {
            if let Some(cell) = self.transitions.get_mut(state).and_then(|row| row.get_mut(&symbol)) {
                cell.rejected = Some(raw.to_string());
            }
            return Err(AutomatonError::new(AutomatonErrorType::InvalidTransitionText(raw.to_string())));
        };

        for target in &targets {
            self.insert_state(target);
        }
        if let Some(cell) = self.transitions.get_mut(state).and_then(|row| row.get_mut(&symbol)) {
            cell.targets = targets;
            cell.rejected = None;
        }
        self.determinized = false;
        Ok(())
    }

    // Queries

    pub fn has_epsilon_transition(&self) -> bool {
        self.alphabet.contains(&EPSILON)
    }

    /// Check if no cell has more than one target and no epsilon move is used.
    pub fn is_deterministic(&self) -> bool {
        self.transitions()
            .all(|(_, symbol, cell)| cell.targets.len() <= 1 && (!is_epsilon(symbol) || cell.is_empty()))
    }

    /// Check if some cell has no target (the transition function is partial).
    pub fn has_undefined_transition(&self) -> bool {
        self.transitions().any(|(_, _, cell)| cell.is_empty())
    }

    pub(crate) fn state_id(&self, state: &str) -> Option<StateId> {
        self.states.get_index_of(state).map(|idx| idx as StateId)
    }

    pub(crate) fn state_label(&self, id: StateId) -> Option<&str> {
        self.states.get_index(id as usize).map(String::as_str)
    }

    fn target_ids(&self, state: &str, symbol: Symbol) -> impl Iterator<Item = StateId> + '_ {
        self.targets(state, symbol).filter_map(|target| self.state_id(target))
    }

    /// Compute the epsilon closure of a single state using DFS.
    pub(crate) fn epsilon_closure_ids(&self, state: StateId) -> StateSet {
        let mut closure = StateSet::with_capacity(self.states.len());
        let mut stack = vec![state];

        while let Some(s) = stack.pop() {
            if !closure.insert(s) {
                continue;
            }
            let Some(label) = self.state_label(s) else {
                continue;
            };
            for dest in self.target_ids(label, EPSILON) {
                if !closure.contains(dest) {
                    stack.push(dest);
                }
            }
        }

        closure
    }

    /// Epsilon-closed successors of a set of states on one symbol.
    pub(crate) fn step_ids(&self, current: &StateSet, symbol: Symbol) -> StateSet {
        let mut next = StateSet::with_capacity(self.states.len());
        for label in current.iter().filter_map(|id| self.state_label(id)) {
            for target in self.target_ids(label, symbol) {
                next.union_with(&self.epsilon_closure_ids(target));
            }
        }
        next
    }

    pub(crate) fn contains_final(&self, set: &StateSet) -> bool {
        set.iter()
            .filter_map(|id| self.state_label(id))
            .any(|label| self.finals.contains(label))
    }

    fn labels_of(&self, set: &StateSet) -> BTreeSet<String> {
        set.iter()
            .filter_map(|id| self.state_label(id))
            .map(str::to_string)
            .collect()
    }

    /// States reachable from `state` using only epsilon moves, itself included.
    pub fn epsilon_closure(&self, state: &str) -> BTreeSet<String> {
        match self.state_id(state) {
            Some(id) => self.labels_of(&self.epsilon_closure_ids(id)),
            None => BTreeSet::new(),
        }
    }

    /// States reachable from `state` over any symbol, itself included.
    pub fn reachable_states(&self, state: &str) -> BTreeSet<String> {
        let Some(start) = self.state_id(state) else {
            return BTreeSet::new();
        };

        let mut visited = StateSet::with_capacity(self.states.len());
        let mut queue = VecDeque::from([start]);

        while let Some(s) = queue.pop_front() {
            if !visited.insert(s) {
                continue;
            }
            let Some(label) = self.state_label(s) else {
                continue;
            };
            for &symbol in &self.alphabet {
                for next in self.target_ids(label, symbol) {
                    if !visited.contains(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        self.labels_of(&visited)
    }

    /// States from which some final state can be reached (backwards BFS).
    pub(crate) fn coreachable_ids(&self) -> StateSet {
        let mut predecessors: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
        for (source, _, cell) in self.transitions() {
            let Some(source) = self.state_id(source) else {
                continue;
            };
            for target in cell.targets.iter().filter_map(|t| self.state_id(t)) {
                predecessors[target as usize].push(source);
            }
        }

        let mut visited = StateSet::with_capacity(self.states.len());
        let mut queue: VecDeque<StateId> = self.finals.iter().filter_map(|f| self.state_id(f)).collect();
        while let Some(s) = queue.pop_front() {
            if !visited.insert(s) {
                continue;
            }
            queue.extend(predecessors[s as usize].iter().copied().filter(|&p| !visited.contains(p)));
        }
        visited
    }

    /// Labels of the states that can reach a final state.
    pub fn coreachable_states(&self) -> BTreeSet<String> {
        self.labels_of(&self.coreachable_ids())
    }

    /// Drop symbols that no cell uses.
    pub fn prune_unused_symbols(&mut self) {
        let unused = self
            .alphabet
            .iter()
            .copied()
            .filter(|&symbol| self.transitions.values().all(|row| row.get(&symbol).is_none_or(Transition::is_empty)))
            .collect_vec();
        for symbol in unused {
            self.delete_symbol(symbol);
        }
    }

    /// Remove states with no path to a final state, then unused symbols.
    pub fn remove_useless_states(&mut self) {
        let live = self.coreachable_states();
        let dead = self.states.iter().filter(|s| !live.contains(*s)).cloned().collect_vec();
        for state in dead {
            self.delete_state(&state);
        }
        self.prune_unused_symbols();
    }

    /// Remove states that cannot be reached from the initial state.
    pub fn remove_unreachable_states(&mut self) {
        let reachable = match &self.initial {
            Some(initial) => self.reachable_states(initial),
            None => BTreeSet::new(),
        };
        let unreachable = self.states.iter().filter(|s| !reachable.contains(*s)).cloned().collect_vec();
        for state in unreachable {
            self.delete_state(&state);
        }
    }

    /// Check that the automaton is usable: once states that cannot reach a
    /// final state are pruned, an initial state and a final state remain.
    pub fn is_valid(&self) -> bool {
        let mut pruned = self.clone();
        pruned.remove_useless_states();
        pruned.initial.is_some() && !pruned.finals.is_empty()
    }

    /// Check if the automaton's language is empty.
    pub fn is_empty(&self) -> bool {
        match &self.initial {
            Some(initial) => self.reachable_states(initial).iter().all(|s| !self.finals.contains(s)),
            None => true,
        }
    }

    /// Simulate the automaton on a word, following epsilon moves.
    pub fn accepts(&self, word: &str) -> bool {
        let Some(initial) = self.initial.as_deref().and_then(|s| self.state_id(s)) else {
            return false;
        };

        let mut current = self.epsilon_closure_ids(initial);
        for symbol in word.chars() {
            if is_epsilon(symbol) || !self.alphabet.contains(&symbol) {
                return false;
            }
            let next = self.step_ids(&current, symbol);
            if next.is_empty() {
                return false;
            }
            current = next;
        }

        self.contains_final(&current)
    }

    /// Rewrite every state label through `mapping`. Labels missing from the
    /// mapping are kept. The mapping must be injective on the live states.
    pub(crate) fn relabel(&mut self, mapping: &IndexMap<String, String>) {
        let rename = |label: &String| mapping.get(label).cloned().unwrap_or_else(|| label.clone());

        self.states = self.states.iter().map(rename).collect();
        self.transitions = self
            .transitions
            .drain(..)
            .map(|(state, row)| {
                let row = row
                    .into_iter()
                    .map(|(symbol, cell)| {
                        let targets = cell.targets.iter().map(rename).collect();
                        (symbol, Transition { targets, rejected: cell.rejected })
                    })
                    .collect();
                (rename(&state), row)
            })
            .collect();
        self.finals = self.finals.iter().map(rename).collect();
        self.initial = self.initial.as_ref().map(rename);
    }

    /// Render the automaton as a Graphviz DOT digraph.
    pub fn to_dot(&self) -> String {
        let mut edges: IndexMap<(&str, &str), Vec<Symbol>> = IndexMap::new();
        for (source, symbol, cell) in self.transitions() {
            for target in &cell.targets {
                edges.entry((source, target.as_str())).or_default().push(symbol);
            }
        }

        let mut dot = String::from("digraph automaton {\n    rankdir=LR;\n");
        if !self.finals.is_empty() {
            let finals = self.finals.iter().map(|f| format!("\"{}\"", f)).join(" ");
            dot.push_str(&format!("    node [shape = doublecircle]; {};\n", finals));
        }
        dot.push_str("    node [shape = circle];\n");
        for state in self.states.iter().filter(|s| !self.finals.contains(*s)) {
            dot.push_str(&format!("    \"{}\";\n", state));
        }
        if let Some(initial) = &self.initial {
            dot.push_str("    start [shape = point];\n");
            dot.push_str(&format!("    start -> \"{}\";\n", initial));
        }
        for ((source, target), symbols) in edges {
            dot.push_str(&format!(
                "    \"{}\" -> \"{}\" [label = \"{}\"];\n",
                source,
                target,
                symbols.iter().join(", ")
            ));
        }
        dot.push('}');
        dot
    }
}

impl Display for Automaton {
    /// Transition table: `->` marks the initial state, `*` the final ones.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = std::iter::once("δ".to_string())
            .chain(self.alphabet.iter().map(|s| s.to_string()))
            .collect_vec();
        let rows = self
            .states
            .iter()
            .map(|state| {
                let mut marker = String::new();
                if self.initial.as_ref() == Some(state) {
                    marker.push_str("->");
                }
                if self.finals.contains(state) {
                    marker.push('*');
                }
                std::iter::once(format!("{}{}", marker, state))
                    .chain(
                        self.alphabet
                            .iter()
                            .map(|&symbol| self.transition(state, symbol).map_or_else(|| "-".to_string(), Transition::text)),
                    )
                    .collect_vec()
            })
            .collect_vec();

        let widths = (0..header.len())
            .map(|col| {
                std::iter::once(&header)
                    .chain(rows.iter())
                    .map(|row| row[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect_vec();

        for row in std::iter::once(&header).chain(rows.iter()) {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{:>width$}", cell, width = width))
                .join(" | ");
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
