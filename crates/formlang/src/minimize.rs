//! DFA minimization by Moore's table-filling method.

use crate::automaton::{Automaton, AutomatonError, AutomatonErrorType, AutomatonResult};
use crate::rename::LabelPool;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Symmetric table of distinguishable state pairs with wait-lists.
struct Distinguishability {
    marked: Vec<Vec<bool>>,
    /// Pairs to mark as soon as the key pair gets marked
    waiting: HashMap<(usize, usize), Vec<(usize, usize)>>,
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Distinguishability {
    fn new(size: usize) -> Self {
        Self {
            marked: vec![vec![false; size]; size],
            waiting: HashMap::new(),
        }
    }

    fn is_marked(&self, a: usize, b: usize) -> bool {
        self.marked[a][b]
    }

    /// Mark a pair and everything transitively waiting on it.
    fn mark(&mut self, a: usize, b: usize) {
        let mut stack = vec![ordered(a, b)];
        while let Some((x, y)) = stack.pop() {
            if self.marked[x][y] {
                continue;
            }
            self.marked[x][y] = true;
            self.marked[y][x] = true;
            if let Some(waiting) = self.waiting.remove(&(x, y)) {
                stack.extend(waiting);
            }
        }
    }

    fn wait_on(&mut self, pair: (usize, usize), dependent: (usize, usize)) {
        self.waiting.entry(ordered(pair.0, pair.1)).or_default().push(dependent);
    }
}

impl Automaton {
    /// Minimize a deterministic automaton.
    ///
    /// Useless states are dropped and the transition function is completed
    /// with a temporary sink so that every pair of states can be compared.
    /// The sink is removed again once equivalence classes are known.
    pub fn minimize(&self) -> AutomatonResult<Automaton> {
        if !self.is_determinized() {
            return Err(AutomatonError::new(AutomatonErrorType::NotDeterministic("Minimization")));
        }

        let mut dfa = self.clone();
        dfa.remove_unreachable_states();
        dfa.remove_useless_states();
        if dfa.initial().is_none() {
            let mut empty = Automaton::new();
            empty.set_determinized(true);
            return Ok(empty);
        }

        let sink = if dfa.has_undefined_transition() {
            let sink = LabelPool::excluding(dfa.states()).take();
            dfa.insert_state(&sink);
            let alphabet = dfa.alphabet().clone();
            let states = dfa.states().clone();
            for state in &states {
                for &symbol in &alphabet {
                    if dfa.transition(state, symbol).is_some_and(|cell| cell.is_empty()) {
                        dfa.add_transition(state, symbol, &sink);
                    }
                }
            }
            Some(sink)
        } else {
            None
        };

        let states = dfa.states().clone();
        let size = states.len();
        let index = |label: &str| states.get_index_of(label);

        // successor[state][symbol] over the now total transition function
        let successors: Vec<Vec<Option<usize>>> = states
            .iter()
            .map(|state| {
                dfa.alphabet()
                    .iter()
                    .map(|&symbol| dfa.transition(state, symbol).and_then(|cell| cell.target()).and_then(index))
                    .collect()
            })
            .collect();

        let mut table = Distinguishability::new(size);
        for u in 0..size {
            for v in (u + 1)..size {
                if dfa.is_final(&states[u]) != dfa.is_final(&states[v]) {
                    table.mark(u, v);
                }
            }
        }

        for u in 0..size {
            for v in (u + 1)..size {
                if table.is_marked(u, v) {
                    continue;
                }
                let pairs: Vec<(usize, usize)> = successors[u]
                    .iter()
                    .zip(&successors[v])
                    .filter_map(|(pu, pv)| match (pu, pv) {
                        (Some(pu), Some(pv)) if pu != pv => Some((*pu, *pv)),
                        _ => None,
                    })
                    .collect();

                if pairs.iter().any(|&(pu, pv)| table.is_marked(pu, pv)) {
                    table.mark(u, v);
                } else {
                    for pair in pairs {
                        table.wait_on(pair, (u, v));
                    }
                }
            }
        }

        // Non-distinguishability is an equivalence; the lowest member represents its class
        let representative: Vec<usize> = (0..size)
            .map(|u| (0..=u).find(|&v| v == u || !table.is_marked(v, u)).unwrap_or(u))
            .collect();

        let mut classes: IndexMap<usize, String> = IndexMap::new();
        for (u, &rep) in representative.iter().enumerate() {
            if rep == u {
                classes.insert(u, states[u].clone());
            }
        }
        let class_of = |u: usize| classes.get(&representative[u]).cloned().unwrap_or_default();

        let mut minimized = Automaton::new();
        for &symbol in dfa.alphabet() {
            minimized.insert_symbol(symbol);
        }
        for label in classes.values() {
            minimized.insert_state(label);
        }
        for (&rep, label) in &classes {
            for (symbol_idx, &symbol) in dfa.alphabet().iter().enumerate() {
                if let Some(target) = successors[rep][symbol_idx] {
                    minimized.add_transition(label, symbol, &class_of(target));
                }
            }
            if dfa.is_final(&states[rep]) {
                minimized.insert_final(label);
            }
        }
        let initial = dfa.initial().and_then(index).map(class_of);
        minimized.replace_initial(initial.as_deref());

        // Every real state reaches a final state, so the sink is alone in its class
        if let Some(sink) = sink.as_deref().and_then(index).map(class_of) {
            minimized.delete_state(&sink);
        }

        minimized.rename_states();
        minimized.set_determinized(true);
        Ok(minimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn assert_same_language(a: &Automaton, b: &Automaton) {
        let alphabet: Vec<char> = a.alphabet().iter().chain(b.alphabet()).copied().collect();
        let mut frontier = vec![String::new()];
        for _ in 0..6 {
            for word in &frontier {
                assert_eq!(a.accepts(word), b.accepts(word), "disagree on {:?}", word);
            }
            frontier = frontier
                .iter()
                .flat_map(|w| alphabet.iter().map(move |c| format!("{}{}", w, c)))
                .collect();
        }
    }

    #[test]
    fn test_dfa_minimization() {
        // 0 -a-> 1 -b-> 3(final)
        // 0 -b-> 2 -b-> 4(final)
        // 1 and 2 should be merged, as should 3 and 4
        let mut dfa = Automaton::new();
        dfa.add_transition("S", 'a', "A");
        dfa.add_transition("S", 'b', "B");
        dfa.add_transition("A", 'b', "C");
        dfa.add_transition("B", 'b', "D");
        dfa.set_initial("S").unwrap();
        dfa.add_final("C").unwrap();
        dfa.add_final("D").unwrap();
        dfa.set_determinized(true);

        let minimized = dfa.minimize().unwrap();

        assert_eq!(minimized.states().len(), 3);
        assert!(minimized.is_determinized());
        assert_same_language(&dfa, &minimized);
    }

    #[test]
    fn test_minimization_is_idempotent() {
        // (a|b)*abb, written with redundant states
        let mut dfa = Automaton::new();
        for (from, symbol, to) in [
            ("A", 'a', "B"),
            ("A", 'b', "C"),
            ("B", 'a', "B"),
            ("B", 'b', "D"),
            ("C", 'a', "B"),
            ("C", 'b', "C"),
            ("D", 'a', "B"),
            ("D", 'b', "E"),
            ("E", 'a', "B"),
            ("E", 'b', "C"),
        ] {
            dfa.add_transition(from, symbol, to);
        }
        dfa.set_initial("A").unwrap();
        dfa.add_final("E").unwrap();
        dfa.set_determinized(true);

        let once = dfa.minimize().unwrap();
        let twice = once.minimize().unwrap();
        assert_eq!(once.states().len(), 4);
        assert_eq!(twice.states().len(), once.states().len());
        assert_same_language(&dfa, &once);
        assert!(once.accepts("babb"));
        assert!(!once.accepts("abbb"));
    }

    #[test]
    fn test_sink_is_removed() {
        // a* b with a partial transition function
        let mut dfa = Automaton::new();
        dfa.add_transition("A", 'a', "A");
        dfa.add_transition("A", 'b', "B");
        dfa.set_initial("A").unwrap();
        dfa.add_final("B").unwrap();
        dfa.set_determinized(true);

        let minimized = dfa.minimize().unwrap();
        assert_eq!(minimized.states().len(), 2);
        assert!(minimized.has_undefined_transition());
        assert_same_language(&dfa, &minimized);
    }

    #[test]
    fn test_unreachable_and_dead_states_are_dropped() {
        let mut dfa = Automaton::new();
        dfa.add_transition("A", 'a', "B");
        dfa.add_transition("A", 'b', "D");
        dfa.add_transition("U", 'a', "B");
        dfa.set_initial("A").unwrap();
        dfa.add_final("B").unwrap();
        dfa.set_determinized(true);

        let minimized = dfa.minimize().unwrap();
        assert_eq!(minimized.states().len(), 2);
        assert!(minimized.states().len() <= dfa.states().len());
        assert!(minimized.accepts("a"));
    }

    #[test]
    fn test_minimize_requires_determinized() {
        let mut nfa = Automaton::new();
        nfa.add_transition("A", 'a', "B");
        nfa.set_initial("A").unwrap();

        let err = nfa.minimize().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_empty_language() {
        let mut dfa = Automaton::new();
        dfa.add_transition("A", 'a', "B");
        dfa.set_initial("A").unwrap();
        dfa.set_determinized(true);

        let minimized = dfa.minimize().unwrap();
        assert!(minimized.states().is_empty());
        assert!(minimized.is_empty());
    }
}
