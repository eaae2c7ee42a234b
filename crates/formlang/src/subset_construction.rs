//! Subset construction with epsilon elimination.

use crate::automaton::Automaton;
use crate::state::{StateId, StateSet};
use crate::symbol::is_epsilon;
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::VecDeque;

/// Display key of a composite state: its members' labels, sorted and
/// concatenated. Membership itself is tracked by the id vector.
fn composite_label(nfa: &Automaton, members: &StateSet) -> String {
    members
        .iter()
        .filter_map(|id| nfa.state_label(id))
        .sorted()
        .join("")
}

impl Automaton {
    /// Convert to an equivalent deterministic automaton.
    ///
    /// Composite states are epsilon-closed sets of original states. States
    /// that cannot reach a final state are dropped along with unused symbols,
    /// and the survivors are renamed to single letters.
    pub fn determinize(&self) -> Automaton {
        let mut dfa = Automaton::new();
        dfa.set_determinized(true);

        let symbols = self.alphabet().iter().copied().filter(|&s| !is_epsilon(s)).collect_vec();
        for &symbol in &symbols {
            dfa.insert_symbol(symbol);
        }

        let Some(initial) = self.initial().and_then(|s| self.state_id(s)) else {
            return dfa;
        };

        // Each state is its own closure when there are no epsilon moves
        let closures: Vec<StateSet> = (0..self.states().len() as StateId)
            .map(|id| {
                if self.has_epsilon_transition() {
                    self.epsilon_closure_ids(id)
                } else {
                    StateSet::singleton(id, self.states().len())
                }
            })
            .collect();

        let finals: StateSet = self.finals().iter().filter_map(|f| self.state_id(f)).collect();

        // Maps the sorted member ids of each DFA state to its label
        let mut labels: IndexMap<Vec<StateId>, String> = IndexMap::new();
        let mut worklist: VecDeque<(StateSet, String)> = VecDeque::new();

        let mut discover = |dfa: &mut Automaton, set: StateSet, worklist: &mut VecDeque<(StateSet, String)>| {
            let key = set.to_vec();
            if let Some(label) = labels.get(&key) {
                return label.clone();
            }
            let mut label = composite_label(self, &set);
            while dfa.states().contains(&label) {
                label.push('\'');
            }
            dfa.insert_state(&label);
            if set.intersects(&finals) {
                dfa.insert_final(&label);
            }
            labels.insert(key, label.clone());
            worklist.push_back((set, label.clone()));
            label
        };

        let initial_label = discover(&mut dfa, closures[initial as usize].clone(), &mut worklist);
        dfa.replace_initial(Some(&initial_label));

        while let Some((current, source)) = worklist.pop_front() {
            for &symbol in &symbols {
                let mut next = StateSet::with_capacity(self.states().len());
                for member in current.iter().filter_map(|id| self.state_label(id)) {
                    for target in self.targets(member, symbol).filter_map(|t| self.state_id(t)) {
                        next.union_with(&closures[target as usize]);
                    }
                }

                if next.is_empty() {
                    // No transition on this symbol - the DFA stays partial
                    continue;
                }

                let target = discover(&mut dfa, next, &mut worklist);
                dfa.add_transition(&source, symbol, &target);
            }
        }

        dfa.remove_useless_states();
        dfa.rename_states();
        dfa.set_determinized(true);
        dfa
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::EPSILON;

    fn words(alphabet: &[char], max_len: usize) -> Vec<String> {
        let mut all = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..max_len {
            frontier = frontier
                .iter()
                .flat_map(|w| alphabet.iter().map(move |c| format!("{}{}", w, c)))
                .collect();
            all.extend(frontier.iter().cloned());
        }
        all
    }

    fn assert_same_language(a: &Automaton, b: &Automaton, alphabet: &[char]) {
        for word in words(alphabet, 6) {
            assert_eq!(a.accepts(&word), b.accepts(&word), "disagree on {:?}", word);
        }
    }

    #[test]
    fn test_subset_construction_basic() {
        // S -a-> {S, $}, final $
        let mut nfa = Automaton::new();
        nfa.add_transition("S", 'a', "S");
        nfa.add_transition("S", 'a', "$");
        nfa.set_initial("S").unwrap();
        nfa.add_final("$").unwrap();

        let dfa = nfa.determinize();

        assert!(dfa.is_determinized());
        assert!(dfa.is_deterministic());
        assert_eq!(dfa.states().len(), 2);
        assert!(dfa.accepts("a"));
        assert!(dfa.accepts("aa"));
        assert!(dfa.accepts("aaa"));
        assert!(!dfa.accepts(""));
        assert!(!dfa.accepts("b"));
        assert!(dfa.states().iter().all(|s| s.len() == 1));
    }

    #[test]
    fn test_subset_construction_with_epsilon() {
        // 0 -ε-> 1 -a-> 2(final), 0 -b-> 0
        let mut nfa = Automaton::new();
        nfa.add_transition("P", EPSILON, "Q");
        nfa.add_transition("Q", 'a', "R");
        nfa.add_transition("P", 'b', "P");
        nfa.set_initial("P").unwrap();
        nfa.add_final("R").unwrap();

        let dfa = nfa.determinize();

        assert!(!dfa.alphabet().contains(&EPSILON));
        assert!(dfa.is_deterministic());
        assert_same_language(&nfa, &dfa, &['a', 'b']);
    }

    #[test]
    fn test_dead_states_are_pruned() {
        let mut nfa = Automaton::new();
        nfa.add_transition("S", 'a', "A");
        nfa.add_transition("S", 'b', "D");
        nfa.add_transition("D", 'c', "D");
        nfa.set_initial("S").unwrap();
        nfa.add_final("A").unwrap();

        let dfa = nfa.determinize();
        assert_eq!(dfa.states().len(), 2);
        assert_eq!(dfa.alphabet().len(), 1);
        assert!(dfa.accepts("a"));
    }

    #[test]
    fn test_epsilon_cycle() {
        let mut nfa = Automaton::new();
        nfa.add_transition("A", EPSILON, "B");
        nfa.add_transition("B", EPSILON, "A");
        nfa.add_transition("B", 'x', "C");
        nfa.add_transition("C", EPSILON, "A");
        nfa.set_initial("A").unwrap();
        nfa.add_final("C").unwrap();

        let dfa = nfa.determinize();
        assert_same_language(&nfa, &dfa, &['x']);
        assert!(dfa.accepts("xxx"));
    }

    #[test]
    fn test_empty_nfa() {
        let nfa = Automaton::new();
        let dfa = nfa.determinize();
        assert!(dfa.initial().is_none());
        assert!(dfa.is_determinized());
    }
}
