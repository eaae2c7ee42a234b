//! Union and intersection of deterministic automata.

use crate::automaton::{Automaton, AutomatonError, AutomatonErrorType, AutomatonResult};
use crate::rename::LabelPool;
use crate::symbol::EPSILON;
use indexmap::IndexMap;

fn require_deterministic(operation: &'static str, operands: [&Automaton; 2]) -> AutomatonResult<()> {
    if operands.iter().all(|fa| fa.is_determinized()) {
        Ok(())
    } else {
        Err(AutomatonError::new(AutomatonErrorType::NotDeterministic(operation)))
    }
}

impl Automaton {
    /// Union with another deterministic automaton.
    ///
    /// `self` is renamed apart from `other`, both are joined under a fresh
    /// initial state with epsilon moves, and every final state moves by
    /// epsilon into a single fresh final state. The result contains epsilon
    /// transitions, so it is not marked determinized.
    pub fn union(&self, other: &Automaton) -> AutomatonResult<Automaton> {
        require_deterministic("Union", [self, other])?;

        let mut result = self.clone();
        let mut pool = LabelPool::excluding(other.states());
        result.rename_states_with(&mut pool);

        for &symbol in other.alphabet() {
            result.insert_symbol(symbol);
        }
        for state in other.states() {
            result.insert_state(state);
        }
        for (state, symbol, cell) in other.transitions() {
            for target in cell.targets() {
                result.add_transition(state, symbol, target);
            }
        }

        let initials: Vec<String> = [result.initial(), other.initial()]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        let finals: Vec<String> = result.finals().iter().chain(other.finals()).cloned().collect();

        let start = pool.take();
        result.insert_state(&start);
        result.insert_symbol(EPSILON);
        for initial in &initials {
            result.add_transition(&start, EPSILON, initial);
        }
        result.replace_initial(Some(&start));

        let accept = pool.take();
        result.insert_state(&accept);
        for state in &finals {
            result.add_transition(state, EPSILON, &accept);
            result.remove_final(state);
        }
        result.insert_final(&accept);

        result.set_determinized(false);
        Ok(result)
    }

    /// Intersection with another deterministic automaton (product construction).
    ///
    /// Every ordered pair of states reachable from the pair of initial
    /// states becomes a state; the alphabet is the symbols both operands
    /// share. The product of two deterministic automata is deterministic,
    /// so the result stays determinized.
    pub fn intersection(&self, other: &Automaton) -> AutomatonResult<Automaton> {
        require_deterministic("Intersection", [self, other])?;

        let mut result = Automaton::new();
        for &symbol in self.alphabet().iter().filter(|s| other.alphabet().contains(*s)) {
            result.insert_symbol(symbol);
        }

        // Pair labels are display keys; collisions such as "A"+"BC" / "AB"+"C" get primed
        let mut labels: IndexMap<(&str, &str), String> = IndexMap::new();
        for x in self.states() {
            for y in other.states() {
                let mut label = format!("{}{}", x, y);
                while result.states().contains(&label) {
                    label.push('\'');
                }
                result.insert_state(&label);
                labels.insert((x.as_str(), y.as_str()), label);
            }
        }

        let symbols: Vec<char> = result.alphabet().iter().copied().collect();
        for ((x, y), label) in &labels {
            for &symbol in &symbols {
                let pair = self
                    .transition(x, symbol)
                    .and_then(|cell| cell.target())
                    .zip(other.transition(y, symbol).and_then(|cell| cell.target()));
                if let Some(target) = pair.and_then(|pair| labels.get(&pair)) {
                    result.add_transition(label, symbol, target);
                }
            }
            if self.is_final(x) && other.is_final(y) {
                result.insert_final(label);
            }
        }

        let initial = self
            .initial()
            .zip(other.initial())
            .and_then(|pair| labels.get(&pair))
            .cloned();
        result.replace_initial(initial.as_deref());

        result.remove_unreachable_states();
        result.rename_states();
        result.set_determinized(true);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// `symbol+` as a two-state DFA.
    fn plus(symbol: char) -> Automaton {
        let mut dfa = Automaton::new();
        dfa.add_transition("A", symbol, "B");
        dfa.add_transition("B", symbol, "B");
        dfa.set_initial("A").unwrap();
        dfa.add_final("B").unwrap();
        dfa.set_determinized(true);
        dfa
    }

    /// Words over {a, b} with an even number of `a`.
    fn even_a() -> Automaton {
        let mut dfa = Automaton::new();
        dfa.add_transition("E", 'a', "O");
        dfa.add_transition("E", 'b', "E");
        dfa.add_transition("O", 'a', "E");
        dfa.add_transition("O", 'b', "O");
        dfa.set_initial("E").unwrap();
        dfa.add_final("E").unwrap();
        dfa.set_determinized(true);
        dfa
    }

    #[test]
    fn test_union() {
        let union = plus('a').union(&plus('b')).unwrap();
        assert!(!union.is_determinized());
        assert!(union.has_epsilon_transition());
        assert_eq!(union.finals().len(), 1);
        assert_eq!(union.states().len(), 6);

        for word in ["a", "b", "aaa", "bbb"] {
            assert!(union.accepts(word), "{}", word);
        }
        for word in ["ab", "ba", ""] {
            assert!(!union.accepts(word), "{}", word);
        }

        let dfa = union.determinize();
        assert!(dfa.is_determinized());
        assert!(dfa.accepts("bb"));
        assert!(!dfa.accepts("ab"));
    }

    #[test]
    fn test_union_leaves_operands_untouched() {
        let a = plus('a');
        let b = plus('b');
        let _ = a.union(&b).unwrap();
        assert_eq!(a, plus('a'));
        assert_eq!(b, plus('b'));
    }

    #[test]
    fn test_intersection() {
        let mut a_star_b = Automaton::new();
        a_star_b.add_transition("A", 'a', "A");
        a_star_b.add_transition("A", 'b', "A");
        a_star_b.set_initial("A").unwrap();
        a_star_b.add_final("A").unwrap();
        a_star_b.set_determinized(true);

        let both = a_star_b.intersection(&even_a()).unwrap();
        assert!(both.is_determinized());
        assert!(both.is_deterministic());
        assert!(both.accepts(""));
        assert!(both.accepts("aba"));
        assert!(!both.accepts("ab"));

        let none = plus('a').intersection(&plus('b')).unwrap();
        assert!(none.alphabet().is_empty());
        assert!(none.is_empty());
    }

    #[test]
    fn test_intersection_initial_pairs_both_operands() {
        let both = plus('a').intersection(&even_a()).unwrap();
        assert_eq!(both.states().len(), 3);
        assert!(both.accepts("aa"));
        assert!(!both.accepts("a"));
        assert!(!both.accepts("aaa"));
        assert!(both.accepts("aaaa"));
    }

    #[test]
    fn test_intersection_keeps_reachable_pairs() {
        // Only (A, E), (B, O) and (B, E) are reached from the initial pair
        let both = plus('a').intersection(&even_a()).unwrap();
        let initial = both.initial().unwrap();
        assert_eq!(both.reachable_states(initial).len(), both.states().len());
        assert_eq!(both.states().iter().map(String::as_str).collect::<Vec<_>>(), ["A", "B", "C"]);

        // Over {b} the odd half of even_a is never entered
        let lone = even_a().intersection(&plus('b')).unwrap();
        assert_eq!(lone.states().len(), 2);
        assert!(lone.accepts("bb"));
        assert!(!lone.accepts(""));
    }

    #[test]
    fn test_operands_must_be_determinized() {
        let mut nfa = plus('a');
        nfa.update_transition("A", 'a', "A, B").unwrap();

        assert_eq!(nfa.union(&plus('b')).unwrap_err().kind(), ErrorKind::Precondition);
        assert_eq!(plus('b').intersection(&nfa).unwrap_err().kind(), ErrorKind::Precondition);
    }
}
