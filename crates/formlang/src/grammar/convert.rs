//! Conversions between right-regular grammars and automata.

use super::{Alternatives, Grammar, Production};
use crate::automaton::{Automaton, AutomatonError, AutomatonErrorType, AutomatonResult, ACCEPT_STATE};
use crate::rename::LabelPool;
use crate::symbol::Symbol;
use indexmap::IndexMap;

const MAX_NONTERMINALS: usize = 26;

impl Automaton {
    /// Encode a grammar as a (generally nondeterministic) automaton.
    ///
    /// Every nonterminal becomes a state and `Head -> a` moves into the
    /// accepting sentinel. Every terminal of the grammar gets a column, `&`
    /// included; its column stays empty since `S -> &` only makes the start
    /// state final. An invalid grammar yields an empty automaton.
    pub fn from_grammar(grammar: &Grammar) -> Automaton {
        let mut fa = Automaton::new();
        let Some(start) = grammar.start.filter(|_| grammar.valid) else {
            return fa;
        };

        for &terminal in &grammar.terminals {
            fa.insert_symbol(terminal);
        }
        for nonterminal in &grammar.nonterminals {
            fa.insert_state(&nonterminal.to_string());
        }
        fa.insert_final(ACCEPT_STATE);

        for (head, alternatives) in &grammar.productions {
            let head = head.to_string();
            for production in alternatives {
                match production {
                    Production::Empty => {}
                    Production::Terminal(t) => fa.add_transition(&head, *t, ACCEPT_STATE),
                    Production::Step(t, n) => fa.add_transition(&head, *t, &n.to_string()),
                }
            }
        }

        let start = start.to_string();
        fa.replace_initial(Some(&start));
        if grammar.derives_empty() {
            fa.insert_final(&start);
        }
        fa
    }
}

impl Grammar {
    /// Read a deterministic automaton back as a right-regular grammar.
    ///
    /// States that cannot be reached or cannot reach a final state are
    /// dropped first, and the rest are renamed to single letters. Final
    /// states without outgoing transitions only show up through `Head -> a`.
    pub fn from_automaton(fa: &Automaton) -> AutomatonResult<Grammar> {
        if !fa.is_deterministic() {
            return Err(AutomatonError::new(AutomatonErrorType::NotDeterministic(
                "Grammar conversion",
            )));
        }
        if fa.initial().is_none() {
            return Err(AutomatonError::new(AutomatonErrorType::MissingInitialState(
                "Grammar conversion",
            )));
        }

        let mut dfa = fa.clone();
        dfa.remove_unreachable_states();
        dfa.remove_useless_states();
        if dfa.states().len() > MAX_NONTERMINALS {
            return Err(AutomatonError::new(AutomatonErrorType::TooManyStates(dfa.states().len())));
        }
        dfa.rename_states();
        let Some(initial) = dfa.initial() else {
            return Err(AutomatonError::new(AutomatonErrorType::EmptyLanguage));
        };

        let names: IndexMap<&str, Symbol> = dfa
            .states()
            .iter()
            .filter_map(|state| state.chars().next().map(|c| (state.as_str(), c)))
            .collect();
        let Some(&initial_name) = names.get(initial) else {
            return Err(AutomatonError::new(AutomatonErrorType::UnknownState(initial.to_string())));
        };

        let heads = std::iter::once(initial).chain(
            dfa.states()
                .iter()
                .map(String::as_str)
                .filter(|state| *state != initial),
        );
        let mut productions: IndexMap<Symbol, Alternatives> = IndexMap::new();
        for state in heads {
            let Some(&head) = names.get(state) else {
                continue;
            };
            let mut alternatives = Alternatives::new();
            for &symbol in dfa.alphabet() {
                for target in dfa.targets(state, symbol) {
                    if dfa.is_final(target) {
                        alternatives.insert(Production::Terminal(symbol));
                    }
                    if dfa.has_outgoing(target) {
                        if let Some(&next) = names.get(target) {
                            alternatives.insert(Production::Step(symbol, next));
                        }
                    }
                }
            }
            if !alternatives.is_empty() {
                productions.insert(head, alternatives);
            }
        }

        let mut start = initial_name;
        if dfa.is_final(initial) {
            let reentered = productions
                .values()
                .flatten()
                .any(|production| production.nonterminal() == Some(initial_name));

            // The empty word moves to a fresh start symbol nobody leads back to
            if reentered {
                if names.len() >= MAX_NONTERMINALS {
                    return Err(AutomatonError::new(AutomatonErrorType::TooManyStates(names.len() + 1)));
                }
                let fresh = LabelPool::excluding(dfa.states())
                    .take()
                    .chars()
                    .next()
                    .unwrap_or(initial_name);
                let mut alternatives = productions.get(&initial_name).cloned().unwrap_or_default();
                alternatives.insert(Production::Empty);
                start = fresh;
                productions = std::iter::once((fresh, alternatives)).chain(productions).collect();
            } else {
                let mut alternatives = productions.shift_remove(&initial_name).unwrap_or_default();
                alternatives.insert(Production::Empty);
                productions = std::iter::once((initial_name, alternatives)).chain(productions).collect();
            }
        }

        let mut grammar = Grammar::from_productions(String::new(), start, productions);
        grammar.text = grammar.to_string();
        Ok(grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
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
    fn test_build_automaton() {
        let grammar = Grammar::parse("S -> aS | a").unwrap();
        let fa = Automaton::from_grammar(&grammar);

        assert_eq!(fa.states().len(), 2);
        assert!(fa.states().contains(ACCEPT_STATE));
        assert_eq!(fa.initial(), Some("S"));
        assert_eq!(fa.finals().len(), 1);
        assert_eq!(fa.transition("S", 'a').unwrap().text(), "$, S");
        assert!(!fa.is_deterministic());
        assert!(!fa.is_determinized());

        assert!(fa.accepts("a"));
        assert!(fa.accepts("aaaa"));
        assert!(!fa.accepts(""));
    }

    #[test]
    fn test_build_automaton_with_empty_word() {
        let grammar = Grammar::parse("S -> aA | &\nA -> bA | b").unwrap();
        let fa = Automaton::from_grammar(&grammar);

        assert!(fa.is_final("S"));
        assert!(fa.is_final(ACCEPT_STATE));
        assert_eq!(fa.alphabet().iter().copied().collect::<Vec<_>>(), ['a', EPSILON, 'b']);
        assert!(fa.states().iter().all(|state| fa.transition(state, EPSILON).unwrap().is_empty()));
        assert!(fa.accepts(""));
        assert!(fa.accepts("abb"));
        assert!(!fa.accepts("a"));

        let dfa = fa.determinize();
        assert!(!dfa.alphabet().contains(&EPSILON));
        assert!(dfa.accepts(""));
        assert!(dfa.accepts("abb"));
    }

    #[test]
    fn test_invalid_grammar_builds_nothing() {
        let fa = Automaton::from_grammar(&Grammar::from_text("S -> aS | a\nA => b"));
        assert!(fa.states().is_empty());
        assert_eq!(fa.initial(), None);
    }

    #[test]
    fn test_grammar_round_trip() {
        for text in ["S -> aS | a", "S -> aA | &\nA -> bA | b", "S -> aA | bB\nA -> aA | b\nB -> 0"] {
            let nfa = Automaton::from_grammar(&Grammar::parse(text).unwrap());
            let grammar = Grammar::from_automaton(&nfa.determinize()).unwrap();

            assert!(grammar.valid);
            let reparsed = Grammar::parse(&grammar.text).unwrap();
            assert_eq!(reparsed, grammar);
            assert_same_language(&nfa, &Automaton::from_grammar(&grammar), &['a', 'b', '0']);
        }
    }

    #[test]
    fn test_final_states_without_moves_are_dropped() {
        let mut dfa = Automaton::new();
        dfa.add_transition("A", 'a', "B");
        dfa.set_initial("A").unwrap();
        dfa.add_final("B").unwrap();
        dfa.set_determinized(true);

        let grammar = Grammar::from_automaton(&dfa).unwrap();
        assert_eq!(grammar.text, "A -> a\n");
        assert_eq!(grammar.nonterminals.len(), 1);
    }

    #[test]
    fn test_nullable_start_reentered_gets_fresh_start() {
        // a*
        let mut dfa = Automaton::new();
        dfa.add_transition("A", 'a', "A");
        dfa.set_initial("A").unwrap();
        dfa.add_final("A").unwrap();
        dfa.set_determinized(true);

        let grammar = Grammar::from_automaton(&dfa).unwrap();
        assert_eq!(grammar.start, Some('B'));
        assert_eq!(grammar.text, "B -> a | aA | &\nA -> a | aA\n");
        assert!(Grammar::parse(&grammar.text).is_ok());
        assert_same_language(&dfa, &Automaton::from_grammar(&grammar), &['a']);
    }

    #[test]
    fn test_only_empty_word() {
        let mut dfa = Automaton::new();
        dfa.add_state("A").unwrap();
        dfa.set_initial("A").unwrap();
        dfa.add_final("A").unwrap();

        let grammar = Grammar::from_automaton(&dfa).unwrap();
        assert_eq!(grammar.text, "A -> &\n");
        assert!(grammar.derives_empty());
    }

    #[test]
    fn test_build_grammar_preconditions() {
        let nfa = Automaton::from_grammar(&Grammar::parse("S -> aS | a").unwrap());
        assert_eq!(Grammar::from_automaton(&nfa).unwrap_err().kind(), ErrorKind::Precondition);

        let mut dfa = Automaton::new();
        dfa.add_transition("A", 'a', "B");
        assert_eq!(
            Grammar::from_automaton(&dfa).unwrap_err().error,
            AutomatonErrorType::MissingInitialState("Grammar conversion")
        );

        dfa.set_initial("A").unwrap();
        assert_eq!(Grammar::from_automaton(&dfa).unwrap_err().error, AutomatonErrorType::EmptyLanguage);
    }
}
