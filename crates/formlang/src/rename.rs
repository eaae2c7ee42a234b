//! Canonical state renaming to short labels.
//!
//! States already named with a free uppercase letter keep it; every other
//! state takes the lowest free letter. Past 26 states the pool hands out
//! `A1`..`Z1`, `A2`, ... so labels stay distinct.

use crate::automaton::Automaton;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};

const LETTERS: std::ops::RangeInclusive<char> = 'A'..='Z';

/// Supply of fresh state labels.
#[derive(Debug, Clone)]
pub struct LabelPool {
    letters: BTreeSet<char>,
    used: HashSet<String>,
    overflow: usize,
}

fn single_letter(label: &str) -> Option<char> {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c),
        _ => None,
    }
}

impl LabelPool {
    /// A pool holding every letter `A`..`Z`.
    pub fn new() -> Self {
        Self {
            letters: LETTERS.collect(),
            used: HashSet::new(),
            overflow: 0,
        }
    }

    /// A pool that never hands out any of `labels`.
    pub fn excluding<'a>(labels: impl IntoIterator<Item = &'a String>) -> Self {
        let mut pool = Self::new();
        for label in labels {
            pool.exclude(label);
        }
        pool
    }

    pub fn exclude(&mut self, label: &str) {
        if let Some(c) = single_letter(label) {
            self.letters.remove(&c);
        }
        self.used.insert(label.to_string());
    }

    /// Claim `label` if it is a single letter still in the pool.
    pub fn reserve(&mut self, label: &str) -> bool {
        match single_letter(label) {
            Some(c) if self.letters.remove(&c) => {
                self.used.insert(label.to_string());
                true
            }
            _ => false,
        }
    }

    /// Take the lowest free label.
    pub fn take(&mut self) -> String {
        if let Some(c) = self.letters.pop_first() {
            let label = c.to_string();
            self.used.insert(label.clone());
            return label;
        }
        loop {
            let letter = (b'A' + (self.overflow % 26) as u8) as char;
            let label = format!("{}{}", letter, self.overflow / 26 + 1);
            self.overflow += 1;
            if self.used.insert(label.clone()) {
                return label;
            }
        }
    }
}

impl Default for LabelPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Automaton {
    /// Rename every state to a short label drawn from a full pool.
    pub fn rename_states(&mut self) {
        self.rename_states_with(&mut LabelPool::new());
    }

    /// Rename every state with labels from `pool`, leaving the pool without
    /// the labels that were handed out.
    pub fn rename_states_with(&mut self, pool: &mut LabelPool) {
        let mut mapping: IndexMap<String, String> = IndexMap::with_capacity(self.states().len());
        for state in self.states() {
            if pool.reserve(state) {
                mapping.insert(state.clone(), state.clone());
            }
        }
        for state in self.states() {
            if !mapping.contains_key(state) {
                mapping.insert(state.clone(), pool.take());
            }
        }
        self.relabel(&mapping);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::EPSILON;

    #[test]
    fn test_pool_order() {
        let mut pool = LabelPool::excluding(&["A".to_string(), "C".to_string()]);
        assert_eq!(pool.take(), "B");
        assert_eq!(pool.take(), "D");
        assert!(!pool.reserve("B"));
        assert!(pool.reserve("E"));
        assert_eq!(pool.take(), "F");
    }

    #[test]
    fn test_pool_overflow_is_distinct() {
        let mut pool = LabelPool::new();
        pool.exclude("A1");
        let labels: Vec<String> = (0..30).map(|_| pool.take()).collect();
        assert_eq!(labels[25], "Z");
        assert_eq!(labels[26], "B1");
        let distinct: HashSet<&String> = labels.iter().collect();
        assert_eq!(distinct.len(), labels.len());
    }

    #[test]
    fn test_rename_keeps_free_letters() {
        let mut fa = Automaton::new();
        fa.add_transition("C", 'a', "AB");
        fa.add_transition("AB", 'b', "0,1");
        fa.add_transition("0,1", EPSILON, "C");
        fa.set_initial("AB").unwrap();
        fa.add_final("0,1").unwrap();

        fa.rename_states();
        let states: Vec<&str> = fa.states().iter().map(String::as_str).collect();
        assert_eq!(states, vec!["C", "A", "B"]);
        assert_eq!(fa.initial(), Some("A"));
        assert!(fa.is_final("B"));
        assert_eq!(fa.transition("C", 'a').unwrap().text(), "A");
        assert_eq!(fa.transition("A", 'b').unwrap().text(), "B");
        assert!(fa.accepts("b"));
        assert!(fa.accepts("bab"));
        assert!(!fa.accepts("ba"));
    }

    #[test]
    fn test_rename_is_a_bijection() {
        let mut fa = Automaton::new();
        for i in 0..40 {
            fa.add_transition(&format!("q{}", i), 'a', &format!("q{}", i + 1));
        }
        fa.set_initial("q0").unwrap();
        fa.add_final("q40").unwrap();

        fa.rename_states();
        assert_eq!(fa.states().len(), 41);
        let word = "a".repeat(40);
        assert!(fa.accepts(&word));
        assert!(!fa.accepts(&word[1..]));
    }
}
