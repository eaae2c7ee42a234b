//! PyO3 bindings for automata, grammars and regular expressions.
//!
//! Built with the `python` feature. Engine errors surface as `ValueError`
//! carrying the error's message.

use crate::automaton::Automaton;
use crate::error::{Error, ErrorType};
use crate::grammar::{CompileErrors, Grammar};
use crate::regex;
use crate::symbol::Symbol;
use itertools::Itertools;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn value_error<T: ErrorType + std::fmt::Debug>(err: Error<T>) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn compile_errors(errors: CompileErrors) -> PyErr {
    PyValueError::new_err(errors.iter().join("\n"))
}

/// A finite automaton.
#[pyclass(name = "Automaton", module = "formlang")]
#[derive(Clone)]
pub struct PyAutomaton {
    fa: Automaton,
}

#[pymethods]
impl PyAutomaton {
    #[new]
    fn new() -> Self {
        Self { fa: Automaton::new() }
    }

    /// Build the automaton of a right-regular grammar.
    #[staticmethod]
    fn from_grammar(text: &str) -> PyResult<Self> {
        let grammar = Grammar::parse(text).map_err(compile_errors)?;
        Ok(Self {
            fa: Automaton::from_grammar(&grammar),
        })
    }

    /// Build the DFA of a regular expression.
    #[staticmethod]
    fn from_regex(text: &str) -> PyResult<Self> {
        let fa = regex::compile(text).map_err(value_error)?;
        Ok(Self { fa })
    }

    #[getter]
    fn states(&self) -> Vec<String> {
        self.fa.states().iter().cloned().collect()
    }

    #[getter]
    fn alphabet(&self) -> Vec<Symbol> {
        self.fa.alphabet().iter().copied().collect()
    }

    #[getter]
    fn initial(&self) -> Option<String> {
        self.fa.initial().map(str::to_string)
    }

    #[getter]
    fn finals(&self) -> Vec<String> {
        self.fa.finals().iter().cloned().collect()
    }

    #[getter]
    fn determinized(&self) -> bool {
        self.fa.is_determinized()
    }

    fn add_state(&mut self, state: &str) -> PyResult<bool> {
        self.fa.add_state(state).map_err(value_error)
    }

    fn delete_state(&mut self, state: &str) -> bool {
        self.fa.delete_state(state)
    }

    fn add_symbol(&mut self, symbol: Symbol) -> PyResult<bool> {
        self.fa.add_symbol(symbol).map_err(value_error)
    }

    fn delete_symbol(&mut self, symbol: Symbol) -> bool {
        self.fa.delete_symbol(symbol)
    }

    fn set_initial(&mut self, state: &str) -> PyResult<()> {
        self.fa.set_initial(state).map_err(value_error)
    }

    fn add_final(&mut self, state: &str) -> PyResult<()> {
        self.fa.add_final(state).map_err(value_error)
    }

    fn remove_final(&mut self, state: &str) -> bool {
        self.fa.remove_final(state)
    }

    /// Replace a cell from text such as `"A, B"`.
    fn update_transition(&mut self, state: &str, symbol: Symbol, text: &str) -> PyResult<()> {
        self.fa.update_transition(state, symbol, text).map_err(value_error)
    }

    /// Display text of a cell.
    fn transition(&self, state: &str, symbol: Symbol) -> Option<String> {
        self.fa.transition(state, symbol).map(|cell| cell.text())
    }

    fn accepts(&self, word: &str) -> bool {
        self.fa.accepts(word)
    }

    fn is_valid(&self) -> bool {
        self.fa.is_valid()
    }

    fn is_empty(&self) -> bool {
        self.fa.is_empty()
    }

    fn is_deterministic(&self) -> bool {
        self.fa.is_deterministic()
    }

    fn determinize(&self) -> Self {
        Self {
            fa: self.fa.determinize(),
        }
    }

    fn minimize(&self) -> PyResult<Self> {
        let fa = self.fa.minimize().map_err(value_error)?;
        Ok(Self { fa })
    }

    fn union(&self, other: &PyAutomaton) -> PyResult<Self> {
        let fa = self.fa.union(&other.fa).map_err(value_error)?;
        Ok(Self { fa })
    }

    fn intersection(&self, other: &PyAutomaton) -> PyResult<Self> {
        let fa = self.fa.intersection(&other.fa).map_err(value_error)?;
        Ok(Self { fa })
    }

    /// Grammar text of a deterministic automaton.
    fn to_grammar(&self) -> PyResult<PyGrammar> {
        let grammar = Grammar::from_automaton(&self.fa).map_err(value_error)?;
        Ok(PyGrammar { grammar })
    }

    fn to_dot(&self) -> String {
        self.fa.to_dot()
    }

    fn __str__(&self) -> String {
        self.fa.to_string()
    }
}

/// A right-regular grammar. Text that does not parse gives an invalid grammar.
#[pyclass(name = "Grammar", module = "formlang")]
#[derive(Clone)]
pub struct PyGrammar {
    grammar: Grammar,
}

#[pymethods]
impl PyGrammar {
    #[new]
    fn new(text: &str) -> Self {
        Self {
            grammar: Grammar::from_text(text),
        }
    }

    /// Messages explaining why the text does not parse.
    #[staticmethod]
    fn check(text: &str) -> Vec<String> {
        match Grammar::parse(text) {
            Ok(_) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    #[getter]
    fn text(&self) -> &str {
        &self.grammar.text
    }

    #[getter]
    fn valid(&self) -> bool {
        self.grammar.valid
    }

    #[getter]
    fn start(&self) -> Option<Symbol> {
        self.grammar.start
    }

    #[getter]
    fn nonterminals(&self) -> Vec<Symbol> {
        self.grammar.nonterminals.iter().copied().collect()
    }

    #[getter]
    fn terminals(&self) -> Vec<Symbol> {
        self.grammar.terminals.iter().copied().collect()
    }

    /// `(head, [alternative, ...])` pairs in declaration order.
    #[getter]
    fn productions(&self) -> Vec<(Symbol, Vec<String>)> {
        self.grammar
            .productions
            .iter()
            .map(|(head, alternatives)| (*head, alternatives.iter().map(ToString::to_string).collect()))
            .collect()
    }

    fn to_automaton(&self) -> PyAutomaton {
        PyAutomaton {
            fa: Automaton::from_grammar(&self.grammar),
        }
    }

    fn __str__(&self) -> String {
        self.grammar.to_string()
    }
}

#[pymodule]
pub fn formlang(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAutomaton>()?;
    m.add_class::<PyGrammar>()?;
    Ok(())
}
