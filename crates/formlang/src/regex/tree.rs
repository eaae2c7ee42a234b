//! Syntax tree annotated for the position-set construction.
//!
//! Every literal leaf gets a position. Each node carries `nullable`,
//! `firstpos` and `lastpos`, and building a node updates the `followpos`
//! table of the [`CompileContext`] that owns the whole compilation.

use super::parser::Expr;
use crate::state::{StateId, StateSet};
use crate::symbol::Symbol;
use indexmap::IndexSet;

/// A leaf position.
pub type Position = StateId;

#[derive(Debug)]
pub enum NodeKind {
    Empty,
    Leaf(Position),
    Alternation(Box<Node>, Box<Node>),
    Concatenation(Box<Node>, Box<Node>),
    Star(Box<Node>),
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub nullable: bool,
    pub firstpos: StateSet,
    pub lastpos: StateSet,
}

/// Tables filled in while the tree is built.
#[derive(Debug, Default)]
pub struct CompileContext {
    followpos: Vec<StateSet>,
    /// Symbol of each position; `None` for the end marker
    symbols: Vec<Option<Symbol>>,
    alphabet: IndexSet<Symbol>,
}

impl CompileContext {
    fn empty(&mut self) -> Node {
        Node {
            kind: NodeKind::Empty,
            nullable: true,
            firstpos: StateSet::default(),
            lastpos: StateSet::default(),
        }
    }

    fn leaf(&mut self, symbol: Option<Symbol>) -> Node {
        let position = self.symbols.len() as Position;
        self.symbols.push(symbol);
        self.followpos.push(StateSet::default());
        if let Some(symbol) = symbol {
            self.alphabet.insert(symbol);
        }

        let positions = StateSet::singleton(position, self.symbols.len());
        Node {
            kind: NodeKind::Leaf(position),
            nullable: false,
            firstpos: positions.clone(),
            lastpos: positions,
        }
    }

    fn alternation(&mut self, lhs: Node, rhs: Node) -> Node {
        let mut firstpos = lhs.firstpos.clone();
        firstpos.union_with(&rhs.firstpos);
        let mut lastpos = lhs.lastpos.clone();
        lastpos.union_with(&rhs.lastpos);

        Node {
            nullable: lhs.nullable || rhs.nullable,
            firstpos,
            lastpos,
            kind: NodeKind::Alternation(Box::new(lhs), Box::new(rhs)),
        }
    }

    fn concatenation(&mut self, lhs: Node, rhs: Node) -> Node {
        for position in lhs.lastpos.iter() {
            self.followpos[position as usize].union_with(&rhs.firstpos);
        }

        let mut firstpos = lhs.firstpos.clone();
        if lhs.nullable {
            firstpos.union_with(&rhs.firstpos);
        }
        let mut lastpos = rhs.lastpos.clone();
        if rhs.nullable {
            lastpos.union_with(&lhs.lastpos);
        }

        Node {
            nullable: lhs.nullable && rhs.nullable,
            firstpos,
            lastpos,
            kind: NodeKind::Concatenation(Box::new(lhs), Box::new(rhs)),
        }
    }

    fn star(&mut self, inner: Node) -> Node {
        for position in inner.lastpos.iter() {
            self.followpos[position as usize].union_with(&inner.firstpos);
        }

        Node {
            nullable: true,
            firstpos: inner.firstpos.clone(),
            lastpos: inner.lastpos.clone(),
            kind: NodeKind::Star(Box::new(inner)),
        }
    }

    /// Build the annotated node for `expr`, leaves numbered left to right.
    fn build(&mut self, expr: &Expr) -> Node {
        match expr {
            Expr::Empty => self.empty(),
            Expr::Literal(symbol) => self.leaf(Some(*symbol)),
            Expr::Star(inner) => {
                let inner = self.build(inner);
                self.star(inner)
            }
            Expr::Alternation(lhs, rhs) => {
                let lhs = self.build(lhs);
                let rhs = self.build(rhs);
                self.alternation(lhs, rhs)
            }
            Expr::Concatenation(lhs, rhs) => {
                let lhs = self.build(lhs);
                let rhs = self.build(rhs);
                self.concatenation(lhs, rhs)
            }
        }
    }
}

/// The tree of `(expr)#`, where `#` is the end marker.
#[derive(Debug)]
pub struct SyntaxTree {
    pub root: Node,
    /// Position of the end marker, always the last one
    pub end: Position,
    context: CompileContext,
}

impl SyntaxTree {
    pub fn new(expr: &Expr) -> SyntaxTree {
        let mut context = CompileContext::default();
        let body = context.build(expr);
        let marker = context.leaf(None);
        let end = context.symbols.len() as Position - 1;
        let root = context.concatenation(body, marker);

        SyntaxTree { root, end, context }
    }

    pub fn followpos(&self, position: Position) -> Option<&StateSet> {
        self.context.followpos.get(position as usize)
    }

    /// The literal at `position`, `None` for the end marker.
    pub fn symbol(&self, position: Position) -> Option<Symbol> {
        self.context.symbols.get(position as usize).copied().flatten()
    }

    /// Symbols in order of first appearance.
    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.context.alphabet
    }

    pub fn positions(&self) -> usize {
        self.context.symbols.len()
    }
}
