use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub input: Input,

    #[command(flatten)]
    pub output: Output,
}

#[derive(Subcommand, Debug)]
pub enum Input {
    /// Build the automaton of a right-regular grammar file
    Grammar { file: PathBuf },

    /// Build the DFA of a regular expression
    Regex { expr: String },

    /// Union of two languages
    Union {
        /// `re:<expr>` or a grammar file
        lhs: Operand,
        rhs: Operand,
    },

    /// Intersection of two languages
    Intersect {
        /// `re:<expr>` or a grammar file
        lhs: Operand,
        rhs: Operand,
    },
}

/// A language given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Regex(String),
    Grammar(PathBuf),
}

impl FromStr for Operand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("re:") {
            Some(expr) => Ok(Operand::Regex(expr.to_string())),
            None if s.is_empty() => Err("expected `re:<expr>` or a grammar file".to_string()),
            None => Ok(Operand::Grammar(PathBuf::from(s))),
        }
    }
}

#[derive(Args, Debug)]
pub struct Output {
    /// Determinize the automaton
    #[arg(short, long, global = true)]
    pub determinize: bool,

    /// Minimize the automaton (determinizes first when needed)
    #[arg(short, long, global = true)]
    pub minimize: bool,

    /// Print the equivalent grammar instead of the transition table
    #[arg(short = 'g', long, global = true)]
    pub to_grammar: bool,

    /// Print the automaton as a Graphviz digraph
    #[arg(long, global = true)]
    pub dot: bool,

    /// Report whether WORD is accepted (repeatable)
    #[arg(short, long, value_name = "WORD", global = true)]
    pub check: Vec<String>,

    /// Amount of random accepted words to print
    #[arg(short = 'n', long, value_name = "AMOUNT", global = true)]
    pub samples: Option<usize>,

    /// Longest random word
    #[arg(long, value_name = "LEN", default_value_t = 12, global = true)]
    pub max_len: usize,
}
