mod cli;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Input, Operand, Output};
use formlang::{generator, regex, Automaton, Grammar};
use itertools::Itertools;

type RunResult<T> = Result<T, String>;

fn load_grammar(path: &Path) -> RunResult<Automaton> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let grammar = Grammar::parse(&text)
        .map_err(|errors| errors.iter().map(|e| format!("{}: {}", path.display(), e)).join("\n"))?;
    Ok(Automaton::from_grammar(&grammar))
}

fn load_regex(expr: &str) -> RunResult<Automaton> {
    regex::compile(expr).map_err(|e| format!("`{}`: {}", expr, e))
}

// Union and intersection need deterministic operands
fn load_operand(operand: &Operand) -> RunResult<Automaton> {
    match operand {
        Operand::Regex(expr) => load_regex(expr),
        Operand::Grammar(path) => load_grammar(path).map(|fa| fa.determinize()),
    }
}

fn build(input: &Input) -> RunResult<Automaton> {
    match input {
        Input::Grammar { file } => load_grammar(file),
        Input::Regex { expr } => load_regex(expr),
        Input::Union { lhs, rhs } => load_operand(lhs)?
            .union(&load_operand(rhs)?)
            .map_err(|e| e.to_string()),
        Input::Intersect { lhs, rhs } => load_operand(lhs)?
            .intersection(&load_operand(rhs)?)
            .map_err(|e| e.to_string()),
    }
}

fn print(fa: &Automaton, output: &Output) -> RunResult<()> {
    if output.to_grammar {
        let grammar = Grammar::from_automaton(fa).map_err(|e| e.to_string())?;
        print!("{}", grammar);
    } else if output.dot {
        println!("{}", fa.to_dot());
    } else {
        print!("{}", fa);
    }

    for word in &output.check {
        let verdict = if fa.accepts(word) { "accept" } else { "reject" };
        println!("{:?}: {}", word, verdict);
    }

    if let Some(amount) = output.samples {
        for word in generator::samples(fa, amount, output.max_len).map_err(|e| e.to_string())? {
            println!("{:?}", word);
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> RunResult<()> {
    let mut fa = build(&cli.input)?;

    if (cli.output.determinize || cli.output.minimize) && !fa.is_determinized() {
        fa = fa.determinize();
    }
    if cli.output.minimize {
        fa = fa.minimize().map_err(|e| e.to_string())?;
    }

    print(&fa, &cli.output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
