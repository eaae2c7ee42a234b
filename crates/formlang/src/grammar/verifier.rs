use super::CompileErrorType::{EpsilonOutsideStart, ReentersNullableStart};
use super::{Alternatives, CompileError, CompileErrors, FileResult, Location, Production};
use crate::symbol::Symbol;
use indexmap::IndexMap;

pub type IntermediateRuleset = IndexMap<Symbol, (Alternatives, Location)>;

fn get_misplaced_epsilons(start: Symbol, rules: &IntermediateRuleset) -> CompileErrors {
    // Only the start symbol may derive the empty word
    rules
        .iter()
        .filter(|(head, (alternatives, _))| **head != start && alternatives.contains(&Production::Empty))
        .map(|(head, (_, location))| CompileError {
            location: *location,
            error: EpsilonOutsideStart(*head),
        })
        .collect()
}

fn get_start_reentries(start: Symbol, rules: &IntermediateRuleset) -> CompileErrors {
    let nullable_start = rules
        .get(&start)
        .is_some_and(|(alternatives, _)| alternatives.contains(&Production::Empty));
    if !nullable_start {
        return Vec::new();
    }

    // With `S -> &`, any `X -> aS` would let the empty word leak into the
    // middle of other derivations
    rules
        .iter()
        .filter(|(_, (alternatives, _))| {
            alternatives
                .iter()
                .any(|production| production.nonterminal() == Some(start))
        })
        .map(|(head, (_, location))| CompileError {
            location: *location,
            error: ReentersNullableStart(*head),
        })
        .collect()
}

pub fn verify_rules(start: Symbol, rules: &IntermediateRuleset) -> FileResult<()> {
    let mut errors = get_misplaced_epsilons(start, rules);
    errors.extend(get_start_reentries(start, rules));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset(rules: &[(Symbol, &[Production], usize)]) -> IntermediateRuleset {
        rules
            .iter()
            .map(|(head, alternatives, line)| (*head, (alternatives.iter().copied().collect(), Location::line(*line))))
            .collect()
    }

    #[test]
    fn test_verify_normal_rules() {
        let rules = ruleset(&[
            ('S', &[Production::Step('a', 'A'), Production::Empty], 1),
            ('A', &[Production::Terminal('b'), Production::Step('b', 'A')], 2),
        ]);
        assert_eq!(verify_rules('S', &rules), Ok(()));
    }

    #[test]
    fn test_epsilon_outside_start() {
        let rules = ruleset(&[
            ('S', &[Production::Step('a', 'A')], 1),
            ('A', &[Production::Empty], 2),
        ]);
        assert_eq!(
            verify_rules('S', &rules),
            Err(vec![CompileError {
                location: Location::line(2),
                error: EpsilonOutsideStart('A'),
            }])
        );
    }

    #[test]
    fn test_reentering_nullable_start() {
        let rules = ruleset(&[
            ('S', &[Production::Step('a', 'S'), Production::Empty], 1),
            ('A', &[Production::Step('b', 'S')], 2),
        ]);
        let errors = verify_rules('S', &rules).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1].error, ReentersNullableStart('A'));
    }
}
