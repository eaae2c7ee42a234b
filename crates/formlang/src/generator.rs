/*
    This module generates words accepted by an automaton
*/

use rand::prelude::*;

use crate::automaton::{Automaton, AutomatonError, AutomatonErrorType, AutomatonResult};
use crate::symbol::is_epsilon;

// Random walks per requested word before giving up on length-limited walks
const ATTEMPTS: usize = 16;

/// Most words one call to [`samples`] hands out.
pub const MAX_SAMPLES: usize = 1 << 16;

/// Walk the automaton at random and return the word read.
///
/// The walk only takes moves that can still reach a final state, and stops
/// on accepting states with probability `1 / (moves + 1)`. Returns `None`
/// when `max_len` symbols were read without ending on an accepting state.
pub fn sample<R: Rng>(fa: &Automaton, max_len: usize, rng: &mut R) -> AutomatonResult<Option<String>> {
    let initial = fa
        .initial()
        .and_then(|state| fa.state_id(state))
        .ok_or_else(|| AutomatonError::new(AutomatonErrorType::MissingInitialState("Sampling")))?;
    if fa.is_empty() {
        return Err(AutomatonError::new(AutomatonErrorType::EmptyLanguage));
    }

    let live = fa.coreachable_ids();
    let mut current = fa.epsilon_closure_ids(initial);
    let mut word = String::new();
    let mut len = 0;

    loop {
        let accepting = fa.contains_final(&current);
        let moves: Vec<_> = if len < max_len {
            fa.alphabet()
                .iter()
                .copied()
                .filter(|&symbol| !is_epsilon(symbol))
                .map(|symbol| (symbol, fa.step_ids(&current, symbol)))
                .filter(|(_, next)| next.intersects(&live))
                .collect()
        } else {
            Vec::new()
        };

        if moves.is_empty() || (accepting && rng.gen_range(0..=moves.len()) == 0) {
            return Ok(accepting.then_some(word));
        }

        let Some((symbol, next)) = moves.choose(rng) else {
            return Ok(None);
        };
        word.push(*symbol);
        current = next.clone();
        len += 1;
    }
}

/// Up to `count` random accepted words of at most `max_len` symbols.
pub fn samples(fa: &Automaton, count: usize, max_len: usize) -> AutomatonResult<Vec<String>> {
    if count > MAX_SAMPLES {
        return Err(AutomatonError::new(AutomatonErrorType::TooManySamples(count)));
    }

    let mut rng = thread_rng();
    let mut words = Vec::with_capacity(count.min(64));
    for _ in 0..count.saturating_mul(ATTEMPTS) {
        if words.len() == count {
            break;
        }
        if let Some(word) = sample(fa, max_len, &mut rng)? {
            words.push(word);
        }
    }
    Ok(words)
}
