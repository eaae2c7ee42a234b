//! Symbol types for automata transitions and grammar productions.

/// A single input character. Terminals are lowercase ASCII letters or digits.
pub type Symbol = char;

/// Special symbol representing epsilon (empty) transitions and productions.
pub const EPSILON: Symbol = '&';

/// Check if a symbol is the epsilon marker.
#[inline]
pub fn is_epsilon(symbol: Symbol) -> bool {
    symbol == EPSILON
}

/// Check if a character can be used as a terminal.
#[inline]
pub fn is_terminal(symbol: Symbol) -> bool {
    symbol.is_ascii_lowercase() || symbol.is_ascii_digit()
}

/// Check if a character can be used as a nonterminal.
#[inline]
pub fn is_nonterminal(symbol: Symbol) -> bool {
    symbol.is_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon() {
        assert!(is_epsilon(EPSILON));
        assert!(!is_epsilon('a'));
        assert!(!is_terminal(EPSILON));
        assert!(!is_nonterminal(EPSILON));
    }

    #[test]
    fn test_character_classes() {
        assert!(is_terminal('a'));
        assert!(is_terminal('7'));
        assert!(!is_terminal('A'));
        assert!(is_nonterminal('S'));
        assert!(!is_nonterminal('s'));
        assert!(!is_nonterminal('|'));
    }
}
