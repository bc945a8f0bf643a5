use crate::{automaton::Language, validation::words};

/// Checks if two automata accept the same words over `alphabet` up to a
/// certain number of symbols.
pub fn same_language(
    a: &impl Language,
    b: &impl Language,
    alphabet: &[&str],
    max_word_length: usize,
) -> bool {
    for word in words(alphabet, max_word_length) {
        if a.accepts(&word) != b.accepts(&word) {
            tracing::debug!("Languages differ on {:?}", word);
            return false;
        }
    }

    true
}

pub fn assert_same_language(
    a: &impl Language,
    b: &impl Language,
    alphabet: &[&str],
    max_word_length: usize,
) {
    for word in words(alphabet, max_word_length) {
        match (a.accepts(&word), b.accepts(&word)) {
            (true, false) => {
                panic!(
                    "{:?} is accepted by automaton `a` but not by automaton `b`. Thus their languages are not equal.",
                    word
                );
            }
            (false, true) => {
                panic!(
                    "{:?} is accepted by automaton `b` but not by automaton `a`. Thus their languages are not equal.",
                    word
                );
            }
            _ => {}
        }
    }
}

/// Assert that the language accepted by automaton `a` is a subset of the
/// language accepted by automaton `b`.
pub fn assert_subset_language(
    a: &impl Language,
    b: &impl Language,
    alphabet: &[&str],
    max_word_length: usize,
) {
    for word in words(alphabet, max_word_length) {
        if a.accepts(&word) && !b.accepts(&word) {
            panic!(
                "{:?} is accepted by automaton `a` but not by automaton `b`. Thus the language of `a` is not a subset of `b`.",
                word
            );
        }
    }
}
