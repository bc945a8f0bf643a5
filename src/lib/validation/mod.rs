use std::iter::repeat_n;

use itertools::Itertools;

pub mod same_language;

/// Every word over `alphabet` with at most `max_word_length` symbols, the
/// empty word first. Words are the concatenations of the symbols, so
/// multi-character symbols produce longer strings.
pub fn words<'a>(alphabet: &'a [&'a str], max_word_length: usize) -> impl Iterator<Item = String> + 'a {
    let non_empty = (1..=max_word_length).flat_map(move |length| {
        repeat_n(alphabet.iter(), length)
            .multi_cartesian_product()
            .map(|word| word.into_iter().join(""))
    });

    std::iter::once(String::new()).chain(non_empty)
}

#[test]
fn test_words() {
    let words = words(&["a", "bc"], 2).collect_vec();
    assert_eq!(words, vec!["", "a", "bc", "aa", "abc", "bca", "bcbc"]);
}
