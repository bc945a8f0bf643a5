use std::fmt::Debug;

use itertools::Itertools;

/// Decides which of the symbols leaving the active states are consumed from
/// the remaining input.
///
/// Symbols may be longer than a single character, so several of them can be
/// a prefix of the remaining input at the same time. Simulations of every
/// automaton kind take the symbols returned here, in the returned order.
pub trait SymbolMatcher: Debug {
    fn select<'s>(&self, candidates: &[&'s str], remaining: &str) -> Vec<&'s str>;
}

/// Orders candidates longest first, ties broken by string order, without
/// duplicates.
pub fn longest_first<'s>(candidates: &[&'s str]) -> Vec<&'s str> {
    candidates
        .iter()
        .copied()
        .unique()
        .sorted_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        })
        .collect()
}

/// Takes only the longest symbol that is a prefix of the remaining input.
///
/// This is a greedy policy: an input such as `ab` with the symbols `a`, `ab`
/// and `b` is only ever read as `ab`, even if reading `a` then `b` would have
/// led to acceptance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LongestMatch;

impl SymbolMatcher for LongestMatch {
    fn select<'s>(&self, candidates: &[&'s str], remaining: &str) -> Vec<&'s str> {
        longest_first(candidates)
            .into_iter()
            .find(|symbol| !symbol.is_empty() && remaining.starts_with(symbol))
            .into_iter()
            .collect()
    }
}

/// Takes every symbol that is a prefix of the remaining input, longest first.
/// Branching simulations explore all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllMatches;

impl SymbolMatcher for AllMatches {
    fn select<'s>(&self, candidates: &[&'s str], remaining: &str) -> Vec<&'s str> {
        longest_first(candidates)
            .into_iter()
            .filter(|symbol| !symbol.is_empty() && remaining.starts_with(symbol))
            .collect()
    }
}
