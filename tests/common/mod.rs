use automata_engine::automaton::{nfa::Nfa, symbol::Symbol};
use rand::{Rng, SeedableRng, rngs::StdRng};

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A random NFA over `letters` with states `s0..`, `s0` being the start
/// state. Every state gets `transitions_per_state` outgoing transitions,
/// each of which is an epsilon transition with probability
/// `epsilon_probability`.
pub fn random_nfa(
    r: &mut StdRng,
    state_count: usize,
    letters: &[&str],
    transitions_per_state: std::ops::Range<usize>,
    epsilon_probability: f64,
) -> Nfa {
    let mut nfa = Nfa::new();
    for i in 0..state_count {
        nfa.add_state(format!("s{}", i), false, r.random_bool(0.3));
    }

    for i in 0..state_count {
        for _ in 0..r.random_range(transitions_per_state.clone()) {
            let dst = format!("s{}", r.random_range(0..state_count));
            let symbol = if r.random_bool(epsilon_probability) {
                Symbol::Epsilon
            } else {
                Symbol::text(letters[r.random_range(0..letters.len())])
            };
            nfa.add_transition(&format!("s{}", i), symbol, &dst).unwrap();
        }
    }

    nfa
}
