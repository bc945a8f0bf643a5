use serde::Serialize;

use crate::automaton::{
    FiniteStateMachine, StateId, char_offset,
    matcher::{LongestMatch, SymbolMatcher},
};

/// The machine after a step: its state, everything emitted so far and the
/// number of characters consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransducerStep {
    pub state: StateId,
    pub output: String,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransducerRun {
    pub steps: Vec<TransducerStep>,
    /// The complete output, `None` if the machine got stuck before the end
    /// of the input.
    pub output: Option<String>,
}

impl TransducerRun {
    pub fn is_stuck(&self) -> bool {
        self.output.is_none()
    }
}

/// Deterministic machines that translate their input into an output string.
///
/// A step follows the first symbol the matcher selects among those leaving
/// the current state. There are no epsilon transitions.
pub trait Transducer: FiniteStateMachine {
    /// The output emitted on entering the start state, before any input is
    /// read.
    fn initial_output(&self, start: &str) -> &str;

    /// The input symbols of the transitions leaving `state`.
    fn input_symbols(&self, state: &str) -> Vec<&str>;

    /// Follows the transition of `state` on `input` and returns the
    /// destination together with the output emitted by the step.
    fn follow(&self, state: &str, input: &str) -> Option<(&StateId, &str)>;

    fn simulate_history_with(&self, input: &str, matcher: &impl SymbolMatcher) -> TransducerRun {
        let Some(start) = self.start_state() else {
            return TransducerRun {
                steps: vec![],
                output: None,
            };
        };

        let mut state = start;
        let mut output = self.initial_output(start).to_string();
        let mut position = 0;
        let mut steps = vec![TransducerStep {
            state: state.clone(),
            output: output.clone(),
            cursor: 0,
        }];

        while position < input.len() {
            let candidates = self.input_symbols(state);
            let taken = matcher
                .select(&candidates, &input[position..])
                .into_iter()
                .find_map(|symbol| Some((symbol, self.follow(state, symbol)?)));

            let Some((symbol, (next, emitted))) = taken else {
                return TransducerRun {
                    steps,
                    output: None,
                };
            };

            state = next;
            output.push_str(emitted);
            position += symbol.len();
            steps.push(TransducerStep {
                state: state.clone(),
                output: output.clone(),
                cursor: char_offset(input, position),
            });
        }

        TransducerRun {
            steps,
            output: Some(output),
        }
    }

    /// Runs the machine with the [`LongestMatch`] policy.
    fn simulate_history(&self, input: &str) -> TransducerRun {
        self.simulate_history_with(input, &LongestMatch)
    }

    /// The output for `input`, `None` if the machine gets stuck.
    fn simulate(&self, input: &str) -> Option<String> {
        self.simulate_history(input).output
    }
}
