use thiserror::Error;

/// Errors raised by the mutation and query operations of the automata.
///
/// Getting stuck during a simulation is not an error, it is reported through
/// the result of the simulation itself.
#[derive(Debug, Error)]
pub enum AutomatonError {
    #[error("state `{0}` does not exist")]
    UnknownState(String),

    #[error("the name `{0}` is already in use by another state")]
    NameConflict(String),

    #[error("minimization requires a valid DFA")]
    InvalidDfa,

    #[error("no start state is defined")]
    MissingStartState,

    #[error("transition symbols must not be empty")]
    EmptySymbol,

    #[error("symbol `{0}` contains the transition key separator `,`")]
    ReservedSymbol(String),

    #[error("invalid move direction `{0}`, expected `L` or `R`")]
    InvalidDirection(String),

    #[error("pushdown search exceeded the limit of {limit} configurations")]
    ConfigurationLimit { limit: usize },

    #[error("pushdown search exceeded the stack depth limit of {limit}")]
    StackDepthLimit { limit: usize },

    #[error("malformed automaton document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = AutomatonError> = std::result::Result<T, E>;
