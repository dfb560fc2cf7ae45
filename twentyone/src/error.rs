use thiserror::Error;

use crate::hand::HandStatus;

/// Closed set of engine failures. Player outcomes such as busting, standing
/// or holding a blackjack are ordinary [`Action`](crate::Action) values,
/// never errors; nothing here is retried internally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Split requested on a hand that is not a two-card pair. Caller contract
    /// violation; the hand is left untouched.
    #[error("cannot split a {cards}-card hand that is not a pair")]
    InvalidSplit { cards: usize },

    /// The physical card sequence ran out mid-round. The orchestrator failed
    /// to honor the reshuffle flag at the previous round boundary.
    #[error("shoe exhausted mid-round; reshuffle flag was not honored")]
    ShoeExhausted,

    /// A hand reached settlement in a status the payout rules do not cover,
    /// or an illegal status transition was attempted.
    #[error("hand in unrecognized status {status} at settlement")]
    UnrecognizedStatus { status: HandStatus },

    /// A phase-gated round method was called out of order.
    #[error("{call} is only allowed in the {expected} phase")]
    WrongPhase {
        call: &'static str,
        expected: &'static str,
    },
}
