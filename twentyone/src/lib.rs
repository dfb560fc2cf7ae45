pub mod card;
pub mod counter;
pub mod dealer;
pub mod error;
pub mod hand;
pub mod player;
pub mod round;
pub mod shoe;
pub mod strategy;

pub use card::{Card, Rank, Suit};
pub use counter::{mode_true_count, true_count, Counter, CountingMode};
pub use dealer::Dealer;
pub use error::EngineError;
pub use hand::{Hand, HandStatus};
pub use player::{Player, TurnContext};
pub use round::{HandResult, Round, RoundPhase, RoundSummary};
pub use shoe::Shoe;
pub use strategy::{sized_bet, Action, StrategyTable, INSURANCE_TRUE_COUNT};

/// Table rules, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub num_decks: u8,
    pub dealer_hit_on_soft_17: bool,
    pub payout_blackjack: f64,
    pub min_bet: u32,
    pub denomination: u32,
    pub resplit_limit: u8,
    pub insurance_threshold: f64,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            num_decks: 6,
            dealer_hit_on_soft_17: false,
            payout_blackjack: 1.5,
            min_bet: 5,
            denomination: 5,
            resplit_limit: 4,
            insurance_threshold: INSURANCE_TRUE_COUNT,
        }
    }
}
