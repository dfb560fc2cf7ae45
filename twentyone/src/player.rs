use tracing::debug;

use crate::counter::CountingMode;
use crate::hand::Hand;
use crate::strategy::{Action, Code, StrategyTable, HIGH_LOW_DEVIATIONS};

/// Everything a hand decision needs to know about the table at the moment of
/// the decision. `split_depth` is the player's current hand count, so the
/// split gate is simply `split_depth < resplit_limit`.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext {
    pub upcard_value: u8,
    pub true_count: f64,
    pub split_depth: u8,
    pub resplit_limit: u8,
}

/// A seated player: a strategy card, a counting scheme, the hands in front of
/// them (more than one after splits) and a running bankroll.
pub struct Player {
    name: String,
    tables: StrategyTable,
    counting_mode: CountingMode,
    pub hands: Vec<Hand>,
    bankroll: i64,
}

impl Player {
    pub fn new(name: &str, counting_mode: CountingMode, bankroll: i64) -> Player {
        Player {
            name: name.to_string(),
            tables: StrategyTable::standard_multideck(),
            counting_mode,
            hands: Vec::new(),
            bankroll,
        }
    }

    /// A flat-betting basic-strategy player who joins a hot shoe to soak up
    /// extra cards.
    pub fn companion(name: &str, bankroll: i64) -> Player {
        Player::new(name, CountingMode::NoCount, bankroll)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn counting_mode(&self) -> CountingMode {
        self.counting_mode
    }

    pub fn bankroll(&self) -> i64 {
        self.bankroll
    }

    pub fn apply_net(&mut self, net: i64) {
        self.bankroll += net;
    }

    /// Replace whatever hands are left from the previous round with a single
    /// fresh hand carrying this round's bet.
    pub fn place_initial_bet(&mut self, bet: u32) {
        self.hands = vec![Hand::with_bet(bet)];
    }

    /// Insurance is a count decision, never a basic-strategy one.
    pub fn takes_insurance(&self, true_count: f64, threshold: f64) -> bool {
        self.counting_mode == CountingMode::HighLow && true_count >= threshold
    }

    /// Decide what to do with the hand at `hand_index`.
    pub fn decide(&mut self, hand_index: usize, ctx: TurnContext) -> Action {
        let action = decide(&self.tables, self.counting_mode, &mut self.hands[hand_index], ctx);
        debug!(
            player = %self.name,
            hand = %self.hands[hand_index],
            upcard = ctx.upcard_value,
            ?action,
            "hand decision"
        );
        action
    }
}

/// Resolve one table code into an action, degrading doubles on hands that can
/// no longer double.
fn interpret(code: Code, can_double: bool) -> Action {
    match code {
        Code::H => Action::Hit,
        Code::S => Action::Stand,
        Code::D => {
            if can_double {
                Action::Double
            } else {
                Action::Hit
            }
        }
        Code::P => Action::Split,
    }
}

fn decide(
    tables: &StrategyTable,
    mode: CountingMode,
    hand: &mut Hand,
    ctx: TurnContext,
) -> Action {
    if hand.is_busted() {
        return Action::Bust;
    }
    if hand.is_blackjack() {
        return Action::Blackjack;
    }

    let (total, soft) = hand.evaluate();
    let can_double = hand.cards().len() == 2;
    let can_split = hand.is_pair() && ctx.split_depth < ctx.resplit_limit;

    if mode == CountingMode::HighLow {
        for dev in HIGH_LOW_DEVIATIONS {
            if dev.total == total
                && dev.soft == soft
                && dev.pair == can_split
                && dev.upcard_value == ctx.upcard_value
                && dev.met(ctx.true_count)
            {
                return match dev.action {
                    Code::P => Action::Split,
                    code => interpret(code, can_double),
                };
            }
        }
    }

    if can_split {
        // 4,4 and 5,5 carry no pair rule and fall through to the hard
        // table. A double code makes no sense for a pair and plays as a hit.
        match tables.pair_action(hand.cards()[0].rank, ctx.upcard_value) {
            Some(Code::P) => return Action::Split,
            Some(code) => return interpret(code, false),
            None => {}
        }
    }

    if soft {
        let code = tables.soft_action(total, ctx.upcard_value).unwrap_or(Code::H);
        return interpret(code, can_double);
    }

    match tables.hard_action(total, ctx.upcard_value) {
        Some(code) => interpret(code, can_double),
        None => {
            if total < 5 {
                Action::Hit
            } else {
                Action::Stand
            }
        }
    }
}
