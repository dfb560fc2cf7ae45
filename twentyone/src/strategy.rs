use crate::card::Rank;
use crate::counter::CountingMode;

/// What a player elects to do with a hand. `Bust` and `Blackjack` report a
/// terminal state rather than request a card; they are ordinary return
/// values, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Split,
    Bust,
    Blackjack,
}

/// Single-letter table cell, straight off a printed strategy card. `D`
/// resolves to a double only while the hand still has exactly two cards,
/// degrading to a hit otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    H,
    S,
    D,
    P,
}

/// One row of a strategy table: an `any` override that beats everything, an
/// optional cell per dealer upcard value (2..=11, ace high), and a `default`
/// fallback. Resolution order is any, then the exact upcard, then default,
/// then fall through to the next table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Row {
    any: Option<Code>,
    per_upcard: [Option<Code>; 10],
    default: Option<Code>,
}

impl Row {
    const EMPTY: Row = Row {
        any: None,
        per_upcard: [None; 10],
        default: None,
    };

    fn any(code: Code) -> Row {
        Row {
            any: Some(code),
            ..Row::EMPTY
        }
    }

    fn at(mut self, upcard: u8, code: Code) -> Row {
        self.per_upcard[(upcard - 2) as usize] = Some(code);
        self
    }

    fn span(mut self, lo: u8, hi: u8, code: Code) -> Row {
        for upcard in lo..=hi {
            self.per_upcard[(upcard - 2) as usize] = Some(code);
        }
        self
    }

    fn or_default(mut self, code: Code) -> Row {
        self.default = Some(code);
        self
    }

    fn lookup(&self, upcard_value: u8) -> Option<Code> {
        self.any
            .or(self.per_upcard[(upcard_value - 2) as usize])
            .or(self.default)
    }
}

/// Basic-strategy lookup tables keyed by normalized hand shape and dealer
/// upcard value. The contents are configuration; the engine only defines the
/// shape and the precedence rules.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    pairs: [Row; 10],
    soft: [Row; 9],
    hard: [Row; 13],
}

/// Row index for a normalized pair: 2-9 by face, all ten-valued ranks
/// together, aces last.
fn pair_index(rank: Rank) -> usize {
    if rank.is_ten_valued() {
        8
    } else if rank == Rank::Ace {
        9
    } else {
        rank.base_value() as usize - 2
    }
}

impl StrategyTable {
    /// The standard multi-deck basic strategy card.
    pub fn standard_multideck() -> StrategyTable {
        use Code::{D, H, P, S};

        let mut pairs = [Row::EMPTY; 10];
        pairs[pair_index(Rank::Ace)] = Row::any(P);
        pairs[pair_index(Rank::Eight)] = Row::any(P);
        pairs[pair_index(Rank::Nine)] = Row::EMPTY.span(2, 6, P).at(8, P).at(9, P).or_default(S);
        pairs[pair_index(Rank::Seven)] = Row::EMPTY.span(2, 7, P).or_default(H);
        pairs[pair_index(Rank::Six)] = Row::EMPTY.span(2, 6, P).or_default(H);
        pairs[pair_index(Rank::Three)] = Row::EMPTY.span(2, 7, P).or_default(H);
        pairs[pair_index(Rank::Two)] = Row::EMPTY.span(2, 7, P).or_default(H);
        pairs[pair_index(Rank::Ten)] = Row::any(S);
        // 4,4 and 5,5 carry no pair rule and resolve as hard 8 and hard 10.

        let soft = [
            Row::any(H),                                                   // 13
            Row::any(H),                                                   // 14
            Row::any(H),                                                   // 15
            Row::EMPTY.span(4, 6, D).or_default(H),                        // 16
            Row::EMPTY.span(3, 6, D).or_default(H),                        // 17
            Row::EMPTY.at(2, S).span(3, 6, D).span(7, 8, S).or_default(H), // 18
            Row::EMPTY.at(6, D).or_default(S),                             // 19
            Row::any(S),                                                   // 20
            Row::any(S),                                                   // 21
        ];

        let hard = [
            Row::any(H),                            // 5
            Row::any(H),                            // 6
            Row::any(H),                            // 7
            Row::any(H),                            // 8
            Row::EMPTY.span(3, 6, D).or_default(H), // 9
            Row::EMPTY.span(2, 9, D).or_default(H), // 10
            Row::EMPTY.at(11, H).or_default(D),     // 11
            Row::EMPTY.span(4, 6, S).or_default(H), // 12
            Row::EMPTY.span(2, 6, S).or_default(H), // 13
            Row::EMPTY.span(2, 6, S).or_default(H), // 14
            Row::EMPTY.span(2, 6, S).or_default(H), // 15
            Row::EMPTY.span(2, 6, S).or_default(H), // 16
            Row::any(S),                            // 17
        ];

        StrategyTable { pairs, soft, hard }
    }

    /// Pair rule for a normalized pair rank, or fall-through.
    pub fn pair_action(&self, rank: Rank, upcard_value: u8) -> Option<Code> {
        self.pairs[pair_index(rank)].lookup(upcard_value)
    }

    /// Soft-total rule for totals 13..=21; anything unmapped defaults to a
    /// hit at the decision layer.
    pub fn soft_action(&self, total: u8, upcard_value: u8) -> Option<Code> {
        if !(13..=21).contains(&total) {
            return None;
        }
        self.soft[(total - 13) as usize].lookup(upcard_value)
    }

    /// Hard-total rule for totals 5..=17; below that range the decision layer
    /// hits, above it stands.
    pub fn hard_action(&self, total: u8, upcard_value: u8) -> Option<Code> {
        if !(5..=17).contains(&total) {
            return None;
        }
        self.hard[(total - 5) as usize].lookup(upcard_value)
    }
}

/// A count-triggered override of basic strategy, keyed by hand shape, dealer
/// upcard and a true-count threshold. Consulted only by hi-lo players; the
/// first matching entry wins.
#[derive(Debug, Clone, Copy)]
pub struct Deviation {
    pub total: u8,
    pub soft: bool,
    pub pair: bool,
    pub upcard_value: u8,
    pub threshold: f64,
    pub inclusive: bool,
    pub action: Code,
}

impl Deviation {
    pub fn met(&self, true_count: f64) -> bool {
        if self.inclusive {
            true_count >= self.threshold
        } else {
            true_count > self.threshold
        }
    }
}

const fn dev(
    total: u8,
    pair: bool,
    upcard_value: u8,
    threshold: f64,
    inclusive: bool,
    action: Code,
) -> Deviation {
    Deviation {
        total,
        soft: false,
        pair,
        upcard_value,
        threshold,
        inclusive,
        action,
    }
}

/// The hi-lo deviation set: the classic hard-total indices plus the two
/// high-count ten-pair splits.
pub const HIGH_LOW_DEVIATIONS: &[Deviation] = &[
    dev(16, false, 10, 0.0, false, Code::S),
    dev(15, false, 10, 4.0, true, Code::S),
    dev(12, false, 3, 2.0, true, Code::S),
    dev(12, false, 2, 3.0, true, Code::S),
    dev(11, false, 11, 0.0, false, Code::D),
    dev(10, false, 10, 4.0, true, Code::D),
    dev(9, false, 2, 1.0, true, Code::D),
    dev(20, true, 5, 5.0, true, Code::P),
    dev(20, true, 6, 4.0, true, Code::P),
];

/// Insurance is taken only when the active true count clears this threshold.
pub const INSURANCE_TRUE_COUNT: f64 = 3.2;

/// Initial bet for a round, a monotone step table over the active scheme's
/// true count. Hi-lo adds fixed denomination increments to a doubled base
/// bet; ace-five multiplies the base by doubling factors at successive
/// thresholds; no counting mode bets the flat minimum.
pub fn sized_bet(mode: CountingMode, true_count: f64, min_bet: u32, denomination: u32) -> u32 {
    match mode {
        CountingMode::NoCount => min_bet,
        CountingMode::HighLow => {
            let increments = if true_count < 1.0 {
                0
            } else if true_count < 2.0 {
                1
            } else if true_count < 3.0 {
                2
            } else if true_count < 4.0 {
                4
            } else {
                6
            };
            min_bet * 2 + denomination * increments
        }
        CountingMode::AceFive => {
            let factor = if true_count < 1.0 {
                1
            } else if true_count < 2.0 {
                2
            } else if true_count < 3.0 {
                4
            } else {
                8
            };
            min_bet * factor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_precedence_is_any_then_exact_then_default() {
        let row = Row::any(Code::S).at(5, Code::D).or_default(Code::H);
        assert_eq!(row.lookup(5), Some(Code::S));

        let row = Row::EMPTY.at(5, Code::D).or_default(Code::H);
        assert_eq!(row.lookup(5), Some(Code::D));
        assert_eq!(row.lookup(9), Some(Code::H));

        assert_eq!(Row::EMPTY.lookup(7), None);
    }

    #[test]
    fn standard_card_spot_checks() {
        let table = StrategyTable::standard_multideck();
        // Pairs: aces and eights always split, tens never.
        assert_eq!(table.pair_action(Rank::Ace, 2), Some(Code::P));
        assert_eq!(table.pair_action(Rank::Eight, 10), Some(Code::P));
        assert_eq!(table.pair_action(Rank::King, 6), Some(Code::S));
        assert_eq!(table.pair_action(Rank::Nine, 7), Some(Code::S));
        assert_eq!(table.pair_action(Rank::Five, 6), None);
        // Soft: 18 doubles against 3-6, stands against 2 and 7-8, else hits.
        assert_eq!(table.soft_action(18, 4), Some(Code::D));
        assert_eq!(table.soft_action(18, 2), Some(Code::S));
        assert_eq!(table.soft_action(18, 9), Some(Code::H));
        assert_eq!(table.soft_action(12, 5), None);
        // Hard: stiff totals stand against weak upcards, 11 doubles except
        // into an ace.
        assert_eq!(table.hard_action(16, 10), Some(Code::H));
        assert_eq!(table.hard_action(16, 6), Some(Code::S));
        assert_eq!(table.hard_action(11, 11), Some(Code::H));
        assert_eq!(table.hard_action(11, 9), Some(Code::D));
        assert_eq!(table.hard_action(4, 5), None);
        assert_eq!(table.hard_action(18, 5), None);
    }

    #[test]
    fn deviation_thresholds_respect_strictness() {
        let sixteen_vs_ten = &HIGH_LOW_DEVIATIONS[0];
        assert!(!sixteen_vs_ten.met(0.0));
        assert!(sixteen_vs_ten.met(0.1));

        let ten_pair_vs_six = &HIGH_LOW_DEVIATIONS[8];
        assert!(!ten_pair_vs_six.met(3.9));
        assert!(ten_pair_vs_six.met(4.0));
    }

    #[test]
    fn bet_sizing_steps_are_monotone() {
        for mode in [CountingMode::HighLow, CountingMode::AceFive] {
            let mut last = 0;
            for tc in [-2.0, 0.0, 1.0, 1.5, 2.0, 3.0, 4.0, 6.0] {
                let bet = sized_bet(mode, tc, 5, 10);
                assert!(bet >= last, "bet spread must never shrink as tc rises");
                last = bet;
            }
        }
    }

    #[test]
    fn bet_sizing_bands() {
        assert_eq!(sized_bet(CountingMode::NoCount, 5.0, 5, 10), 5);
        assert_eq!(sized_bet(CountingMode::HighLow, 0.0, 5, 10), 10);
        assert_eq!(sized_bet(CountingMode::HighLow, 1.2, 5, 10), 20);
        assert_eq!(sized_bet(CountingMode::HighLow, 4.5, 5, 10), 70);
        assert_eq!(sized_bet(CountingMode::AceFive, 0.0, 5, 10), 5);
        assert_eq!(sized_bet(CountingMode::AceFive, 2.5, 5, 10), 20);
        assert_eq!(sized_bet(CountingMode::AceFive, 3.0, 5, 10), 40);
    }
}
