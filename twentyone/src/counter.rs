use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

use crate::card::Card;

/// Which running tally a player consults for decisions and bet sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum CountingMode {
    NoCount,
    HighLow,
    AceFive,
}

/// Per-shoe running tallies, one per supported counting scheme, updated once
/// for every card exposed to play and reset exactly when a new shoe is built.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counter {
    high_low: i32,
    ace_five: i32,
}

impl Counter {
    pub fn new() -> Counter {
        Counter::default()
    }

    pub fn observe(&mut self, card: Card) {
        self.high_low += card.rank.high_low_tag();
        self.ace_five += card.rank.ace_five_tag();
    }

    pub fn running_high_low(&self) -> i32 {
        self.high_low
    }

    pub fn running_ace_five(&self) -> i32 {
        self.ace_five
    }

    pub fn reset(&mut self) {
        *self = Counter::default();
    }
}

/// Running count normalized by the decks left in the shoe. Kept outside
/// `Counter` because it depends on shoe state; `Shoe::decks_remaining` floors
/// at 0.5, so the division is always well defined.
pub fn true_count(running: i32, decks_remaining: f64) -> f64 {
    running as f64 / decks_remaining
}

/// The true count a given player actually plays by: their scheme's tally
/// normalized, or zero when they are not counting.
pub fn mode_true_count(mode: CountingMode, counter: &Counter, decks_remaining: f64) -> f64 {
    match mode {
        CountingMode::NoCount => 0.0,
        CountingMode::HighLow => true_count(counter.running_high_low(), decks_remaining),
        CountingMode::AceFive => true_count(counter.running_ace_five(), decks_remaining),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank;
    use crate::shoe::Shoe;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn card(rank: Rank) -> Card {
        Card {
            rank,
            suit: crate::card::Suit::Spades,
        }
    }

    #[test]
    fn tallies_update_independently() {
        let mut counter = Counter::new();
        counter.observe(card(Rank::Five));
        assert_eq!(counter.running_high_low(), 1);
        assert_eq!(counter.running_ace_five(), 1);
        counter.observe(card(Rank::Ace));
        assert_eq!(counter.running_high_low(), 0);
        assert_eq!(counter.running_ace_five(), 0);
        counter.observe(card(Rank::Eight));
        assert_eq!(counter.running_high_low(), 0);
        assert_eq!(counter.running_ace_five(), 0);
        counter.observe(card(Rank::King));
        assert_eq!(counter.running_high_low(), -1);
        assert_eq!(counter.running_ace_five(), 0);
    }

    #[test]
    fn counts_return_to_zero_over_a_full_shoe() {
        let mut rng = StdRng::seed_from_u64(3);
        for num_decks in [1u8, 2, 6, 8] {
            let mut shoe = Shoe::new(num_decks, &mut rng);
            let mut counter = Counter::new();
            while !shoe.is_empty() {
                counter.observe(shoe.deal().unwrap());
            }
            assert_eq!(counter.running_high_low(), 0);
            assert_eq!(counter.running_ace_five(), 0);
        }
    }

    #[test]
    fn reset_zeroes_both_tallies() {
        let mut counter = Counter::new();
        counter.observe(card(Rank::Five));
        counter.observe(card(Rank::Two));
        counter.reset();
        assert_eq!(counter.running_high_low(), 0);
        assert_eq!(counter.running_ace_five(), 0);
    }

    #[test]
    fn true_count_scales_by_decks_remaining() {
        assert_eq!(true_count(6, 3.0), 2.0);
        assert_eq!(true_count(-4, 2.0), -2.0);
        // The 0.5-deck floor keeps the division finite late in the shoe.
        assert_eq!(true_count(3, 0.5), 6.0);
    }

    #[test]
    fn counting_mode_parses_from_config_strings() {
        let mode: CountingMode = "HighLow".parse().unwrap();
        assert_eq!(mode, CountingMode::HighLow);
        assert!("Hunchback".parse::<CountingMode>().is_err());
    }
}
