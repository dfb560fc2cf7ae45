use rand::seq::SliceRandom;
use rand::Rng;
use strum::IntoEnumIterator;

use crate::card::{Card, Rank, Suit};
use crate::error::EngineError;

const CARDS_PER_DECK: usize = 52;
const HALF_DECK: usize = 26;

/// Represents a dealing shoe in the real world: N standard decks shuffled
/// once per build, dealt sequentially until the cut card is reached. A shoe
/// is replaced as a unit at a round boundary, never reshuffled mid-round.
#[derive(Debug, Clone)]
pub struct Shoe {
    num_decks: u8,
    cards: Vec<Card>,
    deal_index: usize,
    cut_index: usize,
    reshuffle_needed: bool,
}

impl Shoe {
    /// Builds and shuffles a new shoe. The cut card is placed so that between
    /// half a deck and a deck and a half is left undealt, in half-deck steps.
    pub fn new<R: Rng>(num_decks: u8, rng: &mut R) -> Shoe {
        let mut cards = Vec::with_capacity(num_decks as usize * CARDS_PER_DECK);
        for _ in 0..num_decks {
            for suit in Suit::iter() {
                for rank in Rank::iter() {
                    cards.push(Card { rank, suit });
                }
            }
        }
        cards.shuffle(rng);
        // A shoe smaller than the sampled leftover keeps its cut at the top.
        let leftover = (HALF_DECK * rng.gen_range(1..=3)).min(cards.len());
        let cut_index = cards.len() - leftover;
        Shoe {
            num_decks,
            cards,
            deal_index: 0,
            cut_index,
            reshuffle_needed: false,
        }
    }

    /// Deals one card and advances the cursor. Reaching the cut card raises
    /// the reshuffle flag; the flag is only sampled between rounds, so
    /// dealing continues past the cut until the current round finishes.
    /// Running out of physical cards means the orchestrator ignored the flag
    /// at the previous round boundary.
    pub fn deal(&mut self) -> Result<Card, EngineError> {
        if self.deal_index >= self.cards.len() {
            self.reshuffle_needed = true;
            return Err(EngineError::ShoeExhausted);
        }
        let card = self.cards[self.deal_index];
        self.deal_index += 1;
        if self.deal_index >= self.cut_index {
            self.reshuffle_needed = true;
        }
        Ok(card)
    }

    /// Observable between-round signal that this shoe is spent and must be
    /// rebuilt before the next round.
    pub fn reshuffle_needed(&self) -> bool {
        self.reshuffle_needed
    }

    /// Decks left undealt, rounded to the nearest half deck and floored at
    /// half a deck so true-count division stays well defined.
    pub fn decks_remaining(&self) -> f64 {
        let dealt = (self.deal_index + 1) as f64 / CARDS_PER_DECK as f64;
        let remaining = self.num_decks as f64 - dealt;
        let rounded = (remaining * 2.0).round() / 2.0;
        rounded.max(0.5)
    }

    pub fn num_decks(&self) -> u8 {
        self.num_decks
    }

    pub fn cards_dealt(&self) -> usize {
        self.deal_index
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deal_index >= self.cards.len()
    }

    /// Reorders the undealt portion so the next draws are exactly `firsts`,
    /// keeping the overall shoe composition intact. Panics if the undealt
    /// cards cannot supply the requested ranks; intended for rigging
    /// deterministic scenarios in tests.
    pub fn shuffle_with_firsts(&mut self, firsts: &[Rank]) {
        for (offset, rank) in firsts.iter().enumerate() {
            let target = self.deal_index + offset;
            let found = self.cards[target..]
                .iter()
                .position(|card| card.rank == *rank)
                .expect("shoe cannot supply the requested rank");
            self.cards.swap(target, target + found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    #[test]
    fn new_shoe_has_full_composition() {
        let num_decks = 3;
        let shoe = Shoe::new(num_decks, &mut rng());
        assert_eq!(shoe.len(), num_decks as usize * 52);
        let aces = shoe
            .cards
            .iter()
            .filter(|card| card.rank == Rank::Ace)
            .count();
        assert_eq!(aces, num_decks as usize * 4);
    }

    #[test]
    fn cut_card_leaves_at_least_half_a_deck() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let shoe = Shoe::new(6, &mut rng);
            let leftover = shoe.len() - shoe.cut_index;
            assert!(leftover >= HALF_DECK);
            assert!(leftover <= 3 * HALF_DECK);
        }
    }

    #[test]
    fn small_shoes_build_for_any_cut_sample() {
        // A single deck cannot hold the deepest cut band; the leftover
        // saturates at the whole shoe instead of underflowing.
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            for num_decks in [1u8, 2] {
                let shoe = Shoe::new(num_decks, &mut rng);
                assert!(shoe.cut_index <= shoe.len());
                let leftover = shoe.len() - shoe.cut_index;
                assert!(leftover >= HALF_DECK.min(shoe.len()));
            }
        }
    }

    #[test]
    fn reshuffle_flag_raises_at_cut_card() {
        let mut shoe = Shoe::new(6, &mut rng());
        assert!(shoe.cut_index > 0);
        while shoe.cards_dealt() < shoe.cut_index {
            assert!(!shoe.reshuffle_needed());
            shoe.deal().unwrap();
        }
        assert!(shoe.reshuffle_needed());
    }

    #[test]
    fn dealing_continues_past_the_cut_until_physical_exhaustion() {
        let mut shoe = Shoe::new(1, &mut rng());
        for _ in 0..52 {
            shoe.deal().unwrap();
        }
        assert!(shoe.is_empty());
        assert_eq!(shoe.deal(), Err(EngineError::ShoeExhausted));
    }

    #[test]
    fn decks_remaining_rounds_to_half_decks_and_floors() {
        let mut shoe = Shoe::new(2, &mut rng());
        assert_eq!(shoe.decks_remaining(), 2.0);
        for _ in 0..26 {
            shoe.deal().unwrap();
        }
        assert_eq!(shoe.decks_remaining(), 1.5);
        for _ in 0..26 {
            shoe.deal().unwrap();
        }
        assert_eq!(shoe.decks_remaining(), 1.0);
        // Near the bottom the estimate never reaches zero.
        while !shoe.is_empty() {
            shoe.deal().unwrap();
        }
        assert_eq!(shoe.decks_remaining(), 0.5);
    }

    #[test]
    fn shuffle_with_firsts_forces_next_draws() {
        let mut shoe = Shoe::new(2, &mut rng());
        let firsts = [Rank::Ace, Rank::Eight, Rank::Eight, Rank::King];
        shoe.shuffle_with_firsts(&firsts);
        for rank in firsts {
            assert_eq!(shoe.deal().unwrap().rank, rank);
        }
        assert_eq!(shoe.len(), 104);
    }

    #[test]
    #[should_panic]
    fn shuffle_with_firsts_panics_when_ranks_run_out() {
        let mut shoe = Shoe::new(1, &mut rng());
        shoe.shuffle_with_firsts(&[Rank::Ace; 5]);
    }
}
