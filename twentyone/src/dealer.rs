use crate::counter::Counter;
use crate::error::EngineError;
use crate::hand::Hand;
use crate::shoe::Shoe;

/// The house side of the table: exactly one hand and the fixed stand/hit
/// rule. No bet, no splits; bust and blackjack matter only at settlement.
#[derive(Debug)]
pub struct Dealer {
    pub hand: Hand,
    hit_on_soft_17: bool,
}

impl Dealer {
    pub fn new(hit_on_soft_17: bool) -> Dealer {
        Dealer {
            hand: Hand::new(),
            hit_on_soft_17,
        }
    }

    /// Runs the dealer's turn to completion. Any total above 17 stands; on
    /// exactly 17 the only question is the soft-17 house rule. Note the
    /// asymmetry: strict `>` versus `==` with the soft qualifier. Every card
    /// drawn is registered with the counter as it lands.
    pub fn play_turn(&mut self, shoe: &mut Shoe, counter: &mut Counter) -> Result<(), EngineError> {
        loop {
            let (total, soft) = self.hand.evaluate();
            if total > 21 {
                break;
            }
            if total > 17 || (total == 17 && !(soft && self.hit_on_soft_17)) {
                break;
            }
            let card = shoe.deal()?;
            counter.observe(card);
            self.hand.add_card(card);
        }
        Ok(())
    }

    /// Fresh empty hand for the next round.
    pub fn reset(&mut self) {
        self.hand = Hand::new();
    }

    pub fn hits_soft_17(&self) -> bool {
        self.hit_on_soft_17
    }
}
