use crate::card::{Card, Rank};
use crate::error::EngineError;

/// Progress of a single hand. `Active` is the only status a hand may leave;
/// every other status is terminal and reached exactly once, at bust
/// detection, blackjack detection or settlement. The sole refinement allowed
/// afterwards is settlement turning `Blackjack` into its payout outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandStatus {
    Active,
    Bust,
    Blackjack,
    BlackjackWin,
    Won,
    Lost,
    Push,
}

impl HandStatus {
    pub fn is_terminal(self) -> bool {
        self != HandStatus::Active
    }
}

impl std::fmt::Display for HandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HandStatus::Active => "ACTIVE",
            HandStatus::Bust => "BUST",
            HandStatus::Blackjack => "BLACKJACK",
            HandStatus::BlackjackWin => "BLACKJACK WIN",
            HandStatus::Won => "WON",
            HandStatus::Lost => "LOST",
            HandStatus::Push => "PUSH",
        };
        write!(f, "{}", label)
    }
}

/// One betting hand, for a player or the dealer. Total and softness are
/// derived from the cards and kept in sync by `add_card`.
#[derive(Debug, Clone)]
pub struct Hand {
    cards: Vec<Card>,
    value: u8,
    soft: bool,
    bet: u32,
    insurance_bet: u32,
    status: HandStatus,
    was_split: bool,
    doubled: bool,
}

impl Hand {
    pub fn new() -> Hand {
        Hand::with_bet(0)
    }

    pub fn with_bet(bet: u32) -> Hand {
        Hand {
            cards: Vec::with_capacity(3),
            value: 0,
            soft: false,
            bet,
            insurance_bet: 0,
            status: HandStatus::Active,
            was_split: false,
            doubled: false,
        }
    }

    /// Appends one card and re-evaluates the total. Always valid.
    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
        self.evaluate();
    }

    /// Best total of the hand: each ace counts 11, then aces demote to 1 one
    /// at a time while the total exceeds 21. The hand is soft while at least
    /// one ace still counts 11. Pure in the card sequence, so idempotent.
    pub fn evaluate(&mut self) -> (u8, bool) {
        let mut total: u8 = 0;
        let mut aces = 0;
        for card in &self.cards {
            total += card.rank.base_value();
            if card.rank == Rank::Ace {
                aces += 1;
            }
        }
        while total > 21 && aces > 0 {
            total -= 10;
            aces -= 1;
        }
        self.soft = aces > 0;
        self.value = total;
        (total, self.soft)
    }

    /// True if the total exceeds 21. The first positive answer moves the hand
    /// to its terminal `Bust` status; later calls are idempotent.
    pub fn is_busted(&mut self) -> bool {
        if self.value > 21 {
            if self.status == HandStatus::Active {
                self.status = HandStatus::Bust;
            }
            true
        } else {
            false
        }
    }

    /// True iff exactly two cards total 21. A three-card 21 is never a
    /// blackjack. Detection moves an active hand to `Blackjack`.
    pub fn is_blackjack(&mut self) -> bool {
        if self.cards.len() == 2 && self.value == 21 {
            if self.status == HandStatus::Active {
                self.status = HandStatus::Blackjack;
            }
            true
        } else {
            false
        }
    }

    /// A two-card hand splits when both ranks are equal or both are
    /// ten-valued. Ten-equivalence applies to pairing only, never to totals.
    pub fn is_pair(&self) -> bool {
        match self.cards.as_slice() {
            [first, second] => {
                first.rank == second.rank
                    || (first.rank.is_ten_valued() && second.rank.is_ten_valued())
            }
            _ => false,
        }
    }

    /// Detaches the second card into a sibling hand carrying the same bet.
    /// The caller must deal one fresh card to each resulting hand before any
    /// further action. Rejects anything but a valid two-card pair, leaving
    /// the hand untouched.
    pub fn split(&mut self) -> Result<Hand, EngineError> {
        if !self.is_pair() {
            return Err(EngineError::InvalidSplit {
                cards: self.cards.len(),
            });
        }
        let card = match self.cards.pop() {
            Some(card) => card,
            None => {
                return Err(EngineError::InvalidSplit {
                    cards: self.cards.len(),
                })
            }
        };
        self.was_split = true;
        self.evaluate();
        let mut sibling = Hand::with_bet(self.bet);
        sibling.was_split = true;
        sibling.add_card(card);
        Ok(sibling)
    }

    /// Doubles the bet. The caller deals exactly one more card, after which
    /// the hand can neither hit nor split again.
    pub fn double_down(&mut self) {
        self.bet *= 2;
        self.doubled = true;
    }

    pub fn put_insurance_bet(&mut self, stake: u32) {
        self.insurance_bet = stake;
    }

    /// The single transition point onto a terminal status. Re-entry into
    /// `Active` is impossible, and only settlement's refinement of
    /// `Blackjack` into its payout outcome may leave a terminal state.
    pub(crate) fn transition(&mut self, next: HandStatus) -> Result<(), EngineError> {
        let allowed = match self.status {
            HandStatus::Active => next != HandStatus::Active,
            HandStatus::Blackjack => matches!(
                next,
                HandStatus::BlackjackWin | HandStatus::Won | HandStatus::Push
            ),
            _ => false,
        };
        if !allowed {
            return Err(EngineError::UnrecognizedStatus {
                status: self.status,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_soft(&self) -> bool {
        self.soft
    }

    pub fn bet(&self) -> u32 {
        self.bet
    }

    pub fn insurance_bet(&self) -> u32 {
        self.insurance_bet
    }

    pub fn status(&self) -> HandStatus {
        self.status
    }

    pub fn was_split(&self) -> bool {
        self.was_split
    }

    pub fn is_doubled(&self) -> bool {
        self.doubled
    }
}

impl Default for Hand {
    fn default() -> Self {
        Hand::new()
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut cards = String::new();
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                cards.push(' ');
            }
            cards.push_str(&card.to_string());
        }
        let soft = if self.soft { " soft" } else { "" };
        write!(f, "[{}] {}{}", cards, self.value, soft)
    }
}
