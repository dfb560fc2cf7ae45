use std::collections::VecDeque;

use tracing::debug;
use twentyone_macros::allowed_phase;

use crate::counter::{mode_true_count, true_count, Counter};
use crate::dealer::Dealer;
use crate::error::EngineError;
use crate::hand::HandStatus;
use crate::player::{Player, TurnContext};
use crate::shoe::Shoe;
use crate::strategy::Action;
use crate::Rule;

/// Where a round currently stands. Every `Round` method is valid in exactly
/// one phase and refuses to run in any other, so a driver cannot settle an
/// undealt round or deal into a settled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Dealing,
    InsuranceCheck,
    PlayerTurns,
    DealerTurn,
    Settlement,
    Done,
}

/// One round of play against shared table state. The shoe, counter, players
/// and dealer all outlive the round; the round only threads cards and money
/// through them. Players must already hold their initial bets.
pub struct Round<'a> {
    shoe: &'a mut Shoe,
    counter: &'a mut Counter,
    players: &'a mut [Player],
    dealer: &'a mut Dealer,
    rule: Rule,
    phase: RoundPhase,
    hole_counted: bool,
    dealer_blackjack: bool,
}

/// Final outcome of a single hand, kept for reporting.
#[derive(Debug, Clone)]
pub struct HandResult {
    pub player: String,
    pub hand_index: usize,
    pub status: HandStatus,
    pub total: u8,
    pub bet: u32,
    pub net: i64,
}

impl std::fmt::Display for HandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} hand {}: {} ({}) bet {} net {:+}",
            self.player, self.hand_index, self.status, self.total, self.bet, self.net
        )
    }
}

/// Money movement for a settled round. Player nets are indexed like the
/// round's player slice; the dealer's net is the exact negation of their sum.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    pub hands: Vec<HandResult>,
    pub player_nets: Vec<i64>,
    pub dealer_net: i64,
}

impl RoundSummary {
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.hands.iter().map(|h| h.to_string()).collect();
        lines.push(format!("dealer net {:+}", self.dealer_net));
        lines
    }
}

impl<'a> Round<'a> {
    pub fn new(
        shoe: &'a mut Shoe,
        counter: &'a mut Counter,
        players: &'a mut [Player],
        dealer: &'a mut Dealer,
        rule: Rule,
    ) -> Round<'a> {
        dealer.reset();
        Round {
            shoe,
            counter,
            players,
            dealer,
            rule,
            phase: RoundPhase::Dealing,
            hole_counted: false,
            dealer_blackjack: false,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Run the whole round and settle it. Player turns and the dealer turn
    /// are skipped when the insurance peek already ended the round.
    pub fn play(&mut self) -> Result<RoundSummary, EngineError> {
        self.deal_initial_cards()?;
        self.insurance_check()?;
        if self.phase == RoundPhase::PlayerTurns {
            self.player_turns()?;
            self.dealer_turn()?;
        }
        self.settle()
    }

    /// Two cards to every player and the dealer, in table order: one card to
    /// each player, the dealer's hole card face down, a second card to each
    /// player, then the dealer's upcard. The hole card stays out of the
    /// count until it is turned over.
    #[allowed_phase(Dealing)]
    pub fn deal_initial_cards(&mut self) -> Result<(), EngineError> {
        for player in self.players.iter_mut() {
            let card = self.shoe.deal()?;
            self.counter.observe(card);
            player.hands[0].add_card(card);
        }
        let hole = self.shoe.deal()?;
        self.dealer.hand.add_card(hole);
        for player in self.players.iter_mut() {
            let card = self.shoe.deal()?;
            self.counter.observe(card);
            player.hands[0].add_card(card);
        }
        let upcard = self.shoe.deal()?;
        self.counter.observe(upcard);
        self.dealer.hand.add_card(upcard);
        self.phase = RoundPhase::InsuranceCheck;
        Ok(())
    }

    /// With an ace up, offer insurance, then peek at the hole card. A dealer
    /// natural ends the round immediately; bets settle against it.
    #[allowed_phase(InsuranceCheck)]
    pub fn insurance_check(&mut self) -> Result<(), EngineError> {
        let upcard = self.dealer.hand.cards()[1];
        if upcard.rank != crate::card::Rank::Ace {
            self.phase = RoundPhase::PlayerTurns;
            return Ok(());
        }

        let tc = true_count(self.counter.running_high_low(), self.shoe.decks_remaining());
        for player in self.players.iter_mut() {
            if player.takes_insurance(tc, self.rule.insurance_threshold) {
                let stake = player.hands[0].bet() / 2;
                player.hands[0].put_insurance_bet(stake);
                debug!(player = %player.name(), stake, tc, "insurance taken");
            }
        }

        let hole = self.dealer.hand.cards()[0];
        if hole.rank.is_ten_valued() {
            self.dealer_blackjack = true;
            self.reveal_hole_card();
            debug!("dealer natural on peek");
            self.phase = RoundPhase::Settlement;
        } else {
            self.phase = RoundPhase::PlayerTurns;
        }
        Ok(())
    }

    /// Each player works through their hands front to back. Splitting deals
    /// one fresh card to each half immediately, pushes the sibling onto the
    /// back of the queue, and keeps playing the original hand.
    #[allowed_phase(PlayerTurns)]
    pub fn player_turns(&mut self) -> Result<(), EngineError> {
        let upcard_value = self.dealer.hand.cards()[1].rank.base_value();
        let resplit_limit = self.rule.resplit_limit;

        for player in self.players.iter_mut() {
            let mut queue: VecDeque<usize> = VecDeque::new();
            queue.push_back(0);
            while let Some(index) = queue.pop_front() {
                loop {
                    let ctx = TurnContext {
                        upcard_value,
                        true_count: mode_true_count(
                            player.counting_mode(),
                            self.counter,
                            self.shoe.decks_remaining(),
                        ),
                        split_depth: player.hands.len() as u8,
                        resplit_limit,
                    };
                    match player.decide(index, ctx) {
                        Action::Stand | Action::Bust | Action::Blackjack => break,
                        Action::Hit => {
                            let card = self.shoe.deal()?;
                            self.counter.observe(card);
                            player.hands[index].add_card(card);
                            if player.hands[index].is_busted() {
                                break;
                            }
                        }
                        Action::Double => {
                            player.hands[index].double_down();
                            let card = self.shoe.deal()?;
                            self.counter.observe(card);
                            player.hands[index].add_card(card);
                            player.hands[index].is_busted();
                            break;
                        }
                        Action::Split => {
                            let sibling = player.hands[index].split()?;
                            player.hands.push(sibling);
                            let sibling_index = player.hands.len() - 1;
                            queue.push_back(sibling_index);
                            let card = self.shoe.deal()?;
                            self.counter.observe(card);
                            player.hands[index].add_card(card);
                            let card = self.shoe.deal()?;
                            self.counter.observe(card);
                            player.hands[sibling_index].add_card(card);
                        }
                    }
                }
            }
        }
        self.phase = RoundPhase::DealerTurn;
        Ok(())
    }

    /// Turn over the hole card, then draw to the house total.
    #[allowed_phase(DealerTurn)]
    pub fn dealer_turn(&mut self) -> Result<(), EngineError> {
        self.reveal_hole_card();
        self.dealer.play_turn(self.shoe, self.counter)?;
        debug!(total = self.dealer.hand.value(), "dealer turn complete");
        if self.dealer.hand.cards().len() == 2 && self.dealer.hand.value() == 21 {
            self.dealer_blackjack = true;
        }
        self.phase = RoundPhase::Settlement;
        Ok(())
    }

    /// Resolve every hand against the dealer and move the money. Statuses
    /// refine here: a natural becomes a blackjack win or a push, an open
    /// hand becomes won, lost or pushed.
    #[allowed_phase(Settlement)]
    pub fn settle(&mut self) -> Result<RoundSummary, EngineError> {
        let dealer_natural = self.dealer_blackjack;
        let (dealer_total, _) = self.dealer.hand.evaluate();
        let dealer_bust = dealer_total > 21;

        let mut hands = Vec::new();
        let mut player_nets = Vec::with_capacity(self.players.len());
        let mut dealer_net: i64 = 0;

        for player in self.players.iter_mut() {
            let name = player.name().to_string();
            let mut player_net: i64 = 0;
            for (hand_index, hand) in player.hands.iter_mut().enumerate() {
                let bet = i64::from(hand.bet());
                let mut net: i64 = 0;

                let stake = i64::from(hand.insurance_bet());
                if stake > 0 {
                    net += if dealer_natural { 2 * stake } else { -stake };
                }

                let (total, _) = hand.evaluate();
                // The peek short-circuit skips player turns, so an untouched
                // natural may still read as open here.
                hand.is_blackjack();
                match hand.status() {
                    HandStatus::Bust => net -= bet,
                    HandStatus::Blackjack if !hand.was_split() => {
                        if dealer_natural {
                            hand.transition(HandStatus::Push)?;
                        } else {
                            hand.transition(HandStatus::BlackjackWin)?;
                            net += (hand.bet() as f64 * self.rule.payout_blackjack).round() as i64;
                        }
                    }
                    HandStatus::Blackjack => {
                        // A two-card 21 made after a split only wins even
                        // money, and pushes against a dealer natural or 21.
                        if dealer_natural || (!dealer_bust && dealer_total == 21) {
                            hand.transition(HandStatus::Push)?;
                        } else {
                            hand.transition(HandStatus::Won)?;
                            net += bet;
                        }
                    }
                    HandStatus::Active => {
                        if dealer_natural {
                            hand.transition(HandStatus::Lost)?;
                            net -= bet;
                        } else if dealer_bust || total > dealer_total {
                            hand.transition(HandStatus::Won)?;
                            net += bet;
                        } else if total < dealer_total {
                            hand.transition(HandStatus::Lost)?;
                            net -= bet;
                        } else {
                            hand.transition(HandStatus::Push)?;
                        }
                    }
                    status => return Err(EngineError::UnrecognizedStatus { status }),
                }

                hands.push(HandResult {
                    player: name.clone(),
                    hand_index,
                    status: hand.status(),
                    total,
                    bet: hand.bet(),
                    net,
                });
                player_net += net;
            }
            player.apply_net(player_net);
            player_nets.push(player_net);
            dealer_net -= player_net;
        }

        self.phase = RoundPhase::Done;
        debug!(dealer_total, dealer_net, "round settled");
        Ok(RoundSummary {
            hands,
            player_nets,
            dealer_net,
        })
    }

    fn reveal_hole_card(&mut self) {
        if !self.hole_counted {
            self.counter.observe(self.dealer.hand.cards()[0]);
            self.hole_counted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, Rank, Suit};
    use crate::counter::CountingMode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rule() -> Rule {
        Rule {
            num_decks: 6,
            dealer_hit_on_soft_17: false,
            payout_blackjack: 1.5,
            min_bet: 10,
            denomination: 10,
            resplit_limit: 4,
            insurance_threshold: crate::INSURANCE_TRUE_COUNT,
        }
    }

    fn rigged_shoe(firsts: &[Rank]) -> Shoe {
        let mut rng = StdRng::seed_from_u64(7);
        let mut shoe = Shoe::new(6, &mut rng);
        shoe.shuffle_with_firsts(firsts);
        shoe
    }

    fn play_one(
        firsts: &[Rank],
        counter: &mut Counter,
        players: &mut [Player],
    ) -> RoundSummary {
        let mut shoe = rigged_shoe(firsts);
        let mut dealer = Dealer::new(rule().dealer_hit_on_soft_17);
        for player in players.iter_mut() {
            player.place_initial_bet(10);
        }
        let mut round = Round::new(&mut shoe, counter, players, &mut dealer, rule());
        round.play().unwrap()
    }

    #[test]
    fn natural_pays_three_to_two() {
        let mut counter = Counter::new();
        let mut players = [Player::new("p", CountingMode::NoCount, 1_000)];
        let summary = play_one(
            &[Rank::Ace, Rank::Nine, Rank::Ten, Rank::Ace],
            &mut counter,
            &mut players,
        );
        assert_eq!(players[0].hands[0].status(), HandStatus::BlackjackWin);
        assert_eq!(summary.player_nets, vec![15]);
        assert_eq!(summary.dealer_net, -15);
        assert_eq!(players[0].bankroll(), 1_015);
    }

    #[test]
    fn player_bust_loses_even_when_dealer_busts() {
        let mut counter = Counter::new();
        let mut players = [Player::new("p", CountingMode::NoCount, 1_000)];
        let summary = play_one(
            &[Rank::Ten, Rank::Ten, Rank::Two, Rank::Two, Rank::Ten, Rank::Ten],
            &mut counter,
            &mut players,
        );
        assert_eq!(players[0].hands[0].status(), HandStatus::Bust);
        assert_eq!(summary.player_nets, vec![-10]);
        assert_eq!(summary.dealer_net, 10);
    }

    #[test]
    fn resplits_stop_at_the_hand_cap() {
        let mut counter = Counter::new();
        let mut players = [Player::new("p", CountingMode::NoCount, 1_000)];
        let firsts = [
            Rank::Eight,
            Rank::Ten,
            Rank::Eight,
            Rank::Six,
            Rank::Eight,
            Rank::Eight,
            Rank::Eight,
            Rank::Eight,
            Rank::Eight,
            Rank::Eight,
            Rank::Ten,
        ];
        let summary = play_one(&firsts, &mut counter, &mut players);
        assert_eq!(players[0].hands.len(), 4);
        for hand in &players[0].hands {
            assert_eq!(hand.cards().len(), 2);
            assert_eq!(hand.value(), 16);
        }
        // Dealer draws to 16 and busts; all four hands win their bet.
        assert_eq!(summary.player_nets, vec![40]);
        assert_eq!(summary.dealer_net, -40);
        // Every hand record carries its owner's name and position.
        assert_eq!(summary.hands.len(), 4);
        for (i, result) in summary.hands.iter().enumerate() {
            assert_eq!(result.player, "p");
            assert_eq!(result.hand_index, i);
            assert_eq!(result.net, 10);
        }
    }

    #[test]
    fn hot_count_insurance_cancels_a_natural() {
        let mut counter = Counter::new();
        // A shoe that has shed a deck's worth of low cards runs hot.
        for _ in 0..26 {
            counter.observe(Card {
                rank: Rank::Six,
                suit: Suit::Clubs,
            });
        }
        let mut players = [Player::new("p", CountingMode::HighLow, 1_000)];
        let summary = play_one(
            &[Rank::Ten, Rank::Ten, Rank::Nine, Rank::Ace],
            &mut counter,
            &mut players,
        );
        assert_eq!(players[0].hands[0].insurance_bet(), 5);
        assert_eq!(players[0].hands[0].status(), HandStatus::Lost);
        // Insurance pays 2:1, exactly covering the lost main bet.
        assert_eq!(summary.player_nets, vec![0]);
        assert_eq!(summary.dealer_net, 0);
    }

    #[test]
    fn cold_count_declines_insurance() {
        let mut counter = Counter::new();
        let mut players = [Player::new("p", CountingMode::HighLow, 1_000)];
        let summary = play_one(
            &[Rank::Ten, Rank::Ten, Rank::Nine, Rank::Ace],
            &mut counter,
            &mut players,
        );
        assert_eq!(players[0].hands[0].insurance_bet(), 0);
        assert_eq!(summary.player_nets, vec![-10]);
    }

    #[test]
    fn natural_pushes_against_a_dealer_natural() {
        let mut counter = Counter::new();
        let mut players = [Player::new("p", CountingMode::NoCount, 1_000)];
        let summary = play_one(
            &[Rank::Ace, Rank::King, Rank::Ten, Rank::Ace],
            &mut counter,
            &mut players,
        );
        assert_eq!(players[0].hands[0].status(), HandStatus::Push);
        assert_eq!(summary.player_nets, vec![0]);
    }

    #[test]
    fn phase_guard_rejects_out_of_order_calls() {
        let mut shoe = rigged_shoe(&[]);
        let mut counter = Counter::new();
        let mut dealer = Dealer::new(false);
        let mut players = [Player::new("p", CountingMode::NoCount, 1_000)];
        players[0].place_initial_bet(10);
        let mut round = Round::new(&mut shoe, &mut counter, &mut players, &mut dealer, rule());
        let err = round.settle().unwrap_err();
        assert_eq!(
            err,
            EngineError::WrongPhase {
                call: "settle",
                expected: "Settlement",
            }
        );
        assert!(round.player_turns().is_err());
        assert!(round.deal_initial_cards().is_ok());
    }

    #[test]
    fn money_stays_balanced_over_many_rounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut shoe = Shoe::new(6, &mut rng);
        let mut counter = Counter::new();
        let mut dealer = Dealer::new(false);
        let mut players = [
            Player::new("hi-lo", CountingMode::HighLow, 10_000),
            Player::new("ace-five", CountingMode::AceFive, 10_000),
            Player::new("flat", CountingMode::NoCount, 10_000),
        ];
        for _ in 0..50 {
            if shoe.reshuffle_needed() {
                shoe = Shoe::new(6, &mut rng);
                counter.reset();
            }
            for player in players.iter_mut() {
                player.place_initial_bet(10);
            }
            let mut round =
                Round::new(&mut shoe, &mut counter, &mut players, &mut dealer, rule());
            let summary = round.play().unwrap();
            let player_sum: i64 = summary.player_nets.iter().sum();
            assert_eq!(player_sum, -summary.dealer_net);
        }
    }
}
