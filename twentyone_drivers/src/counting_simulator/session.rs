use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use twentyone::{
    mode_true_count, sized_bet, Counter, CountingMode, Dealer, HandStatus, Player, Round, Rule,
    Shoe,
};
use twentyone_drivers::Config;

const COMPANION_NAME: &str = "companion";

/// What one session produced, aggregated over all of its rounds.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub seed: u64,
    pub rounds: u64,
    pub hands: u64,
    pub hand_wins: u64,
    pub hand_pushes: u64,
    pub hand_losses: u64,
    pub blackjacks: u64,
    pub reshuffles: u64,
    pub total_wagered: u64,
    pub companion_rounds: u64,
    pub companion_net: i64,
    /// Largest peak-to-trough drop of the configured players' combined
    /// bankroll over the session.
    pub max_drawdown: i64,
    pub final_bankrolls: Vec<(String, i64)>,
    pub dealer_net: i64,
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "session (seed {}): {} rounds, {} hands, {} reshuffles, {} wagered",
            self.seed, self.rounds, self.hands, self.reshuffles, self.total_wagered
        )?;
        writeln!(
            f,
            "  hands won {} / pushed {} / lost {}, {} blackjacks, max drawdown {}",
            self.hand_wins, self.hand_pushes, self.hand_losses, self.blackjacks, self.max_drawdown
        )?;
        for (name, bankroll) in &self.final_bankrolls {
            writeln!(f, "  {}: bankroll {}", name, bankroll)?;
        }
        write!(f, "  dealer net {:+}", self.dealer_net)
    }
}

/// Play one full session of rounds with its own deterministic rng.
pub fn run_session(config: &Config, seed: u64) -> anyhow::Result<SessionStats> {
    let rule: Rule = config.rule.clone().into();
    let session = &config.session;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut players: Vec<Player> = Vec::new();
    for p in &session.players {
        players.push(Player::new(&p.name, p.counting_mode()?, session.starting_bankroll));
    }
    let base_players = players.len();

    let mut shoe = Shoe::new(rule.num_decks, &mut rng);
    let mut counter = Counter::new();
    let mut dealer = Dealer::new(rule.dealer_hit_on_soft_17);

    let mut stats = SessionStats {
        seed,
        rounds: 0,
        hands: 0,
        hand_wins: 0,
        hand_pushes: 0,
        hand_losses: 0,
        blackjacks: 0,
        reshuffles: 0,
        total_wagered: 0,
        companion_rounds: 0,
        companion_net: 0,
        max_drawdown: 0,
        final_bankrolls: Vec::new(),
        dealer_net: 0,
    };
    let mut bankroll_peak = session.starting_bankroll * base_players as i64;

    for _ in 0..session.rounds {
        if shoe.reshuffle_needed() {
            shoe = Shoe::new(rule.num_decks, &mut rng);
            counter.reset();
            stats.reshuffles += 1;
            // The companion only plays out the shoe that drew them in.
            retire_companions(&mut players, base_players, session.starting_bankroll, &mut stats);
            debug!(reshuffles = stats.reshuffles, "new shoe");
        }

        let hot_count = mode_true_count(
            CountingMode::HighLow,
            &counter,
            shoe.decks_remaining(),
        );
        if let Some(threshold) = session.extra_hand_true_count {
            if players.len() == base_players && hot_count >= threshold {
                players.push(Player::companion(COMPANION_NAME, session.starting_bankroll));
                debug!(hot_count, "companion joins");
            }
        }
        if players.len() > base_players {
            stats.companion_rounds += 1;
        }

        for player in players.iter_mut() {
            let tc = mode_true_count(
                player.counting_mode(),
                &counter,
                shoe.decks_remaining(),
            );
            let bet = sized_bet(player.counting_mode(), tc, rule.min_bet, rule.denomination);
            stats.total_wagered += u64::from(bet);
            player.place_initial_bet(bet);
        }

        let mut round = Round::new(&mut shoe, &mut counter, &mut players, &mut dealer, rule);
        let summary = round.play().context("round failed")?;
        stats.rounds += 1;
        stats.hands += summary.hands.len() as u64;
        stats.dealer_net += summary.dealer_net;
        for hand in &summary.hands {
            match hand.status {
                HandStatus::Won | HandStatus::BlackjackWin => stats.hand_wins += 1,
                HandStatus::Push => stats.hand_pushes += 1,
                HandStatus::Lost | HandStatus::Bust => stats.hand_losses += 1,
                _ => {}
            }
            if hand.status == HandStatus::BlackjackWin {
                stats.blackjacks += 1;
            }
        }

        let seated: i64 = players[..base_players].iter().map(|p| p.bankroll()).sum();
        if seated > bankroll_peak {
            bankroll_peak = seated;
        } else if bankroll_peak - seated > stats.max_drawdown {
            stats.max_drawdown = bankroll_peak - seated;
        }
    }

    retire_companions(&mut players, base_players, session.starting_bankroll, &mut stats);
    stats.final_bankrolls = players
        .iter()
        .map(|p| (p.name().to_string(), p.bankroll()))
        .collect();
    info!(seed, rounds = stats.rounds, "session finished");
    Ok(stats)
}

fn retire_companions(
    players: &mut Vec<Player>,
    base_players: usize,
    starting_bankroll: i64,
    stats: &mut SessionStats,
) {
    for companion in players.drain(base_players..) {
        stats.companion_net += companion.bankroll() - starting_bankroll;
    }
}

/// Run the configured number of sessions, fanning out onto a thread per
/// session when more than one is asked for. Session seeds are derived from
/// the base seed so a whole run replays exactly.
pub fn run_sessions(config: &Config, base_seed: u64) -> anyhow::Result<Vec<SessionStats>> {
    let sessions = config.session.sessions.max(1);
    if sessions == 1 {
        return Ok(vec![run_session(config, base_seed)?]);
    }

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..sessions)
            .map(|i| {
                let seed = base_seed.wrapping_add(i as u64);
                scope.spawn(move || run_session(config, seed))
            })
            .collect();
        let mut all = Vec::with_capacity(sessions);
        for handle in handles {
            let stats = handle
                .join()
                .map_err(|_| anyhow::anyhow!("session thread panicked"))??;
            all.push(stats);
        }
        Ok(all)
    })
}
