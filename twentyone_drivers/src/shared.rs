use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use twentyone::CountingMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rule: ConfigRule,
    pub session: ConfigSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRule {
    pub num_decks: u8,
    pub dealer_hit_on_soft_17: bool,
    pub payout_blackjack: f64,
    pub min_bet: u32,
    pub denomination: u32,
    pub resplit_limit: u8,
    #[serde(default = "default_insurance_threshold")]
    pub insurance_threshold: f64,
}

fn default_insurance_threshold() -> f64 {
    twentyone::INSURANCE_TRUE_COUNT
}

impl From<ConfigRule> for twentyone::Rule {
    fn from(config: ConfigRule) -> twentyone::Rule {
        twentyone::Rule {
            num_decks: config.num_decks,
            dealer_hit_on_soft_17: config.dealer_hit_on_soft_17,
            payout_blackjack: config.payout_blackjack,
            min_bet: config.min_bet,
            denomination: config.denomination,
            resplit_limit: config.resplit_limit,
            insurance_threshold: config.insurance_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSession {
    pub rounds: u64,
    pub sessions: usize,
    pub starting_bankroll: i64,
    pub seed: Option<u64>,
    /// When set, a flat-betting companion joins whenever the hi-lo true
    /// count reaches this value, and leaves at the next reshuffle.
    pub extra_hand_true_count: Option<f64>,
    pub players: Vec<ConfigPlayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPlayer {
    pub name: String,
    pub counting_mode: String,
}

impl ConfigPlayer {
    pub fn counting_mode(&self) -> anyhow::Result<CountingMode> {
        self.counting_mode
            .parse()
            .map_err(|e| anyhow::anyhow!("unknown counting mode {:?}: {}", self.counting_mode, e))
    }
}

/// Reads and parses a YAML config file.
pub fn parse_config_from_file(filename: &str) -> anyhow::Result<Config> {
    let file_content = fs::read_to_string(filename)
        .with_context(|| format!("cannot read config file {}", filename))?;
    let config: Config = serde_yaml::from_str(&file_content)
        .with_context(|| format!("cannot parse config file {}", filename))?;
    for player in &config.session.players {
        player.counting_mode()?;
    }
    Ok(config)
}
