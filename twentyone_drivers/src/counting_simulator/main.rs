mod session;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use twentyone_drivers::parse_config_from_file;

const DEFAULT_CONFIG_PATH: &str = "~/.twentyone.yml";

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    /// Overrides the seed from the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Overrides the rounds per session from the config file
    #[arg(short, long)]
    rounds: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = CommandLineArgs::parse();
    if args.config == DEFAULT_CONFIG_PATH {
        let home_dir = home::home_dir().context("cannot find home directory")?;
        let config_file_path = home_dir.join(".twentyone.yml");
        if !config_file_path.is_file() {
            anyhow::bail!(
                "no config file at {}; pass one with --config",
                config_file_path.display()
            );
        }
        args.config = config_file_path
            .to_str()
            .context("config path is not valid unicode")?
            .to_string();
    }
    let args = args;

    let mut config = parse_config_from_file(&args.config)?;
    if let Some(rounds) = args.rounds {
        config.session.rounds = rounds;
    }
    let base_seed = args
        .seed
        .or(config.session.seed)
        .unwrap_or_else(rand::random);
    info!(
        base_seed,
        sessions = config.session.sessions,
        rounds = config.session.rounds,
        "starting run"
    );

    let all = session::run_sessions(&config, base_seed)?;
    for stats in &all {
        println!("{}", stats);
    }

    let total_rounds: u64 = all.iter().map(|s| s.rounds).sum();
    let total_wagered: u64 = all.iter().map(|s| s.total_wagered).sum();
    let house: i64 = all.iter().map(|s| s.dealer_net).sum();
    if total_wagered > 0 {
        println!(
            "total: {} rounds, {} wagered, house {:+} ({:+.4} per unit wagered)",
            total_rounds,
            total_wagered,
            house,
            house as f64 / total_wagered as f64
        );
    } else {
        println!("total: {} rounds, nothing wagered", total_rounds);
    }
    Ok(())
}
