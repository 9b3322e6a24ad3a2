use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use enviroquest::cli::commands;
use enviroquest::config::games::GamesConfig;
use enviroquest::config::runtime::RuntimeConfig;

#[derive(Parser)]
#[command(name = "enviroquest")]
#[command(about = "A mini-game simulation engine with configurable scoring and decay rules")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the session server and tick loop
    Run,

    /// Run one session headlessly with an autoplay policy
    Simulate {
        /// Game to play (e.g. balloon-pop, plant-care)
        #[arg(short, long)]
        game: String,

        /// RNG seed for a reproducible run
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum ticks before giving up
        #[arg(short, long, default_value_t = 2000)]
        ticks: u64,

        /// Autoplay policy: greedy or idle
        #[arg(short, long, default_value = "greedy")]
        policy: String,
    },

    /// Show or clear the persisted play statistics
    Stats {
        /// Remove all saved profiles
        #[arg(long)]
        reset: bool,
    },

    /// List the game roster and parameter tables
    Games,
}

fn load_config(path: &str) -> Result<RuntimeConfig, String> {
    let config_path = Path::new(path);
    // The default config file is optional; a named one must exist
    if !config_path.exists() && path == "config.toml" {
        return Ok(RuntimeConfig::default());
    }
    RuntimeConfig::from_file(config_path)
}

fn load_games(config: &RuntimeConfig) -> Result<GamesConfig, String> {
    match &config.games_file {
        Some(path) => GamesConfig::from_file(Path::new(path)),
        None => Ok(GamesConfig::builtin()),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level);

    let games = match load_games(&config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error loading game tables: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Run => {
            if let Err(e) = commands::run_server(&config, &games).await {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Simulate {
            game,
            seed,
            ticks,
            policy,
        } => {
            if let Err(e) = commands::simulate(&config, &games, &game, seed, ticks, &policy) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Stats { reset } => {
            if let Err(e) = commands::stats(&config, reset) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Games => commands::games_list(&games),
    }
}
