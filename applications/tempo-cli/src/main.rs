//! Tempo - queue and transport demo driver

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tempo_cli::{
    config::AppConfig,
    demo::{self, DemoOptions},
};
use tempo_playback::RepeatMode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Drive the Tempo playback engine against a simulated device", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a synthetic playlist and log every transport event
    Demo {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of tracks in the playlist
        #[arg(short, long, default_value_t = 5)]
        tracks: usize,
        /// Start with shuffle on
        #[arg(long)]
        shuffle: bool,
        /// Repeat mode (overrides the config file)
        #[arg(long, value_enum)]
        repeat: Option<RepeatArg>,
        /// Make every fourth track unplayable
        #[arg(long)]
        with_failures: bool,
        /// Stop after this many track changes
        #[arg(long)]
        max_tracks: Option<usize>,
        /// Give up after this many seconds
        #[arg(long, default_value_t = 120)]
        time_limit: u64,
    },
    /// Print the effective configuration
    ShowConfig {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatArg {
    Off,
    All,
    Single,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::All => RepeatMode::All,
            RepeatArg::Single => RepeatMode::Single,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            config,
            tracks,
            shuffle,
            repeat,
            with_failures,
            max_tracks,
            time_limit,
        } => {
            let config = load_config(config)?;
            init_tracing(&config);

            let options = DemoOptions {
                tracks,
                shuffle,
                repeat: repeat.map(RepeatMode::from),
                with_failures,
                max_tracks,
                time_limit: Duration::from_secs(time_limit),
            };
            let summary = demo::run(&config, &options).context("demo session failed")?;

            info!(
                played = summary.played.len(),
                failures = summary.failures,
                phase = ?summary.final_snapshot.phase,
                "done"
            );
        }
        Commands::ShowConfig { config } => {
            let config = load_config(config)?;
            print!("{}", config.to_toml().context("failed to render config")?);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    AppConfig::load(path.as_deref()).context("failed to load configuration")
}

fn init_tracing(config: &AppConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
