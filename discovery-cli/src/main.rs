use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use discovery::{Config, UnknownTypePolicy};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "discovery")]
#[command(about = "Watson Discovery tools - decode and inspect saved query payloads")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.discovery/config.toml)
    #[arg(short, long, global = true, env = "DISCOVERY_CONFIG")]
    config: Option<PathBuf>,

    /// Reject aggregation types without a dedicated variant
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the aggregation tree of a payload
    Inspect {
        /// JSON file: a query response, one aggregation, or an array of them
        input: PathBuf,
    },

    /// Decode a payload and print it back as typed JSON
    Decode {
        /// JSON file: a query response, one aggregation, or an array of them
        input: PathBuf,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides();
    if cli.strict {
        config.decoding.unknown_types = UnknownTypePolicy::Strict;
    }

    init_logging(&config);

    let decoder = config.decoder();
    tracing::debug!(policy = %decoder.policy(), "decoder ready");

    match cli.command {
        Commands::Inspect { input } => commands::run_inspect(&input, &decoder)?,
        Commands::Decode { input, pretty } => commands::run_decode(&input, &decoder, pretty)?,
    }

    Ok(())
}

fn init_logging(config: &Config) {
    // RUST_LOG overrides config
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
