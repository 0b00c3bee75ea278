mod cmd;
mod output;
mod scenario;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "shift",
    about = "Monthly shift planning: keep roster, schedule and assignment grid in sync",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: built-in defaults)
    #[arg(long, global = true, env = "SHIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the per-day requirements a scenario produces
    Plan {
        /// Scenario YAML file
        scenario: PathBuf,
    },

    /// Print the optimizer request payload for a scenario
    Request {
        /// Scenario YAML file
        scenario: PathBuf,
    },

    /// Send a scenario to the optimizer and show the resulting grid
    Optimize {
        /// Scenario YAML file
        scenario: PathBuf,
        /// Optimizer base URL (overrides optimizer.url)
        #[arg(long)]
        url: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Optimize { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Plan { scenario } => cmd::plan::run(config_path, &scenario, cli.json),
        Commands::Request { scenario } => cmd::request::run(config_path, &scenario),
        Commands::Optimize { scenario, url } => {
            cmd::optimize::run(config_path, &scenario, url.as_deref(), cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
