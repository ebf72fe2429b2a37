//! TANKWAR CLI - tank battle tournament simulator
//!
//! ## Commands
//!
//! - `comparative`: run two strategies under every engine in a folder on one
//!   map and group engines by identical verdicts
//! - `competition`: round-robin a folder of strategies under one engine
//!   across a folder of maps and rank them by score

mod comparative;
mod competition;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tankwar")]
#[command(version, about = "Tank battle tournament simulator")]
#[command(long_about = "Runs tournaments between dynamically loaded tank strategies and \
    battle engines. Strategy and engine modules register their factories when loaded; the \
    simulator schedules their matches onto a worker pool and writes grouped results or \
    score rankings.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (per-round engine logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every engine on one map with two fixed strategies
    Comparative(comparative::ComparativeArgs),

    /// Rank many strategies under one engine across many maps
    Competition(competition::CompetitionArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialize_logging(cli.verbose);

    dispatch_command(cli)
}

/// Initialize tracing based on verbosity
fn initialize_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("tankwar_core=debug,tankwar_tournament=debug,info")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Dispatch to the appropriate command handler
fn dispatch_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Comparative(args) => comparative::run(args, cli.verbose),
        Commands::Competition(args) => competition::run(args, cli.verbose),
    }
}
