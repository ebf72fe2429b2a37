//! Comparative command - every engine, one map, two strategies

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use tankwar_tournament::{ComparativeConfig, Tournament};

#[derive(Args)]
pub struct ComparativeArgs {
    /// Map file the match is played on
    #[arg(long, value_name = "FILE")]
    pub game_map: PathBuf,

    /// Folder of engine modules to compare
    #[arg(long, value_name = "DIR")]
    pub engines_folder: PathBuf,

    /// First strategy module
    #[arg(long, value_name = "LIB")]
    pub strategy1: PathBuf,

    /// Second strategy module
    #[arg(long, value_name = "LIB")]
    pub strategy2: PathBuf,

    /// Worker threads (values below 2 run matches inline)
    #[arg(long, default_value = "1")]
    pub num_threads: usize,

    /// Also print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the comparative command
///
/// 1. Validate the paths
/// 2. Run the tournament
/// 3. Report where the results went
pub fn run(args: ComparativeArgs, verbose: bool) -> Result<()> {
    validate_paths(&args)?;

    let config = ComparativeConfig::new(
        &args.game_map,
        &args.engines_folder,
        &args.strategy1,
        &args.strategy2,
    );
    let mut tournament = Tournament::new(args.num_threads, verbose);
    let report = tournament
        .run_comparative(&config)
        .context("comparative run failed")?;

    if report.groups.is_empty() {
        tracing::warn!("no games were run");
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    match &report.output_path {
        Some(path) => println!("Comparative results written to {}", path.display()),
        None => tracing::warn!("results were written to stdout"),
    }
    Ok(())
}

fn validate_paths(args: &ComparativeArgs) -> Result<()> {
    if !args.game_map.is_file() {
        bail!("game map does not exist: {}", args.game_map.display());
    }
    if !args.engines_folder.is_dir() {
        bail!(
            "engines folder does not exist or is not a directory: {}",
            args.engines_folder.display()
        );
    }
    for strategy in [&args.strategy1, &args.strategy2] {
        if !strategy.is_file() {
            bail!("strategy module does not exist: {}", strategy.display());
        }
    }
    Ok(())
}
