//! Competition command - one engine, many strategies, many maps

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use tankwar_tournament::{scan_modules, CompetitionConfig, Tournament};

#[derive(Args)]
pub struct CompetitionArgs {
    /// Folder of map files
    #[arg(long, value_name = "DIR")]
    pub game_maps_folder: PathBuf,

    /// Engine module running every match
    #[arg(long, value_name = "LIB")]
    pub engine: PathBuf,

    /// Folder of competing strategy modules
    #[arg(long, value_name = "DIR")]
    pub strategies_folder: PathBuf,

    /// Worker threads (values below 2 run matches inline)
    #[arg(long, default_value = "1")]
    pub num_threads: usize,

    /// Also print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the competition command
///
/// 1. Validate the paths and participant counts
/// 2. Run the tournament
/// 3. Print the final ranking
pub fn run(args: CompetitionArgs, verbose: bool) -> Result<()> {
    validate_paths(&args)?;

    let config = CompetitionConfig::new(&args.game_maps_folder, &args.engine, &args.strategies_folder);
    let mut tournament = Tournament::new(args.num_threads, verbose);
    let report = tournament
        .run_competition(&config)
        .context("competition run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    for score in &report.scores {
        println!("{} {}", score.name, score.score);
    }
    match &report.output_path {
        Some(path) => println!("Competition results written to {}", path.display()),
        None => tracing::warn!("results were written to stdout"),
    }
    Ok(())
}

fn validate_paths(args: &CompetitionArgs) -> Result<()> {
    if !args.game_maps_folder.is_dir() {
        bail!(
            "game maps folder does not exist or is not a directory: {}",
            args.game_maps_folder.display()
        );
    }
    if !args.engine.is_file() {
        bail!("engine module does not exist: {}", args.engine.display());
    }
    if !args.strategies_folder.is_dir() {
        bail!(
            "strategies folder does not exist or is not a directory: {}",
            args.strategies_folder.display()
        );
    }

    let strategies = scan_modules(&args.strategies_folder)
        .context("cannot scan strategies folder")?;
    if strategies.len() < 2 {
        bail!("strategies folder must contain at least 2 strategy modules");
    }
    let maps = std::fs::read_dir(&args.game_maps_folder)
        .context("cannot scan game maps folder")?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .count();
    if maps == 0 {
        bail!("game maps folder must contain at least 1 map file");
    }
    Ok(())
}
