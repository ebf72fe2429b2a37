//! Configuration types for tournament runs

use std::path::PathBuf;

/// Comparative mode: one map, two strategies, every discovered engine
#[derive(Clone, Debug)]
pub struct ComparativeConfig {
    pub game_map: PathBuf,
    pub engines_folder: PathBuf,
    pub strategy1: PathBuf,
    pub strategy2: PathBuf,
}

impl ComparativeConfig {
    pub fn new(
        game_map: impl Into<PathBuf>,
        engines_folder: impl Into<PathBuf>,
        strategy1: impl Into<PathBuf>,
        strategy2: impl Into<PathBuf>,
    ) -> Self {
        Self {
            game_map: game_map.into(),
            engines_folder: engines_folder.into(),
            strategy1: strategy1.into(),
            strategy2: strategy2.into(),
        }
    }
}

/// Competition mode: one engine, many strategies, many maps
#[derive(Clone, Debug)]
pub struct CompetitionConfig {
    pub game_maps_folder: PathBuf,
    pub engine: PathBuf,
    pub strategies_folder: PathBuf,
}

impl CompetitionConfig {
    pub fn new(
        game_maps_folder: impl Into<PathBuf>,
        engine: impl Into<PathBuf>,
        strategies_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            game_maps_folder: game_maps_folder.into(),
            engine: engine.into(),
            strategies_folder: strategies_folder.into(),
        }
    }
}
