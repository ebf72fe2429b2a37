//! Tournament orchestration
//!
//! Two modes share one machinery. Comparative: one map, two strategies,
//! every discovered engine, results grouped by identical verdicts.
//! Competition: one engine, many strategies, many maps, scored 3/1/0 and
//! ranked. Matches become jobs; jobs run inline or on the worker pool; a
//! failing match is logged and skipped while the rest of the run continues.
//!
//! Lifetime rule: every object a plugin factory produces lives inside a job,
//! and jobs all finish before `wait_idle` returns. The registries are
//! cleared before any `LoadedModule` drops, so no plugin code outlives its
//! library mapping.

use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use tankwar_core::{GameResult, MapData, MatchSetup};

use crate::config::{ComparativeConfig, CompetitionConfig};
use crate::error::TournamentError;
use crate::loader::{self, LoadedModule};
use crate::output;
use crate::pool::WorkerPool;
use crate::registry::{self, EngineHandle, StrategyHandle};
use crate::schedule::round_robin_pairs;

type Job = Box<dyn FnOnce() + Send + 'static>;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// One finished match
#[derive(Clone, Debug)]
pub struct MatchRecord {
    pub engine: String,
    pub strategy1: String,
    pub strategy2: String,
    pub map: String,
    pub result: GameResult,
}

/// Engines whose matches ended with the exact same verdict
#[derive(Clone, Debug, Serialize)]
pub struct ResultGroup {
    pub engines: Vec<String>,
    pub result: GameResult,
}

#[derive(Clone, Debug, Serialize)]
pub struct ComparativeReport {
    pub game_map: String,
    pub algorithm1: String,
    pub algorithm2: String,
    pub groups: Vec<ResultGroup>,
    pub output_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StrategyScore {
    pub name: String,
    pub score: u32,
    pub wins: u32,
    pub ties: u32,
    pub losses: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct CompetitionReport {
    pub game_maps_folder: String,
    pub game_manager: String,
    /// Descending by score
    pub scores: Vec<StrategyScore>,
    pub output_path: Option<PathBuf>,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct Tournament {
    num_threads: usize,
    verbose: bool,
    modules: Vec<LoadedModule>,
}

impl Tournament {
    /// Thread counts below 1 coerce to 1 (inline execution)
    pub fn new(num_threads: usize, verbose: bool) -> Self {
        Self {
            num_threads: num_threads.max(1),
            verbose,
            modules: Vec::new(),
        }
    }

    /// Comparative mode: load both strategies and every engine in the
    /// folder, run one match per engine, group identical outcomes, and
    /// write the report next to the engine modules.
    pub fn run_comparative(
        &mut self,
        config: &ComparativeConfig,
    ) -> Result<ComparativeReport, TournamentError> {
        self.reset();

        self.modules.push(loader::load_strategy_module(&config.strategy1)?);
        self.modules.push(loader::load_strategy_module(&config.strategy2)?);

        for path in loader::scan_modules(&config.engines_folder)? {
            match loader::load_engine_module(&path) {
                Ok(module) => self.modules.push(module),
                Err(err) => tracing::error!(%err, "skipping engine module"),
            }
        }

        let strategies = registry::strategies().handles();
        let [s1, s2] = &strategies[..] else {
            return Err(TournamentError::Invalid(
                "comparative mode needs exactly two strategy modules".to_string(),
            ));
        };
        let engines = registry::engines().handles();

        let map = Arc::new(tankwar_core::read_map(&config.game_map)?);
        let records = self.comparative_matches(&engines, s1, s2, map.clone());

        let mut report = ComparativeReport {
            game_map: config.game_map.display().to_string(),
            algorithm1: config.strategy1.display().to_string(),
            algorithm2: config.strategy2.display().to_string(),
            groups: group_results(records),
            output_path: None,
        };

        let path = config
            .engines_folder
            .join(format!("comparative_results_{}.txt", output::timestamp()));
        report.output_path = emit(&path, |out| {
            output::write_comparative(out, &report, map.board.zero_shell_steps())
        })?;
        Ok(report)
    }

    /// Competition mode: load the engine and every strategy in the folder,
    /// play the rotational round-robin over all maps, score 3/1/0, and
    /// write the ranking next to the strategy modules.
    pub fn run_competition(
        &mut self,
        config: &CompetitionConfig,
    ) -> Result<CompetitionReport, TournamentError> {
        self.reset();

        self.modules.push(loader::load_engine_module(&config.engine)?);

        for path in loader::scan_modules(&config.strategies_folder)? {
            match loader::load_strategy_module(&path) {
                Ok(module) => self.modules.push(module),
                Err(err) => tracing::error!(%err, "skipping strategy module"),
            }
        }

        let strategies = registry::strategies().handles();
        if strategies.len() < 2 {
            return Err(TournamentError::Invalid(
                "competition mode needs at least two loadable strategy modules".to_string(),
            ));
        }
        let engine = registry::engines()
            .handles()
            .into_iter()
            .next()
            .ok_or_else(|| TournamentError::Invalid("engine module registered nothing".to_string()))?;

        let mut maps = Vec::new();
        for path in scan_map_files(&config.game_maps_folder)? {
            match tankwar_core::read_map(&path) {
                Ok(map) => maps.push(Arc::new(map)),
                Err(err) => tracing::error!(%err, path = %path.display(), "skipping unreadable map"),
            }
        }
        if maps.is_empty() {
            return Err(TournamentError::Invalid(
                "no readable maps in the maps folder".to_string(),
            ));
        }

        let records = self.competition_matches(&engine, &strategies, &maps);
        // No results at all leaves the ranking out of the report; the writer
        // then emits the "No games were run" body.
        let scores = if records.is_empty() {
            Vec::new()
        } else {
            compute_scores(&strategies, &records)
        };

        let mut report = CompetitionReport {
            game_maps_folder: config.game_maps_folder.display().to_string(),
            game_manager: config.engine.display().to_string(),
            scores,
            output_path: None,
        };

        let path = config
            .strategies_folder
            .join(format!("competition_{}.txt", output::timestamp()));
        report.output_path = emit(&path, |out| output::write_competition(out, &report))?;
        Ok(report)
    }

    /// One match per engine: `(strategy1, strategy2)` on a single map
    pub fn comparative_matches(
        &self,
        engines: &[EngineHandle],
        strategy1: &StrategyHandle,
        strategy2: &StrategyHandle,
        map: Arc<MapData>,
    ) -> Vec<MatchRecord> {
        let records = Arc::new(Mutex::new(Vec::new()));
        let jobs = engines
            .iter()
            .map(|engine| {
                match_job(
                    engine.clone(),
                    strategy1.clone(),
                    strategy2.clone(),
                    map.clone(),
                    self.verbose,
                    records.clone(),
                )
            })
            .collect();
        self.execute(jobs);
        take_records(records)
    }

    /// Rotational round-robin of all strategy pairs across all maps
    pub fn competition_matches(
        &self,
        engine: &EngineHandle,
        strategies: &[StrategyHandle],
        maps: &[Arc<MapData>],
    ) -> Vec<MatchRecord> {
        let records = Arc::new(Mutex::new(Vec::new()));
        let mut jobs: Vec<Job> = Vec::new();
        for (map_index, map) in maps.iter().enumerate() {
            for (i, j) in round_robin_pairs(strategies.len(), map_index) {
                jobs.push(match_job(
                    engine.clone(),
                    strategies[i].clone(),
                    strategies[j].clone(),
                    map.clone(),
                    self.verbose,
                    records.clone(),
                ));
            }
        }
        self.execute(jobs);
        take_records(records)
    }

    /// Run jobs on the pool when it pays off, inline otherwise
    fn execute(&self, jobs: Vec<Job>) {
        let job_count = jobs.len();
        if self.num_threads >= 2 && job_count > 1 {
            let workers = self.num_threads.min(job_count);
            tracing::info!(workers, jobs = job_count, "dispatching matches to worker pool");
            let mut pool = WorkerPool::new(workers);
            for job in jobs {
                pool.submit(job);
            }
            pool.wait_idle();
            pool.shutdown();
        } else {
            for job in jobs {
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    tracing::error!("match job panicked; continuing with remaining jobs");
                }
            }
        }
    }

    /// Drop all state from a previous run, registries first
    fn reset(&mut self) {
        registry::clear_all();
        self.modules.clear();
    }
}

impl Drop for Tournament {
    fn drop(&mut self) {
        // Factories registered by loaded modules must die before the module
        // handles in `self.modules` unmap the code they point into. A
        // tournament that never loaded modules leaves the registries alone.
        if !self.modules.is_empty() {
            registry::clear_all();
        }
    }
}

// ============================================================================
// MATCH EXECUTION
// ============================================================================

/// Build the job for one match
fn match_job(
    engine: EngineHandle,
    strategy1: StrategyHandle,
    strategy2: StrategyHandle,
    map: Arc<MapData>,
    verbose: bool,
    records: Arc<Mutex<Vec<MatchRecord>>>,
) -> Job {
    Box::new(move || {
        match play_match(&engine, &strategy1, &strategy2, &map, verbose) {
            Ok(result) => {
                tracing::info!(
                    engine = %engine.name,
                    strategy1 = %strategy1.name,
                    strategy2 = %strategy2.name,
                    map = %map.board.name(),
                    winner = result.winner,
                    rounds = result.rounds,
                    "match finished"
                );
                let record = MatchRecord {
                    engine: engine.name.clone(),
                    strategy1: strategy1.name.clone(),
                    strategy2: strategy2.name.clone(),
                    map: map.board.name().to_string(),
                    result,
                };
                records
                    .lock()
                    .unwrap_or_else(|poison| poison.into_inner())
                    .push(record);
            }
            Err(err) => tracing::error!(%err, "match aborted; no result recorded"),
        }
    })
}

/// Instantiate engine and players and run one match to its verdict
fn play_match(
    engine: &EngineHandle,
    strategy1: &StrategyHandle,
    strategy2: &StrategyHandle,
    map: &MapData,
    verbose: bool,
) -> Result<GameResult, TournamentError> {
    let board = &map.board;
    let mut instance = (engine.factory)(verbose);
    let mut player1 = (strategy1.player_factory)(
        1,
        board.width(),
        board.height(),
        board.max_steps(),
        board.num_shells(),
    );
    let mut player2 = (strategy2.player_factory)(
        2,
        board.width(),
        board.height(),
        board.max_steps(),
        board.num_shells(),
    );
    let view = map.view();

    instance
        .run(MatchSetup {
            width: board.width(),
            height: board.height(),
            map_view: &view,
            map_name: board.name(),
            max_steps: board.max_steps(),
            num_shells: board.num_shells(),
            zero_shell_steps: board.zero_shell_steps(),
            player1: player1.as_mut(),
            name1: &strategy1.name,
            player2: player2.as_mut(),
            name2: &strategy2.name,
            tank_factory1: &strategy1.tank_factory,
            tank_factory2: &strategy2.tank_factory,
        })
        .map_err(|err| {
            TournamentError::runtime(
                format!(
                    "{} ({} vs {}) on {}",
                    engine.name, strategy1.name, strategy2.name, board.name()
                ),
                err.to_string(),
            )
        })
}

fn take_records(records: Arc<Mutex<Vec<MatchRecord>>>) -> Vec<MatchRecord> {
    let mut guard = records.lock().unwrap_or_else(|poison| poison.into_inner());
    std::mem::take(&mut *guard)
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Group records by identical `(winner, reason, rounds, final board)`.
/// Completion order does not matter: groups sort by verdict, engine lists
/// by name.
pub fn group_results(records: Vec<MatchRecord>) -> Vec<ResultGroup> {
    let mut grouped: BTreeMap<GameResult, Vec<String>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.result).or_default().push(record.engine);
    }
    grouped
        .into_iter()
        .map(|(result, mut engines)| {
            engines.sort();
            ResultGroup { engines, result }
        })
        .collect()
}

/// Score records 3/1/0 per strategy; ranking is descending by score with
/// names breaking ties.
pub fn compute_scores(strategies: &[StrategyHandle], records: &[MatchRecord]) -> Vec<StrategyScore> {
    let mut scores: Vec<StrategyScore> = strategies
        .iter()
        .map(|s| StrategyScore {
            name: s.name.clone(),
            score: 0,
            wins: 0,
            ties: 0,
            losses: 0,
        })
        .collect();
    let index: HashMap<&str, usize> = strategies
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();

    for record in records {
        let Some(&a) = index.get(record.strategy1.as_str()) else { continue };
        let Some(&b) = index.get(record.strategy2.as_str()) else { continue };
        match record.result.winner {
            1 => {
                scores[a].score += 3;
                scores[a].wins += 1;
                scores[b].losses += 1;
            }
            2 => {
                scores[b].score += 3;
                scores[b].wins += 1;
                scores[a].losses += 1;
            }
            _ => {
                scores[a].score += 1;
                scores[a].ties += 1;
                scores[b].score += 1;
                scores[b].ties += 1;
            }
        }
    }

    scores.sort_by(|x, y| y.score.cmp(&x.score).then_with(|| x.name.cmp(&y.name)));
    scores
}

// ============================================================================
// FILE EMISSION
// ============================================================================

/// All regular files in a maps folder, sorted so map indices are stable
fn scan_map_files(dir: &Path) -> Result<Vec<PathBuf>, TournamentError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Write a report file; fall back to stdout when the file cannot be created
fn emit(
    path: &Path,
    write: impl Fn(&mut dyn std::io::Write) -> std::io::Result<()>,
) -> Result<Option<PathBuf>, TournamentError> {
    match std::fs::File::create(path) {
        Ok(mut file) => {
            write(&mut file)?;
            tracing::info!(path = %path.display(), "results written");
            Ok(Some(path.to_path_buf()))
        }
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "cannot create output file; writing to stdout");
            let mut stdout = std::io::stdout();
            write(&mut stdout)?;
            Ok(None)
        }
    }
}
