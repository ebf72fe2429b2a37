//! TANKWAR Tournament - plugin discovery, scheduling and parallel execution
//!
//! This crate turns loadable strategy and engine modules into tournaments:
//! - Process-wide registries filled through the begin/fill/validate protocol
//! - A libloading-based module loader with version checking
//! - A condvar worker pool with idle tracking
//! - The comparative and competition orchestrators with result files

pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod pool;
pub mod registry;
pub mod schedule;
pub mod tournament;

// Re-exports for convenient access
pub use config::{ComparativeConfig, CompetitionConfig};
pub use error::TournamentError;
pub use loader::{load_engine_module, load_strategy_module, scan_modules, LoadedModule};
pub use pool::WorkerPool;
pub use registry::{EngineHandle, RegistrationError, StrategyHandle};
pub use schedule::round_robin_pairs;
pub use tournament::{
    compute_scores, group_results, ComparativeReport, CompetitionReport, MatchRecord, ResultGroup,
    StrategyScore, Tournament,
};
