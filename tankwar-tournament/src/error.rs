//! Error kinds for tournament execution
//!
//! Three units can fail independently: loading a module, reading a map, and
//! running a single match. Only the failing unit is abandoned; the
//! orchestrator keeps processing the rest.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TournamentError {
    /// A module failed to load or registered itself incompletely; the module
    /// is unloaded and its jobs are skipped.
    #[error("failed to load module {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// A map file could not be parsed; its matches are never scheduled.
    #[error(transparent)]
    Map(#[from] tankwar_core::MapError),

    /// One match failed at runtime; it produces no result row.
    #[error("match {label} failed: {message}")]
    Runtime { label: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Mode preconditions not met (missing strategies, empty folders, ...).
    #[error("{0}")]
    Invalid(String),
}

impl TournamentError {
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn runtime(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Runtime {
            label: label.into(),
            message: message.into(),
        }
    }
}
