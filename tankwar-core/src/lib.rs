//! TANKWAR Core - battle engine, strategies and plugin ABI
//!
//! This crate provides everything a match needs:
//! - Toroidal board geometry and cell glyphs
//! - The deterministic battle engine (half-step shell movement, full
//!   collision rules, reverse gear, zero-shell countdown)
//! - The strategy/player contracts plus two built-in strategies
//! - Map file reading
//! - The ABI loadable strategy and engine modules compile against

pub mod board;
pub mod engine;
pub mod evasive;
pub mod map;
pub mod offensive;
pub mod pathfind;
pub mod plugin;
pub mod strategy;
pub mod tank;

// Re-exports for convenient access
pub use board::{Board, BoardView, Cell, Direction, Point, SatelliteView};
pub use engine::{BattleEngine, Engine, EngineError, EngineFactory, GameResult, MatchSetup, WinReason};
pub use evasive::EvasiveStrategy;
pub use map::{parse_map, read_map, MapData, MapError};
pub use offensive::OffensiveStrategy;
pub use strategy::{
    ActionRequest, BattleInfo, GamePlayer, Player, PlayerFactory, TankFactory, TankStrategy,
};
pub use tank::{ReverseState, Shell, Tank, SHOT_COOLDOWN};
