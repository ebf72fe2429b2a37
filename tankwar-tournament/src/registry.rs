//! Process-wide strategy and engine registries
//!
//! Loading a module follows a three-step protocol: `begin_registration`
//! appends a placeholder entry carrying only the module's base name, the
//! module's registration callback fills factories into that *last* entry,
//! and `validate_last` either accepts it or pops it. Loads are sequential,
//! so "last entry" is unambiguous and modules never need to know their own
//! names.
//!
//! Both registries live behind process-wide mutexes; they are written only
//! during (single-threaded) module loading and cleared between runs.

use std::sync::{Mutex, MutexGuard, OnceLock};

use thiserror::Error;

use tankwar_core::{EngineFactory, PlayerFactory, TankFactory};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("no registration in progress")]
    NoOpenEntry,
    #[error("module {name} registered a second {kind} factory")]
    DuplicateFactory { name: String, kind: &'static str },
    #[error("module {name} registered player factory: {has_player}, tank factory: {has_tank}")]
    IncompleteStrategy {
        name: String,
        has_player: bool,
        has_tank: bool,
    },
    #[error("module {name} did not register an engine factory")]
    MissingEngineFactory { name: String },
}

// ============================================================================
// STRATEGY REGISTRY
// ============================================================================

/// One strategy module's factories; complete once both are present
pub struct StrategyEntry {
    name: String,
    player_factory: Option<PlayerFactory>,
    tank_factory: Option<TankFactory>,
}

impl StrategyEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            player_factory: None,
            tank_factory: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Cloneable handle onto a validated strategy entry, safe to ship to worker
/// threads (the factories are shared `Arc`s).
#[derive(Clone)]
pub struct StrategyHandle {
    pub name: String,
    pub player_factory: PlayerFactory,
    pub tank_factory: TankFactory,
}

#[derive(Default)]
pub struct StrategyRegistry {
    entries: Vec<StrategyEntry>,
}

impl StrategyRegistry {
    /// Append a placeholder entry for the module about to load
    pub fn begin_registration(&mut self, base_name: &str) {
        self.entries.push(StrategyEntry::new(base_name));
    }

    /// Fill the player factory of the entry opened last
    pub fn add_player_factory(&mut self, factory: PlayerFactory) -> Result<(), RegistrationError> {
        let entry = self.entries.last_mut().ok_or(RegistrationError::NoOpenEntry)?;
        if entry.player_factory.is_some() {
            return Err(RegistrationError::DuplicateFactory {
                name: entry.name.clone(),
                kind: "player",
            });
        }
        entry.player_factory = Some(factory);
        Ok(())
    }

    /// Fill the tank factory of the entry opened last
    pub fn add_tank_factory(&mut self, factory: TankFactory) -> Result<(), RegistrationError> {
        let entry = self.entries.last_mut().ok_or(RegistrationError::NoOpenEntry)?;
        if entry.tank_factory.is_some() {
            return Err(RegistrationError::DuplicateFactory {
                name: entry.name.clone(),
                kind: "tank",
            });
        }
        entry.tank_factory = Some(factory);
        Ok(())
    }

    /// Accept the last entry, or pop it and report what was missing
    pub fn validate_last(&mut self) -> Result<(), RegistrationError> {
        let Some(entry) = self.entries.last() else {
            return Err(RegistrationError::NoOpenEntry);
        };
        if entry.player_factory.is_some() && entry.tank_factory.is_some() {
            return Ok(());
        }
        let err = RegistrationError::IncompleteStrategy {
            name: entry.name.clone(),
            has_player: entry.player_factory.is_some(),
            has_tank: entry.tank_factory.is_some(),
        };
        self.entries.pop();
        Err(err)
    }

    pub fn remove_last(&mut self) {
        self.entries.pop();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles onto all validated entries, in registration order
    pub fn handles(&self) -> Vec<StrategyHandle> {
        self.entries
            .iter()
            .filter_map(|e| {
                Some(StrategyHandle {
                    name: e.name.clone(),
                    player_factory: e.player_factory.clone()?,
                    tank_factory: e.tank_factory.clone()?,
                })
            })
            .collect()
    }
}

// ============================================================================
// ENGINE REGISTRY
// ============================================================================

pub struct EngineEntry {
    name: String,
    factory: Option<EngineFactory>,
}

impl EngineEntry {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Cloneable handle onto a validated engine entry
#[derive(Clone)]
pub struct EngineHandle {
    pub name: String,
    pub factory: EngineFactory,
}

#[derive(Default)]
pub struct EngineRegistry {
    entries: Vec<EngineEntry>,
}

impl EngineRegistry {
    pub fn begin_registration(&mut self, base_name: &str) {
        self.entries.push(EngineEntry {
            name: base_name.to_string(),
            factory: None,
        });
    }

    pub fn set_factory_on_last(&mut self, factory: EngineFactory) -> Result<(), RegistrationError> {
        let entry = self.entries.last_mut().ok_or(RegistrationError::NoOpenEntry)?;
        if entry.factory.is_some() {
            return Err(RegistrationError::DuplicateFactory {
                name: entry.name.clone(),
                kind: "engine",
            });
        }
        entry.factory = Some(factory);
        Ok(())
    }

    pub fn validate_last(&mut self) -> Result<(), RegistrationError> {
        let Some(entry) = self.entries.last() else {
            return Err(RegistrationError::NoOpenEntry);
        };
        if entry.factory.is_some() {
            return Ok(());
        }
        let err = RegistrationError::MissingEngineFactory {
            name: entry.name.clone(),
        };
        self.entries.pop();
        Err(err)
    }

    pub fn remove_last(&mut self) {
        self.entries.pop();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handles(&self) -> Vec<EngineHandle> {
        self.entries
            .iter()
            .filter_map(|e| {
                Some(EngineHandle {
                    name: e.name.clone(),
                    factory: e.factory.clone()?,
                })
            })
            .collect()
    }
}

// ============================================================================
// PROCESS-WIDE ACCESS
// ============================================================================

static STRATEGIES: OnceLock<Mutex<StrategyRegistry>> = OnceLock::new();
static ENGINES: OnceLock<Mutex<EngineRegistry>> = OnceLock::new();

/// The process-wide strategy registry
pub fn strategies() -> MutexGuard<'static, StrategyRegistry> {
    STRATEGIES
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

/// The process-wide engine registry
pub fn engines() -> MutexGuard<'static, EngineRegistry> {
    ENGINES
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

/// Empty both registries. Must run before the owning modules unload so no
/// factory outlives its module's code.
pub fn clear_all() {
    strategies().clear();
    engines().clear();
}

/// Register a complete in-process strategy (built-ins, tests)
pub fn register_strategy(name: &str, player_factory: PlayerFactory, tank_factory: TankFactory) {
    let mut registry = strategies();
    registry.begin_registration(name);
    let _ = registry.add_player_factory(player_factory);
    let _ = registry.add_tank_factory(tank_factory);
    // Complete by construction.
    let _ = registry.validate_last();
}

/// Register a complete in-process engine (built-ins, tests)
pub fn register_engine(name: &str, factory: EngineFactory) {
    let mut registry = engines();
    registry.begin_registration(name);
    let _ = registry.set_factory_on_last(factory);
    let _ = registry.validate_last();
}
