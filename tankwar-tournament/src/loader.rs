//! Dynamic module loading
//!
//! A module is loaded in lockstep with the registry protocol: the registry
//! opens a placeholder entry first, then the library is mapped, its
//! declaration symbol resolved and version-checked, and its registration
//! callback invoked against the placeholder. Validation failures pop the
//! placeholder and drop the library again.
//!
//! [`LoadedModule`] owns the library handle. Every object produced by a
//! module's factories must be dropped before its `LoadedModule`; otherwise a
//! drop could call into unmapped code.

use std::path::{Path, PathBuf};

use libloading::Library;

use tankwar_core::plugin::{
    EnginePluginDeclaration, EngineRegistrar, StrategyPluginDeclaration, StrategyRegistrar,
    CORE_VERSION, ENGINE_DECLARATION_SYMBOL, RUSTC_VERSION, STRATEGY_DECLARATION_SYMBOL,
};
use tankwar_core::{EngineFactory, PlayerFactory, TankFactory};

use crate::error::TournamentError;
use crate::registry;

/// A mapped plugin module. Dropping this unloads the library.
#[derive(Debug)]
pub struct LoadedModule {
    name: String,
    _library: Library,
}

impl LoadedModule {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Module base name: file stem without any `lib` prefix
pub fn module_base_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    stem.strip_prefix("lib").unwrap_or(&stem).to_string()
}

/// All dynamic libraries in a folder, sorted for a stable load order
pub fn scan_modules(dir: &Path) -> Result<Vec<PathBuf>, TournamentError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == std::env::consts::DLL_EXTENSION)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load a strategy module and register its factories
pub fn load_strategy_module(path: &Path) -> Result<LoadedModule, TournamentError> {
    let name = module_base_name(path);
    let mut reg = registry::strategies();
    reg.begin_registration(&name);

    let library = match map_library(path) {
        Ok(library) => library,
        Err(err) => {
            reg.remove_last();
            return Err(err);
        }
    };

    // Safety: the declaration static is produced by export_strategy_plugin!
    // in a module compiled against the same core crate and rustc, which the
    // version check below enforces before any factory is touched.
    let declaration = unsafe {
        match library.get::<*const StrategyPluginDeclaration>(STRATEGY_DECLARATION_SYMBOL) {
            Ok(symbol) => **symbol,
            Err(err) => {
                reg.remove_last();
                return Err(TournamentError::load(
                    path,
                    format!("no strategy declaration: {err}"),
                ));
            }
        }
    };

    if let Err(message) = check_versions(declaration.rustc_version, declaration.core_version) {
        reg.remove_last();
        return Err(TournamentError::load(path, message));
    }

    let mut proxy = StrategyProxy { registry: &mut reg };
    unsafe { (declaration.register)(&mut proxy) };

    if let Err(err) = reg.validate_last() {
        // validate_last already popped the placeholder.
        return Err(TournamentError::load(path, err.to_string()));
    }

    tracing::info!(module = %name, "strategy module loaded");
    Ok(LoadedModule {
        name,
        _library: library,
    })
}

/// Load an engine module and register its factory
pub fn load_engine_module(path: &Path) -> Result<LoadedModule, TournamentError> {
    let name = module_base_name(path);
    let mut reg = registry::engines();
    reg.begin_registration(&name);

    let library = match map_library(path) {
        Ok(library) => library,
        Err(err) => {
            reg.remove_last();
            return Err(err);
        }
    };

    let declaration = unsafe {
        match library.get::<*const EnginePluginDeclaration>(ENGINE_DECLARATION_SYMBOL) {
            Ok(symbol) => **symbol,
            Err(err) => {
                reg.remove_last();
                return Err(TournamentError::load(
                    path,
                    format!("no engine declaration: {err}"),
                ));
            }
        }
    };

    if let Err(message) = check_versions(declaration.rustc_version, declaration.core_version) {
        reg.remove_last();
        return Err(TournamentError::load(path, message));
    }

    let mut proxy = EngineProxy { registry: &mut reg };
    unsafe { (declaration.register)(&mut proxy) };

    if let Err(err) = reg.validate_last() {
        return Err(TournamentError::load(path, err.to_string()));
    }

    tracing::info!(module = %name, "engine module loaded");
    Ok(LoadedModule {
        name,
        _library: library,
    })
}

fn map_library(path: &Path) -> Result<Library, TournamentError> {
    // Safety: loading runs module initializers; that is the point of a
    // plugin. Callers only hand us paths the operator asked to load.
    unsafe { Library::new(path) }.map_err(|err| TournamentError::load(path, err.to_string()))
}

fn check_versions(rustc: &str, core: &str) -> Result<(), String> {
    if rustc != RUSTC_VERSION {
        return Err(format!(
            "module built with rustc {rustc}, host uses {RUSTC_VERSION}"
        ));
    }
    if core != CORE_VERSION {
        return Err(format!(
            "module built against tankwar-core {core}, host uses {CORE_VERSION}"
        ));
    }
    Ok(())
}

struct StrategyProxy<'a> {
    registry: &'a mut registry::StrategyRegistry,
}

impl StrategyRegistrar for StrategyProxy<'_> {
    fn register_player_factory(&mut self, factory: PlayerFactory) {
        if let Err(err) = self.registry.add_player_factory(factory) {
            tracing::warn!(%err, "player factory registration rejected");
        }
    }

    fn register_tank_factory(&mut self, factory: TankFactory) {
        if let Err(err) = self.registry.add_tank_factory(factory) {
            tracing::warn!(%err, "tank factory registration rejected");
        }
    }
}

struct EngineProxy<'a> {
    registry: &'a mut registry::EngineRegistry,
}

impl EngineRegistrar for EngineProxy<'_> {
    fn register_engine_factory(&mut self, factory: EngineFactory) {
        if let Err(err) = self.registry.set_factory_on_last(factory) {
            tracing::warn!(%err, "engine factory registration rejected");
        }
    }
}
