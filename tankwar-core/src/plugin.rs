//! Plugin ABI shared between the orchestrator and loadable modules
//!
//! A strategy module registers a player factory plus a tank factory; an
//! engine module registers an engine factory. Modules export a declaration
//! static (via the `export_*_plugin!` macros) whose callback the loader
//! invokes with a registrar. Declarations carry the rustc and core-crate
//! versions; the loader refuses modules built against anything else, since
//! trait-object layout is only guaranteed within one compiler version.

use crate::engine::EngineFactory;
use crate::strategy::{PlayerFactory, TankFactory};

/// Compiler that produced this copy of the core crate
pub static RUSTC_VERSION: &str = env!("RUSTC_VERSION");

/// Version of the core crate itself
pub static CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Symbol name of the strategy declaration static
pub const STRATEGY_DECLARATION_SYMBOL: &[u8] = b"strategy_plugin_declaration";

/// Symbol name of the engine declaration static
pub const ENGINE_DECLARATION_SYMBOL: &[u8] = b"engine_plugin_declaration";

/// Registration surface offered to a strategy module while it loads
pub trait StrategyRegistrar {
    fn register_player_factory(&mut self, factory: PlayerFactory);
    fn register_tank_factory(&mut self, factory: TankFactory);
}

/// Registration surface offered to an engine module while it loads
pub trait EngineRegistrar {
    fn register_engine_factory(&mut self, factory: EngineFactory);
}

#[derive(Copy, Clone)]
pub struct StrategyPluginDeclaration {
    pub rustc_version: &'static str,
    pub core_version: &'static str,
    pub register: unsafe extern "C" fn(&mut dyn StrategyRegistrar),
}

#[derive(Copy, Clone)]
pub struct EnginePluginDeclaration {
    pub rustc_version: &'static str,
    pub core_version: &'static str,
    pub register: unsafe extern "C" fn(&mut dyn EngineRegistrar),
}

/// Declare a strategy module's registration entry point.
///
/// ```ignore
/// tankwar_core::export_strategy_plugin!(register);
///
/// extern "C" fn register(registrar: &mut dyn tankwar_core::plugin::StrategyRegistrar) {
///     registrar.register_player_factory(...);
///     registrar.register_tank_factory(...);
/// }
/// ```
#[macro_export]
macro_rules! export_strategy_plugin {
    ($register:expr) => {
        #[doc(hidden)]
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static strategy_plugin_declaration: $crate::plugin::StrategyPluginDeclaration =
            $crate::plugin::StrategyPluginDeclaration {
                rustc_version: $crate::plugin::RUSTC_VERSION,
                core_version: $crate::plugin::CORE_VERSION,
                register: $register,
            };
    };
}

/// Declare an engine module's registration entry point
#[macro_export]
macro_rules! export_engine_plugin {
    ($register:expr) => {
        #[doc(hidden)]
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static engine_plugin_declaration: $crate::plugin::EnginePluginDeclaration =
            $crate::plugin::EnginePluginDeclaration {
                rustc_version: $crate::plugin::RUSTC_VERSION,
                core_version: $crate::plugin::CORE_VERSION,
                register: $register,
            };
    };
}
