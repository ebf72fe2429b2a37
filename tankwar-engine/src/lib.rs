//! Built-in battle engine as a loadable module

use std::sync::Arc;

use tankwar_core::plugin::EngineRegistrar;
use tankwar_core::BattleEngine;

tankwar_core::export_engine_plugin!(register);

extern "C" fn register(registrar: &mut dyn EngineRegistrar) {
    registrar.register_engine_factory(Arc::new(|verbose| Box::new(BattleEngine::new(verbose))));
}
