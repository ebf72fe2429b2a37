//! Evasive strategy as a loadable module

use std::sync::Arc;

use tankwar_core::plugin::StrategyRegistrar;
use tankwar_core::{EvasiveStrategy, GamePlayer};

tankwar_core::export_strategy_plugin!(register);

extern "C" fn register(registrar: &mut dyn StrategyRegistrar) {
    registrar.register_player_factory(Arc::new(|player, width, height, max_steps, num_shells| {
        Box::new(GamePlayer::new(player, width, height, max_steps, num_shells))
    }));
    registrar.register_tank_factory(EvasiveStrategy::factory());
}
