//! Orchestration tests over in-process engines and strategies
//!
//! These drive the real scheduling, pooling and aggregation machinery with
//! built-in engines and strategies registered directly, no dynamic modules
//! involved.

use std::collections::HashSet;
use std::sync::Arc;

use tankwar_core::{
    parse_map, ActionRequest, BattleEngine, BattleInfo, EvasiveStrategy, GamePlayer, MapData,
    OffensiveStrategy, TankStrategy,
};
use tankwar_tournament::{
    compute_scores, group_results, registry, EngineHandle, StrategyHandle, Tournament,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

struct Idler;

impl TankStrategy for Idler {
    fn get_action(&mut self) -> ActionRequest {
        ActionRequest::DoNothing
    }

    fn update_battle_info(&mut self, _info: &BattleInfo) {}
}

fn engine_handle(name: &str) -> EngineHandle {
    EngineHandle {
        name: name.to_string(),
        factory: Arc::new(|verbose| Box::new(BattleEngine::new(verbose))),
    }
}

fn strategy_handle(name: &str, tank_factory: tankwar_core::TankFactory) -> StrategyHandle {
    StrategyHandle {
        name: name.to_string(),
        player_factory: Arc::new(|p, w, h, ms, ns| Box::new(GamePlayer::new(p, w, h, ms, ns))),
        tank_factory,
    }
}

fn idler_handle(name: &str) -> StrategyHandle {
    strategy_handle(name, Arc::new(|_, _| Box::new(Idler)))
}

fn arena() -> Arc<MapData> {
    let text = "\
arena
MaxSteps = 60
NumShells = 4
Rows = 5
Cols = 9
#########
#1     2#
#  ###  #
#2     1#
#########";
    Arc::new(parse_map("arena", text).expect("fixture map parses"))
}

// ============================================================================
// COMPARATIVE
// ============================================================================

#[test]
fn test_comparative_runs_one_match_per_engine() {
    let tournament = Tournament::new(1, false);
    let engines = vec![engine_handle("gm_a"), engine_handle("gm_b"), engine_handle("gm_c")];
    let records = tournament.comparative_matches(
        &engines,
        &strategy_handle("off", OffensiveStrategy::factory()),
        &strategy_handle("eva", EvasiveStrategy::factory()),
        arena(),
    );
    assert_eq!(records.len(), 3);
    let names: HashSet<_> = records.iter().map(|r| r.engine.as_str()).collect();
    assert_eq!(names, HashSet::from(["gm_a", "gm_b", "gm_c"]));
}

#[test]
fn test_identical_engines_group_together() {
    let tournament = Tournament::new(1, false);
    let engines = vec![engine_handle("gm_a"), engine_handle("gm_b")];
    let records = tournament.comparative_matches(
        &engines,
        &strategy_handle("off", OffensiveStrategy::factory()),
        &idler_handle("idle"),
        arena(),
    );
    let groups = group_results(records);
    // Same deterministic engine twice: one group holding both names.
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].engines, vec!["gm_a", "gm_b"]);
}

#[test]
fn test_pool_and_inline_execution_agree() {
    let engines: Vec<_> = (0..6).map(|i| engine_handle(&format!("gm_{i}"))).collect();
    let s1 = strategy_handle("off", OffensiveStrategy::factory());
    let s2 = strategy_handle("eva", EvasiveStrategy::factory());

    let inline = Tournament::new(1, false).comparative_matches(&engines, &s1, &s2, arena());
    let pooled = Tournament::new(4, false).comparative_matches(&engines, &s1, &s2, arena());

    // Completion order may differ; grouped verdicts must not.
    let inline_groups = group_results(inline);
    let pooled_groups = group_results(pooled);
    assert_eq!(inline_groups.len(), pooled_groups.len());
    for (a, b) in inline_groups.iter().zip(&pooled_groups) {
        assert_eq!(a.engines, b.engines);
        assert_eq!(a.result, b.result);
    }
}

// ============================================================================
// COMPETITION
// ============================================================================

#[test]
fn test_competition_plays_every_pair_once_over_three_maps() {
    let tournament = Tournament::new(2, false);
    let strategies = vec![
        idler_handle("a"),
        idler_handle("b"),
        idler_handle("c"),
        idler_handle("d"),
    ];
    let maps = vec![arena(), arena(), arena()];
    let records = tournament.competition_matches(&engine_handle("gm"), &strategies, &maps);

    assert_eq!(records.len(), 6);
    let pairs: HashSet<(String, String)> = records
        .iter()
        .map(|r| (r.strategy1.clone(), r.strategy2.clone()))
        .collect();
    assert_eq!(pairs.len(), 6, "no pair repeats: {pairs:?}");
    for (x, y) in [("a", "b"), ("a", "c"), ("a", "d"), ("b", "c"), ("b", "d"), ("c", "d")] {
        assert!(
            pairs.contains(&(x.to_string(), y.to_string())),
            "missing pair ({x}, {y})"
        );
    }
}

#[test]
fn test_competition_scoring_all_ties() {
    // Idlers never move or shoot; 1v1 tank counts stay equal, so every
    // match ties on max steps and everyone collects one point per match.
    let tournament = Tournament::new(1, false);
    let strategies = vec![idler_handle("a"), idler_handle("b"), idler_handle("c")];
    let maps = vec![arena(), arena()];
    let records = tournament.competition_matches(&engine_handle("gm"), &strategies, &maps);
    assert_eq!(records.len(), 3);

    let scores = compute_scores(&strategies, &records);
    for score in &scores {
        assert_eq!(score.ties, 2);
        assert_eq!(score.score, score.ties);
        assert_eq!(score.wins, 0);
        assert_eq!(score.losses, 0);
    }
    let total: u32 = scores.iter().map(|s| s.score).sum();
    // Two points leave the pot per tied match.
    assert_eq!(total, 6);
}

// ============================================================================
// GLOBAL REGISTRY HELPERS
// ============================================================================

#[test]
fn test_builtin_registration_round_trip() {
    // Sole test touching the process-wide registries in this binary.
    registry::clear_all();
    registry::register_strategy(
        "offensive",
        Arc::new(|p, w, h, ms, ns| Box::new(GamePlayer::new(p, w, h, ms, ns))),
        OffensiveStrategy::factory(),
    );
    registry::register_strategy(
        "evasive",
        Arc::new(|p, w, h, ms, ns| Box::new(GamePlayer::new(p, w, h, ms, ns))),
        EvasiveStrategy::factory(),
    );
    registry::register_engine("battle", Arc::new(|v| Box::new(BattleEngine::new(v))));

    let strategies = registry::strategies().handles();
    let engines = registry::engines().handles();
    assert_eq!(strategies.len(), 2);
    assert_eq!(engines.len(), 1);

    // The handles drive a real match.
    let tournament = Tournament::new(1, false);
    let records =
        tournament.comparative_matches(&engines, &strategies[0], &strategies[1], arena());
    assert_eq!(records.len(), 1);
    assert!(records[0].result.rounds <= 60);

    registry::clear_all();
    assert!(registry::strategies().is_empty());
    assert!(registry::engines().is_empty());
}
