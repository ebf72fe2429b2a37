//! Deterministic battle engine
//!
//! One [`Engine::run`] call simulates a complete match from an initial map
//! snapshot to a terminal verdict. Every round advances in fixed sub-phases
//! (shell half-step, tank actions, shell half-step, cleanup, end checks) and
//! all entity processing follows creation order, so identical inputs always
//! produce identical results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, BoardView, Cell, Direction, Point, SatelliteView};
use crate::strategy::{ActionRequest, Player, TankFactory, TankStrategy};
use crate::tank::{ReverseState, Shell, Tank, SHOT_COOLDOWN};

// ============================================================================
// RESULTS AND ERRORS
// ============================================================================

/// Why a match ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WinReason {
    AllTanksDead,
    MaxSteps,
    ZeroShells,
}

/// Terminal verdict of one match; `winner == 0` denotes a tie
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: u8,
    pub reason: WinReason,
    pub rounds: usize,
    /// Final board rendered as text
    pub final_state: String,
}

/// Structural failures that abort a run. Illegal in-game actions are never
/// errors; they are recorded as ignored and treated as `DoNothing`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed map: unknown glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
    #[error("malformed map: zero-sized board")]
    EmptyBoard,
}

// ============================================================================
// ENGINE CONTRACT
// ============================================================================

/// Everything one match needs. Factories are keyed by
/// `(player_id, tank_index)`; the map view is read once during setup.
pub struct MatchSetup<'a> {
    pub width: usize,
    pub height: usize,
    pub map_view: &'a dyn SatelliteView,
    pub map_name: &'a str,
    pub max_steps: usize,
    pub num_shells: usize,
    /// Rounds all tanks may sit on empty magazines before the match is called
    pub zero_shell_steps: usize,
    pub player1: &'a mut dyn Player,
    pub name1: &'a str,
    pub player2: &'a mut dyn Player,
    pub name2: &'a str,
    pub tank_factory1: &'a TankFactory,
    pub tank_factory2: &'a TankFactory,
}

/// A match simulator. One instance per match.
pub trait Engine: Send {
    fn run(&mut self, setup: MatchSetup<'_>) -> Result<GameResult, EngineError>;
}

/// Creates an engine; the flag enables per-round debug logging
pub type EngineFactory = std::sync::Arc<dyn Fn(bool) -> Box<dyn Engine> + Send + Sync>;

/// The built-in engine
pub struct BattleEngine {
    verbose: bool,
}

impl BattleEngine {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Engine for BattleEngine {
    fn run(&mut self, setup: MatchSetup<'_>) -> Result<GameResult, EngineError> {
        let mut state = MatchState::from_setup(&setup)?;
        tracing::debug!(
            map = setup.map_name,
            player1 = setup.name1,
            player2 = setup.name2,
            tanks = state.tanks.len(),
            "match start"
        );

        if let Some((winner, reason)) = state.side_verdict() {
            return Ok(state.into_result(winner, reason));
        }

        loop {
            state.round += 1;
            state.advance_shells();
            state.tank_phase(&mut *setup.player1, &mut *setup.player2, self.verbose);
            state.advance_shells();
            state.cleanup();
            if let Some((winner, reason)) = state.round_verdict() {
                tracing::debug!(winner, ?reason, rounds = state.round, "match over");
                return Ok(state.into_result(winner, reason));
            }
        }
    }
}

// ============================================================================
// MATCH STATE
// ============================================================================

/// What a tank resolved to this round after validation
#[derive(Clone, Copy, Debug)]
struct RoundDecision {
    action: ActionRequest,
    ignored: bool,
}

struct MatchState {
    board: Board,
    /// All tanks of both players, in creation order
    tanks: Vec<Tank>,
    strategies: Vec<Box<dyn TankStrategy>>,
    shells: Vec<Shell>,
    round: usize,
    zero_shell_rounds: usize,
}

impl MatchState {
    fn from_setup(setup: &MatchSetup<'_>) -> Result<Self, EngineError> {
        if setup.width == 0 || setup.height == 0 {
            return Err(EngineError::EmptyBoard);
        }

        let mut board = Board::new(
            setup.map_name,
            setup.width,
            setup.height,
            setup.max_steps,
            setup.num_shells,
        )
        .with_zero_shell_steps(setup.zero_shell_steps);

        // Row-major scan assigns creation order and per-player tank indices.
        let mut tanks = Vec::new();
        let mut per_player = [0usize; 2];
        for y in 0..setup.height {
            for x in 0..setup.width {
                let glyph = setup.map_view.object_at(x, y);
                let pos = Point::new(x, y);
                if let Some(cell) = Cell::from_glyph(glyph) {
                    board.set_cell(pos, cell);
                } else if glyph == '1' || glyph == '2' {
                    let player = if glyph == '1' { 1 } else { 2 };
                    let facing = if player == 1 { Direction::Left } else { Direction::Right };
                    let index = per_player[player as usize - 1];
                    per_player[player as usize - 1] += 1;
                    tanks.push(Tank::new(player, index, tanks.len(), pos, facing, setup.num_shells));
                } else {
                    return Err(EngineError::UnknownGlyph { glyph, x, y });
                }
            }
        }

        let strategies = tanks
            .iter()
            .map(|t| {
                let factory = if t.player == 1 { setup.tank_factory1 } else { setup.tank_factory2 };
                factory(t.player, t.index)
            })
            .collect();

        Ok(Self {
            board,
            tanks,
            strategies,
            shells: Vec::new(),
            round: 0,
            zero_shell_rounds: 0,
        })
    }

    fn alive_count(&self, player: u8) -> usize {
        self.tanks.iter().filter(|t| t.alive && t.player == player).count()
    }

    fn alive_tank_at(&self, pos: Point) -> Option<usize> {
        self.tanks.iter().position(|t| t.alive && t.position == pos)
    }

    fn alive_shell_at(&self, pos: Point) -> Option<usize> {
        self.shells.iter().position(|s| s.alive && s.position == pos)
    }

    fn is_blocked(&self, pos: Point) -> bool {
        matches!(self.board.cell(pos), Cell::Wall | Cell::DamagedWall)
    }

    // ------------------------------------------------------------------
    // Shell half-steps
    // ------------------------------------------------------------------

    /// Move every alive shell one cell and resolve collisions
    fn advance_shells(&mut self) {
        let n = self.shells.len();
        let targets: Vec<Point> = self
            .shells
            .iter()
            .map(|s| self.board.step(s.position, s.direction))
            .collect();

        // Crossing: A at X moving to Y meets B at Y moving to X. Both die
        // even though neither ever occupies the other's cell.
        for i in 0..n {
            if !self.shells[i].alive {
                continue;
            }
            for j in (i + 1)..n {
                if !self.shells[j].alive {
                    continue;
                }
                if targets[i] == self.shells[j].position && targets[j] == self.shells[i].position {
                    self.shells[i].alive = false;
                    self.shells[j].alive = false;
                }
            }
        }

        for (shell, target) in self.shells.iter_mut().zip(targets) {
            if shell.alive {
                shell.position = target;
            }
        }

        self.resolve_shell_cells();
    }

    /// Apply per-cell collision rules to all alive shells
    fn resolve_shell_cells(&mut self) {
        use std::collections::BTreeMap;

        let mut by_cell: BTreeMap<Point, Vec<usize>> = BTreeMap::new();
        for (i, shell) in self.shells.iter().enumerate() {
            if shell.alive {
                by_cell.entry(shell.position).or_default().push(i);
            }
        }

        for (pos, indices) in by_cell {
            let mut spent = false;
            match self.board.cell(pos) {
                Cell::Wall => {
                    // The wall absorbs one hit per half-step regardless of
                    // how many shells arrive.
                    self.board.set_cell(pos, Cell::DamagedWall);
                    spent = true;
                }
                Cell::DamagedWall => {
                    self.board.set_cell(pos, Cell::Empty);
                    spent = true;
                }
                // Mines only affect tanks; shells pass over them.
                Cell::Mine | Cell::Empty => {
                    if indices.len() >= 2 {
                        spent = true;
                    }
                    if let Some(ti) = self.alive_tank_at(pos) {
                        self.tanks[ti].alive = false;
                        spent = true;
                    }
                }
            }
            if spent {
                for i in indices {
                    self.shells[i].alive = false;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Tank phase
    // ------------------------------------------------------------------

    fn tank_phase(&mut self, player1: &mut dyn Player, player2: &mut dyn Player, verbose: bool) {
        let decisions = self.collect_decisions(player1, player2, verbose);
        self.apply_decisions(&decisions);
        // Shells spawned this phase may share a cell with one another or
        // with a shell already in flight.
        self.resolve_shell_cells();
    }

    /// Query every alive tank in creation order and validate its request
    fn collect_decisions<'a>(
        &mut self,
        player1: &'a mut dyn Player,
        player2: &'a mut dyn Player,
        verbose: bool,
    ) -> Vec<Option<RoundDecision>> {
        let mut decisions = Vec::with_capacity(self.tanks.len());
        for i in 0..self.tanks.len() {
            if !self.tanks[i].alive {
                decisions.push(None);
                continue;
            }
            let action = self.strategies[i].get_action();
            if action == ActionRequest::GetBattleInfo {
                // Fulfilling the request consumes the tank's turn.
                let view = self.render_view().with_marker(self.tanks[i].position);
                let player = if self.tanks[i].player == 1 { &mut *player1 } else { &mut *player2 };
                player.update_tank_with_battle_info(self.strategies[i].as_mut(), &view);
                decisions.push(None);
                continue;
            }
            let ignored = !self.is_legal(i, action);
            if ignored {
                tracing::trace!(
                    round = self.round,
                    tank = self.tanks[i].creation_order,
                    ?action,
                    "illegal action ignored"
                );
            }
            if verbose {
                tracing::debug!(
                    round = self.round,
                    player = self.tanks[i].player,
                    tank = self.tanks[i].index,
                    ?action,
                    ignored,
                    "action"
                );
            }
            decisions.push(Some(RoundDecision { action, ignored }));
        }
        decisions
    }

    /// Validate an action against the current state
    fn is_legal(&self, i: usize, action: ActionRequest) -> bool {
        let tank = &self.tanks[i];
        match action {
            ActionRequest::Shoot => tank.can_shoot(),
            ActionRequest::MoveForward => {
                // A forward request during reverse preparation only cancels
                // the pending reverse, so it is always legal there.
                if matches!(tank.reverse, ReverseState::Requested | ReverseState::Armed) {
                    true
                } else {
                    !self.is_blocked(self.board.step(tank.position, tank.facing))
                }
            }
            ActionRequest::MoveBackward => match tank.reverse {
                // Starting or continuing the countdown moves nothing yet.
                ReverseState::Idle | ReverseState::Requested => true,
                ReverseState::Armed | ReverseState::Reversing => {
                    !self.is_blocked(self.board.step(tank.position, tank.facing.opposite()))
                }
            },
            _ => true,
        }
    }

    /// Apply validated actions, then resolve tank movement collectively
    fn apply_decisions(&mut self, decisions: &[Option<RoundDecision>]) {
        let mut pending_moves: Vec<Option<Point>> = vec![None; self.tanks.len()];

        for (i, decision) in decisions.iter().enumerate() {
            if !self.tanks[i].alive {
                continue;
            }
            let Some(decision) = decision else { continue };
            if decision.ignored {
                continue;
            }
            match decision.action {
                ActionRequest::RotateLeft45 => self.rotate(i, Direction::rotate_left45),
                ActionRequest::RotateRight45 => self.rotate(i, Direction::rotate_right45),
                ActionRequest::RotateLeft90 => self.rotate(i, Direction::rotate_left90),
                ActionRequest::RotateRight90 => self.rotate(i, Direction::rotate_right90),
                ActionRequest::Shoot => {
                    self.tanks[i].shells -= 1;
                    self.tanks[i].cooldown = SHOT_COOLDOWN;
                    self.spawn_shell(i);
                }
                ActionRequest::MoveForward => {
                    let tank = &mut self.tanks[i];
                    match tank.reverse {
                        ReverseState::Requested | ReverseState::Armed => {
                            // Cancels the pending reverse; no movement.
                            tank.reverse = ReverseState::Idle;
                        }
                        _ => {
                            tank.reverse = ReverseState::Idle;
                            pending_moves[i] = Some(self.board.step(tank.position, tank.facing));
                        }
                    }
                }
                ActionRequest::MoveBackward => {
                    let back = self.board.step(self.tanks[i].position, self.tanks[i].facing.opposite());
                    let tank = &mut self.tanks[i];
                    match tank.reverse {
                        ReverseState::Idle => tank.reverse = ReverseState::Requested,
                        ReverseState::Requested => tank.reverse = ReverseState::Armed,
                        ReverseState::Armed => {
                            tank.reverse = ReverseState::Reversing;
                            pending_moves[i] = Some(back);
                        }
                        ReverseState::Reversing => pending_moves[i] = Some(back),
                    }
                }
                ActionRequest::DoNothing | ActionRequest::GetBattleInfo => {}
            }
        }

        self.resolve_moves(&pending_moves);
    }

    fn rotate(&mut self, i: usize, f: fn(Direction) -> Direction) {
        let tank = &mut self.tanks[i];
        tank.facing = f(tank.facing);
        tank.reverse = ReverseState::Idle;
    }

    /// Spawn a shell one cell ahead of tank `i`, resolving the spawn cell
    fn spawn_shell(&mut self, i: usize) {
        let pos = self.board.step(self.tanks[i].position, self.tanks[i].facing);
        let direction = self.tanks[i].facing;
        match self.board.cell(pos) {
            Cell::Wall => self.board.set_cell(pos, Cell::DamagedWall),
            Cell::DamagedWall => self.board.set_cell(pos, Cell::Empty),
            Cell::Mine | Cell::Empty => {
                if let Some(ti) = self.alive_tank_at(pos) {
                    // Point-blank shot: the target dies, the shell with it.
                    self.tanks[ti].alive = false;
                } else {
                    self.shells.push(Shell::new(pos, direction));
                }
            }
        }
    }

    /// Resolve all pending tank moves at once: swaps, shared destinations,
    /// collisions with resting tanks, then mines and resting shells.
    fn resolve_moves(&mut self, pending: &[Option<Point>]) {
        let n = self.tanks.len();

        // Swapping tanks kill each other without ever moving.
        for i in 0..n {
            let Some(di) = pending[i] else { continue };
            if !self.tanks[i].alive {
                continue;
            }
            for j in (i + 1)..n {
                let Some(dj) = pending[j] else { continue };
                if !self.tanks[j].alive {
                    continue;
                }
                if di == self.tanks[j].position && dj == self.tanks[i].position {
                    self.tanks[i].alive = false;
                    self.tanks[j].alive = false;
                }
            }
        }

        // Two movers entering the same cell both die.
        for i in 0..n {
            if pending[i].is_none() || !self.tanks[i].alive {
                continue;
            }
            for j in (i + 1)..n {
                if !self.tanks[j].alive {
                    continue;
                }
                if pending[j].is_some() && pending[i] == pending[j] {
                    self.tanks[i].alive = false;
                    self.tanks[j].alive = false;
                }
            }
        }

        // A mover entering a cell whose occupant stays put collides with it.
        for i in 0..n {
            let Some(dest) = pending[i] else { continue };
            if !self.tanks[i].alive {
                continue;
            }
            if let Some(j) = self.alive_tank_at(dest) {
                if j != i && pending[j].is_none() {
                    self.tanks[i].alive = false;
                    self.tanks[j].alive = false;
                }
            }
        }

        // Execute surviving moves.
        for i in 0..n {
            if let Some(dest) = pending[i] {
                if self.tanks[i].alive {
                    self.tanks[i].position = dest;
                }
            }
        }

        // Mines and resting shells at the new positions.
        for i in 0..n {
            if pending[i].is_none() || !self.tanks[i].alive {
                continue;
            }
            let pos = self.tanks[i].position;
            if self.board.cell(pos) == Cell::Mine {
                self.tanks[i].alive = false;
                self.board.set_cell(pos, Cell::Empty);
                continue;
            }
            if let Some(si) = self.alive_shell_at(pos) {
                self.tanks[i].alive = false;
                self.shells[si].alive = false;
            }
        }
    }

    // ------------------------------------------------------------------
    // Cleanup and verdicts
    // ------------------------------------------------------------------

    fn cleanup(&mut self) {
        for tank in &mut self.tanks {
            if tank.cooldown > 0 {
                tank.cooldown -= 1;
            }
        }
        self.shells.retain(|s| s.alive);
    }

    /// Verdict that depends only on which sides still have tanks
    fn side_verdict(&self) -> Option<(u8, WinReason)> {
        let p1 = self.alive_count(1);
        let p2 = self.alive_count(2);
        match (p1, p2) {
            (0, 0) => Some((0, WinReason::AllTanksDead)),
            (0, _) => Some((2, WinReason::AllTanksDead)),
            (_, 0) => Some((1, WinReason::AllTanksDead)),
            _ => None,
        }
    }

    /// Full end-of-round check. Tank-count verdicts come first; the
    /// max-steps check precedes the zero-shell countdown so a match that
    /// hits both limits in the same round reports `MaxSteps`.
    fn round_verdict(&mut self) -> Option<(u8, WinReason)> {
        if let Some(verdict) = self.side_verdict() {
            return Some(verdict);
        }

        if self.tanks.iter().filter(|t| t.alive).all(|t| t.shells == 0) {
            self.zero_shell_rounds += 1;
        } else {
            self.zero_shell_rounds = 0;
        }

        let p1 = self.alive_count(1);
        let p2 = self.alive_count(2);
        let leader = match p1.cmp(&p2) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => 2,
            std::cmp::Ordering::Equal => 0,
        };

        if self.round >= self.board.max_steps() {
            return Some((leader, WinReason::MaxSteps));
        }
        if self.zero_shell_rounds >= self.board.zero_shell_steps() {
            return Some((leader, WinReason::ZeroShells));
        }
        None
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Redraw the board from authoritative entity state
    fn render_view(&self) -> BoardView {
        let mut grid: Vec<Vec<char>> = (0..self.board.height())
            .map(|y| {
                (0..self.board.width())
                    .map(|x| self.board.cell(Point::new(x, y)).glyph())
                    .collect()
            })
            .collect();
        for tank in self.tanks.iter().filter(|t| t.alive) {
            grid[tank.position.y][tank.position.x] = tank.glyph();
        }
        for shell in self.shells.iter().filter(|s| s.alive) {
            grid[shell.position.y][shell.position.x] = crate::board::SHELL_GLYPH;
        }
        BoardView::new(grid)
    }

    fn into_result(self, winner: u8, reason: WinReason) -> GameResult {
        GameResult {
            winner,
            reason,
            rounds: self.round,
            final_state: self.render_view().to_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardView;
    use crate::strategy::{GamePlayer, TankStrategy};
    use std::sync::{Arc, Mutex};

    /// Plays a fixed script, then does nothing
    struct Scripted {
        actions: Vec<ActionRequest>,
        turn: usize,
    }

    impl TankStrategy for Scripted {
        fn get_action(&mut self) -> ActionRequest {
            let action = self.actions.get(self.turn).copied().unwrap_or(ActionRequest::DoNothing);
            self.turn += 1;
            action
        }

        fn update_battle_info(&mut self, _info: &crate::strategy::BattleInfo) {}
    }

    fn scripted(actions: Vec<ActionRequest>) -> TankFactory {
        Arc::new(move |_, _| {
            Box::new(Scripted {
                actions: actions.clone(),
                turn: 0,
            })
        })
    }

    fn run_match(
        map: &str,
        max_steps: usize,
        num_shells: usize,
        factory1: TankFactory,
        factory2: TankFactory,
    ) -> GameResult {
        let view = BoardView::parse(map);
        let (w, h) = (view.width(), view.height());
        let mut p1 = GamePlayer::new(1, w, h, max_steps, num_shells);
        let mut p2 = GamePlayer::new(2, w, h, max_steps, num_shells);
        let mut engine = BattleEngine::new(false);
        engine
            .run(MatchSetup {
                width: w,
                height: h,
                map_view: &view,
                map_name: "test",
                max_steps,
                num_shells,
                zero_shell_steps: 40,
                player1: &mut p1,
                name1: "a",
                player2: &mut p2,
                name2: "b",
                tank_factory1: &factory1,
                tank_factory2: &factory2,
            })
            .expect("match should run")
    }

    #[test]
    fn test_empty_side_ends_immediately() {
        let result = run_match("1  ", 100, 5, scripted(vec![]), scripted(vec![]));
        assert_eq!(result.winner, 1);
        assert_eq!(result.reason, WinReason::AllTanksDead);
        assert_eq!(result.rounds, 0);
    }

    #[test]
    fn test_no_tanks_is_immediate_tie() {
        let result = run_match("   ", 100, 5, scripted(vec![]), scripted(vec![]));
        assert_eq!(result.winner, 0);
        assert_eq!(result.reason, WinReason::AllTanksDead);
    }

    #[test]
    fn test_unknown_glyph_is_engine_error() {
        let view = BoardView::new(vec![vec!['1', '?', '2']]);
        let factory = scripted(vec![]);
        let mut p1 = GamePlayer::new(1, 3, 1, 10, 0);
        let mut p2 = GamePlayer::new(2, 3, 1, 10, 0);
        let mut engine = BattleEngine::new(false);
        let err = engine
            .run(MatchSetup {
                width: 3,
                height: 1,
                map_view: &view,
                map_name: "bad",
                max_steps: 10,
                num_shells: 0,
                zero_shell_steps: 40,
                player1: &mut p1,
                name1: "a",
                player2: &mut p2,
                name2: "b",
                tank_factory1: &factory,
                tank_factory2: &factory,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownGlyph { glyph: '?', x: 1, y: 0 }));
    }

    /// Records the positions a tank reports via battle info, to observe
    /// actual movement from outside the engine.
    struct Probe {
        actions: Vec<ActionRequest>,
        turn: usize,
        seen: Arc<Mutex<Vec<Point>>>,
    }

    impl TankStrategy for Probe {
        fn get_action(&mut self) -> ActionRequest {
            let action = self.actions.get(self.turn).copied().unwrap_or(ActionRequest::DoNothing);
            self.turn += 1;
            action
        }

        fn update_battle_info(&mut self, info: &crate::strategy::BattleInfo) {
            if let Some(pos) = info.own_position() {
                self.seen.lock().unwrap().push(pos);
            }
        }
    }

    #[test]
    fn test_reverse_latency() {
        // Backward four times, probing position after each attempt:
        // no move, no move, one cell, one cell.
        use ActionRequest::*;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let actions = vec![
            MoveBackward, GetBattleInfo,
            MoveBackward, GetBattleInfo,
            MoveBackward, GetBattleInfo,
            MoveBackward, GetBattleInfo,
        ];
        let factory1: TankFactory = Arc::new(move |_, _| {
            Box::new(Probe {
                actions: actions.clone(),
                turn: 0,
                seen: seen_clone.clone(),
            })
        });
        // 1 faces left, so backward drifts right from x=2.
        let result = run_match("  1    \n2      ", 20, 0, factory1, scripted(vec![]));
        assert_eq!(result.reason, WinReason::MaxSteps);
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Point::new(2, 0),
                Point::new(2, 0),
                Point::new(3, 0),
                Point::new(4, 0),
            ]
        );
    }

    #[test]
    fn test_forward_cancels_pending_reverse() {
        use ActionRequest::*;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let actions = vec![MoveBackward, MoveForward, GetBattleInfo, MoveBackward, MoveBackward, MoveBackward, GetBattleInfo];
        let factory1: TankFactory = Arc::new(move |_, _| {
            Box::new(Probe {
                actions: actions.clone(),
                turn: 0,
                seen: seen_clone.clone(),
            })
        });
        let result = run_match("  1    \n2      ", 20, 0, factory1, scripted(vec![]));
        assert_eq!(result.reason, WinReason::MaxSteps);
        let seen = seen.lock().unwrap();
        // The forward cancel leaves the tank in place; the countdown then
        // restarts from scratch.
        assert_eq!(*seen, vec![Point::new(2, 0), Point::new(3, 0)]);
    }

    #[test]
    fn test_shoot_cooldown_and_shell_count() {
        use ActionRequest::*;
        // Six shoot requests back to back: only rounds 1 and 5 fire (the
        // cooldown eats the rest). The wall on the firing line absorbs both
        // shells, so the match runs to max steps.
        let result = run_match(
            "1    # \n      2",
            6,
            3,
            scripted(vec![Shoot, Shoot, Shoot, Shoot, Shoot, Shoot]),
            scripted(vec![]),
        );
        assert_eq!(result.reason, WinReason::MaxSteps);
        assert_eq!(result.rounds, 6);
        // First shot damaged the wall, the second cleared it.
        assert!(!result.final_state.contains('#'));
        assert!(!result.final_state.contains('='));
    }

    #[test]
    fn test_wall_takes_two_hits() {
        use ActionRequest::*;
        // Player 2 faces right into the wall: the first shot damages it, the
        // second clears it, the third passes through and kills the opponent.
        let result = run_match("2#1", 30, 5, scripted(vec![]), scripted(vec![Shoot; 12]));
        assert_eq!(result.winner, 2);
        assert_eq!(result.reason, WinReason::AllTanksDead);
        assert_eq!(result.rounds, 9);
        assert!(!result.final_state.contains('#'));
        assert!(!result.final_state.contains('='));
    }

    #[test]
    fn test_tank_swap_kills_both() {
        use ActionRequest::*;
        let result = run_match(
            "12",
            10,
            0,
            scripted(vec![MoveForward]),
            scripted(vec![MoveForward]),
        );
        assert_eq!(result.winner, 0);
        assert_eq!(result.reason, WinReason::AllTanksDead);
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn test_mine_kills_tank_and_is_consumed() {
        use ActionRequest::*;
        // 1 faces left onto the mine.
        let result = run_match("@1 2", 10, 0, scripted(vec![MoveForward]), scripted(vec![]));
        assert_eq!(result.winner, 2);
        assert_eq!(result.reason, WinReason::AllTanksDead);
        assert!(!result.final_state.contains('@'));
    }

    #[test]
    fn test_move_into_wall_is_ignored() {
        use ActionRequest::*;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let actions = vec![MoveForward, GetBattleInfo];
        let factory1: TankFactory = Arc::new(move |_, _| {
            Box::new(Probe {
                actions: actions.clone(),
                turn: 0,
                seen: seen_clone.clone(),
            })
        });
        let result = run_match("#1  2", 10, 0, factory1, scripted(vec![]));
        assert_eq!(result.reason, WinReason::MaxSteps);
        assert_eq!(*seen.lock().unwrap(), vec![Point::new(1, 0)]);
    }

    #[test]
    fn test_max_steps_tiebreak_counts_tanks() {
        let result = run_match("1 1\n 2 ", 7, 0, scripted(vec![]), scripted(vec![]));
        assert_eq!(result.winner, 1);
        assert_eq!(result.reason, WinReason::MaxSteps);
        assert_eq!(result.rounds, 7);
    }

    #[test]
    fn test_point_blank_shot() {
        use ActionRequest::*;
        let result = run_match("21", 10, 1, scripted(vec![]), scripted(vec![Shoot]));
        // 2 faces right, adjacent to 1: the shell lands on it immediately.
        assert_eq!(result.winner, 2);
        assert_eq!(result.reason, WinReason::AllTanksDead);
        assert_eq!(result.rounds, 1);
    }
}
