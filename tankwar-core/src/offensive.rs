//! Reference offensive strategy
//!
//! Keeps its own picture of the battle: a board snapshot refreshed every few
//! turns, its position and facing, and a cached BFS path to the nearest
//! enemy. Shoots when an enemy sits on the firing line, otherwise closes the
//! distance along the cached path, preferring 45-degree turns over
//! 90-degree ones. Falls back to scanning right when no enemy is reachable.

use std::sync::Arc;

use crate::board::{tank_player_from_glyph, Cell, Direction, Point};
use crate::pathfind::shortest_path;
use crate::strategy::{ActionRequest, BattleInfo, TankFactory, TankStrategy};
use crate::tank::SHOT_COOLDOWN;

/// Fresh battle info is requested every this many turns
const INFO_REFRESH_TURNS: usize = 3;

/// Shells closer than this (Chebyshev, wrapped) trigger panic mode
const PANIC_RADIUS: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Regular,
    Panic,
}

pub struct OffensiveStrategy {
    player: u8,
    facing: Direction,
    position: Option<Point>,
    info: Option<BattleInfo>,
    path: Vec<Point>,
    mode: Mode,
    mode_changed: bool,
    turn: usize,
    cooldown: u8,
}

impl OffensiveStrategy {
    pub fn new(player: u8, _tank_index: usize) -> Self {
        // Setup convention: player 1 spawns facing left, player 2 right.
        let facing = if player == 1 { Direction::Left } else { Direction::Right };
        Self {
            player,
            facing,
            position: None,
            info: None,
            path: Vec::new(),
            mode: Mode::Regular,
            mode_changed: false,
            turn: 0,
            cooldown: 0,
        }
    }

    pub fn factory() -> TankFactory {
        Arc::new(|player, tank_index| Box::new(OffensiveStrategy::new(player, tank_index)))
    }

    fn glyph_at(&self, p: Point) -> char {
        match &self.info {
            Some(info) => info.object_at(p.x, p.y),
            None => '#',
        }
    }

    fn is_passable(&self, p: Point) -> bool {
        matches!(self.glyph_at(p), ' ' | '*')
    }

    fn is_enemy(&self, c: char) -> bool {
        tank_player_from_glyph(c).is_some_and(|p| p != self.player)
    }

    fn step(&self, p: Point, dir: Direction) -> Option<Point> {
        let info = self.info.as_ref()?;
        let (dx, dy) = dir.delta();
        Some(Point {
            x: (p.x as i32 + dx).rem_euclid(info.width() as i32) as usize,
            y: (p.y as i32 + dy).rem_euclid(info.height() as i32) as usize,
        })
    }

    /// Any shell within [`PANIC_RADIUS`] of us, wrapped distance
    fn shell_nearby(&self, pos: Point) -> bool {
        let Some(info) = &self.info else { return false };
        let (w, h) = (info.width() as i32, info.height() as i32);
        for y in 0..h {
            for x in 0..w {
                if info.object_at(x as usize, y as usize) != crate::board::SHELL_GLYPH {
                    continue;
                }
                let dx = (x - pos.x as i32).rem_euclid(w).min((pos.x as i32 - x).rem_euclid(w));
                let dy = (y - pos.y as i32).rem_euclid(h).min((pos.y as i32 - y).rem_euclid(h));
                if dx.max(dy) <= PANIC_RADIUS {
                    return true;
                }
            }
        }
        false
    }

    /// Walk the firing line until a wall or a tank
    fn enemy_in_line_of_fire(&self, pos: Point) -> bool {
        let Some(info) = &self.info else { return false };
        let range = info.width().max(info.height());
        let mut cursor = pos;
        for _ in 0..range {
            let Some(next) = self.step(cursor, self.facing) else { return false };
            cursor = next;
            match self.glyph_at(cursor) {
                c if self.is_enemy(c) => return true,
                '#' | '=' => return false,
                c if tank_player_from_glyph(c).is_some() => return false,
                _ => {}
            }
        }
        false
    }

    fn recompute_path(&mut self, pos: Point) {
        let Some(info) = self.info.as_ref() else {
            self.path.clear();
            return;
        };
        let (w, h) = (info.width(), info.height());
        let grid: Vec<Vec<char>> = (0..h)
            .map(|y| (0..w).map(|x| info.object_at(x, y)).collect())
            .collect();
        let player = self.player;
        let passable = |p: Point| {
            let c = grid[p.y][p.x];
            c != Cell::Wall.glyph()
                && c != Cell::DamagedWall.glyph()
                && c != Cell::Mine.glyph()
                && tank_player_from_glyph(c) != Some(player)
        };
        let is_goal = |p: Point| {
            tank_player_from_glyph(grid[p.y][p.x]).is_some_and(|owner| owner != player)
        };
        self.path = shortest_path(w, h, passable, pos, is_goal).unwrap_or_default();
    }

    /// Rotate toward `target` with the cheapest turn, updating local facing
    fn rotate_toward(&mut self, target: Direction) -> ActionRequest {
        match self.facing.steps_to(target) {
            1 => {
                self.facing = self.facing.rotate_right45();
                ActionRequest::RotateRight45
            }
            -1 => {
                self.facing = self.facing.rotate_left45();
                ActionRequest::RotateLeft45
            }
            -2 | -3 => {
                self.facing = self.facing.rotate_left90();
                ActionRequest::RotateLeft90
            }
            _ => {
                self.facing = self.facing.rotate_right90();
                ActionRequest::RotateRight90
            }
        }
    }

    fn follow_path(&mut self, pos: Point) -> ActionRequest {
        while self.path.first() == Some(&pos) {
            self.path.remove(0);
        }
        let Some(&next) = self.path.first() else {
            // No route to any enemy: scan.
            self.facing = self.facing.rotate_right45();
            return ActionRequest::RotateRight45;
        };
        let toward = Direction::ALL
            .into_iter()
            .find(|&d| self.step(pos, d) == Some(next));
        let Some(toward) = toward else {
            // Stale path (waypoint no longer adjacent); drop it and scan.
            self.path.clear();
            self.facing = self.facing.rotate_right45();
            return ActionRequest::RotateRight45;
        };
        if toward == self.facing {
            if self.is_enemy(self.glyph_at(next)) {
                // Never drive into the target; wait for the gun instead.
                return ActionRequest::DoNothing;
            }
            self.path.remove(0);
            self.position = Some(next);
            ActionRequest::MoveForward
        } else {
            self.rotate_toward(toward)
        }
    }

    fn evade(&mut self, pos: Point) -> ActionRequest {
        if let Some(ahead) = self.step(pos, self.facing) {
            if self.is_passable(ahead) && self.glyph_at(ahead) != crate::board::SHELL_GLYPH {
                self.position = Some(ahead);
                return ActionRequest::MoveForward;
            }
        }
        self.facing = self.facing.rotate_right45();
        ActionRequest::RotateRight45
    }
}

impl TankStrategy for OffensiveStrategy {
    fn get_action(&mut self) -> ActionRequest {
        self.turn += 1;
        if self.cooldown > 0 {
            self.cooldown -= 1;
        }

        if self.info.is_none() || self.mode_changed || self.turn % INFO_REFRESH_TURNS == 0 {
            self.mode_changed = false;
            return ActionRequest::GetBattleInfo;
        }
        let Some(pos) = self.position else {
            return ActionRequest::GetBattleInfo;
        };

        let panicking = self.shell_nearby(pos);
        let mode = if panicking { Mode::Panic } else { Mode::Regular };
        if mode != self.mode {
            self.mode = mode;
            self.mode_changed = true;
        }

        if self.mode == Mode::Panic {
            return self.evade(pos);
        }
        if self.cooldown == 0 && self.enemy_in_line_of_fire(pos) {
            self.cooldown = SHOT_COOLDOWN;
            return ActionRequest::Shoot;
        }
        self.follow_path(pos)
    }

    fn update_battle_info(&mut self, info: &BattleInfo) {
        self.position = info.own_position();
        self.info = Some(info.clone());
        if let Some(pos) = self.position {
            self.recompute_path(pos);
            self.mode = if self.shell_nearby(pos) { Mode::Panic } else { Mode::Regular };
        }
    }
}
