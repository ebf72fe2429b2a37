//! Evasive built-in strategy
//!
//! Survival first: stays away from shells and otherwise wanders. The wander
//! direction comes from a ChaCha8 stream seeded from the tank's identity, so
//! matches remain reproducible.

use std::sync::Arc;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::board::{Direction, Point, SHELL_GLYPH};
use crate::strategy::{ActionRequest, BattleInfo, TankFactory, TankStrategy};

/// Fresh battle info is requested every this many turns
const INFO_REFRESH_TURNS: usize = 4;

/// Shells closer than this (Chebyshev, wrapped) are dodged
const DANGER_RADIUS: i32 = 2;

pub struct EvasiveStrategy {
    facing: Direction,
    position: Option<Point>,
    info: Option<BattleInfo>,
    turn: usize,
    rng: ChaCha8Rng,
}

impl EvasiveStrategy {
    pub fn new(player: u8, tank_index: usize) -> Self {
        let facing = if player == 1 { Direction::Left } else { Direction::Right };
        Self {
            facing,
            position: None,
            info: None,
            turn: 0,
            rng: ChaCha8Rng::seed_from_u64(((player as u64) << 32) ^ tank_index as u64),
        }
    }

    pub fn factory() -> TankFactory {
        Arc::new(|player, tank_index| Box::new(EvasiveStrategy::new(player, tank_index)))
    }

    fn glyph_at(&self, p: Point) -> char {
        match &self.info {
            Some(info) => info.object_at(p.x, p.y),
            None => '#',
        }
    }

    fn step(&self, p: Point, dir: Direction) -> Option<Point> {
        let info = self.info.as_ref()?;
        let (dx, dy) = dir.delta();
        Some(Point {
            x: (p.x as i32 + dx).rem_euclid(info.width() as i32) as usize,
            y: (p.y as i32 + dy).rem_euclid(info.height() as i32) as usize,
        })
    }

    fn open_for_travel(&self, p: Point) -> bool {
        self.glyph_at(p) == ' '
    }

    fn shell_nearby(&self, pos: Point) -> bool {
        let Some(info) = &self.info else { return false };
        let (w, h) = (info.width() as i32, info.height() as i32);
        for y in 0..h {
            for x in 0..w {
                if info.object_at(x as usize, y as usize) != SHELL_GLYPH {
                    continue;
                }
                let dx = (x - pos.x as i32).rem_euclid(w).min((pos.x as i32 - x).rem_euclid(w));
                let dy = (y - pos.y as i32).rem_euclid(h).min((pos.y as i32 - y).rem_euclid(h));
                if dx.max(dy) <= DANGER_RADIUS {
                    return true;
                }
            }
        }
        false
    }

    fn advance(&mut self, pos: Point) -> ActionRequest {
        if let Some(ahead) = self.step(pos, self.facing) {
            if self.open_for_travel(ahead) {
                self.position = Some(ahead);
                return ActionRequest::MoveForward;
            }
        }
        self.facing = self.facing.rotate_right45();
        ActionRequest::RotateRight45
    }
}

impl TankStrategy for EvasiveStrategy {
    fn get_action(&mut self) -> ActionRequest {
        self.turn += 1;
        if self.info.is_none() || self.turn % INFO_REFRESH_TURNS == 0 {
            return ActionRequest::GetBattleInfo;
        }
        let Some(pos) = self.position else {
            return ActionRequest::GetBattleInfo;
        };

        if self.shell_nearby(pos) {
            // Sidestep: leave the shell's lane rather than outrun it.
            return self.advance(pos);
        }

        // Wander: occasional random turn keeps patrol routes from looping.
        match self.rng.gen_range(0..4) {
            0 => {
                self.facing = self.facing.rotate_left45();
                ActionRequest::RotateLeft45
            }
            1 => {
                self.facing = self.facing.rotate_right45();
                ActionRequest::RotateRight45
            }
            _ => self.advance(pos),
        }
    }

    fn update_battle_info(&mut self, info: &BattleInfo) {
        self.position = info.own_position();
        self.info = Some(info.clone());
    }
}
