//! Strategy and player contracts
//!
//! A strategy drives a single tank: the engine asks it for one action per
//! round and, when the action is [`ActionRequest::GetBattleInfo`], routes a
//! fresh satellite view through the owning player object back to it. The
//! player object is the per-side mediator; it decides what a tank gets to
//! see of the snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::board::{Point, SatelliteView, OWN_TANK_GLYPH};

/// Everything a tank may ask for in one round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionRequest {
    MoveForward,
    MoveBackward,
    RotateLeft45,
    RotateRight45,
    RotateLeft90,
    RotateRight90,
    Shoot,
    GetBattleInfo,
    DoNothing,
}

/// Board snapshot delivered to a strategy after a `GetBattleInfo` request.
///
/// Carries the full glyph grid, the receiving strategy's player id, and the
/// position of its own tank (located via the [`OWN_TANK_GLYPH`] marker the
/// engine places in the view).
#[derive(Clone, Debug)]
pub struct BattleInfo {
    grid: Vec<Vec<char>>,
    width: usize,
    height: usize,
    player: u8,
    own_position: Option<Point>,
}

impl BattleInfo {
    /// Build from a satellite view, locating the own-tank marker
    pub fn from_view(view: &dyn SatelliteView, player: u8) -> Self {
        let width = view.width();
        let height = view.height();
        let mut own_position = None;
        let mut grid = Vec::with_capacity(height);
        for y in 0..height {
            let mut row = Vec::with_capacity(width);
            for x in 0..width {
                let c = view.object_at(x, y);
                if c == OWN_TANK_GLYPH {
                    own_position = Some(Point::new(x, y));
                }
                row.push(c);
            }
            grid.push(row);
        }
        Self {
            grid,
            width,
            height,
            player,
            own_position,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn player(&self) -> u8 {
        self.player
    }

    pub fn own_position(&self) -> Option<Point> {
        self.own_position
    }

    pub fn object_at(&self, x: usize, y: usize) -> char {
        self.grid
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or('#')
    }
}

/// Per-tank decision maker
pub trait TankStrategy: Send {
    /// Pure function of the strategy's internal state
    fn get_action(&mut self) -> ActionRequest;

    /// Called when the engine fulfills a `GetBattleInfo` request
    fn update_battle_info(&mut self, info: &BattleInfo);
}

/// Per-side coordinator mediating satellite-view delivery to its tanks
pub trait Player: Send {
    fn update_tank_with_battle_info(&mut self, tank: &mut dyn TankStrategy, view: &dyn SatelliteView);
}

/// Default player: packages the satellite view into a [`BattleInfo`] and
/// relays it unchanged.
pub struct GamePlayer {
    player: u8,
}

impl GamePlayer {
    pub fn new(player: u8, _width: usize, _height: usize, _max_steps: usize, _num_shells: usize) -> Self {
        Self { player }
    }
}

impl Player for GamePlayer {
    fn update_tank_with_battle_info(&mut self, tank: &mut dyn TankStrategy, view: &dyn SatelliteView) {
        let info = BattleInfo::from_view(view, self.player);
        tank.update_battle_info(&info);
    }
}

/// Creates the strategy for the tank `(player_id, tank_index)`
pub type TankFactory = Arc<dyn Fn(u8, usize) -> Box<dyn TankStrategy> + Send + Sync>;

/// Creates a player object from
/// `(player_id, board_width, board_height, max_steps, num_shells)`
pub type PlayerFactory = Arc<dyn Fn(u8, usize, usize, usize, usize) -> Box<dyn Player> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardView;

    #[test]
    fn test_battle_info_locates_marker() {
        let view = BoardView::parse("#  \n %2\n1  ");
        let info = BattleInfo::from_view(&view, 1);
        assert_eq!(info.own_position(), Some(Point::new(1, 1)));
        assert_eq!(info.object_at(0, 0), '#');
        assert_eq!(info.object_at(2, 1), '2');
        assert_eq!(info.player(), 1);
    }

    #[test]
    fn test_battle_info_without_marker() {
        let view = BoardView::parse("  \n  ");
        let info = BattleInfo::from_view(&view, 2);
        assert_eq!(info.own_position(), None);
    }

    #[test]
    fn test_game_player_relays_info() {
        struct Recorder {
            seen: Option<(u8, Option<Point>)>,
        }
        impl TankStrategy for Recorder {
            fn get_action(&mut self) -> ActionRequest {
                ActionRequest::DoNothing
            }
            fn update_battle_info(&mut self, info: &BattleInfo) {
                self.seen = Some((info.player(), info.own_position()));
            }
        }

        let view = BoardView::parse(" % \n   ");
        let mut player = GamePlayer::new(2, 3, 2, 100, 10);
        let mut tank = Recorder { seen: None };
        player.update_tank_with_battle_info(&mut tank, &view);
        assert_eq!(tank.seen, Some((2, Some(Point::new(1, 0)))));
    }
}
