//! Toroidal board geometry, cell glyphs and satellite views

use serde::{Deserialize, Serialize};

/// Default number of rounds all tanks may sit on empty magazines before the
/// match is called.
pub const DEFAULT_ZERO_SHELL_STEPS: usize = 40;

// ============================================================================
// GLYPHS
// ============================================================================

/// Glyph rendered for the tank that requested a satellite view
pub const OWN_TANK_GLYPH: char = '%';

/// Glyph rendered for a shell in flight
pub const SHELL_GLYPH: char = '*';

/// Static terrain occupying a single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Wall,
    /// Wall that has absorbed one shell; the next hit clears it
    DamagedWall,
    Mine,
}

impl Cell {
    /// Character used in map files and board snapshots
    pub fn glyph(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Wall => '#',
            Cell::DamagedWall => '=',
            Cell::Mine => '@',
        }
    }

    /// Parse a terrain glyph (tanks and shells are entities, not terrain)
    pub fn from_glyph(c: char) -> Option<Cell> {
        match c {
            ' ' => Some(Cell::Empty),
            '#' => Some(Cell::Wall),
            '=' => Some(Cell::DamagedWall),
            '@' => Some(Cell::Mine),
            _ => None,
        }
    }
}

/// Player id for a tank glyph (`'1'..='9'`)
pub fn tank_player_from_glyph(c: char) -> Option<u8> {
    c.to_digit(10).filter(|&d| d >= 1).map(|d| d as u8)
}

// ============================================================================
// DIRECTIONS
// ============================================================================

/// Eight compass directions as unit displacements.
///
/// The y axis grows downwards (row-major boards), so `Up` is `(0, -1)` and a
/// 90-degree right turn maps `(dx, dy)` to `(-dy, dx)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
}

impl Direction {
    /// All directions in clockwise compass order
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::UpRight,
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::DownLeft,
        Direction::Left,
        Direction::UpLeft,
    ];

    /// Unit displacement `(dx, dy)`
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::UpRight => (1, -1),
            Direction::Right => (1, 0),
            Direction::DownRight => (1, 1),
            Direction::Down => (0, 1),
            Direction::DownLeft => (-1, 1),
            Direction::Left => (-1, 0),
            Direction::UpLeft => (-1, -1),
        }
    }

    /// Direction for a unit displacement
    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        Direction::ALL.iter().copied().find(|d| d.delta() == (dx, dy))
    }

    /// Rotate clockwise by `steps * 45` degrees (negative = counterclockwise)
    pub fn rotated(self, steps: i8) -> Direction {
        let idx = (self as i8 + steps).rem_euclid(8) as usize;
        Direction::ALL[idx]
    }

    pub fn rotate_right45(self) -> Direction {
        self.rotated(1)
    }

    pub fn rotate_left45(self) -> Direction {
        self.rotated(-1)
    }

    pub fn rotate_right90(self) -> Direction {
        self.rotated(2)
    }

    pub fn rotate_left90(self) -> Direction {
        self.rotated(-2)
    }

    pub fn opposite(self) -> Direction {
        self.rotated(4)
    }

    /// Signed 45-degree steps from `self` to `other`, in `-3..=4`
    /// (positive = clockwise)
    pub fn steps_to(self, other: Direction) -> i8 {
        let diff = (other as i8 - self as i8).rem_euclid(8);
        if diff > 4 {
            diff - 8
        } else {
            diff
        }
    }
}

// ============================================================================
// POINTS AND BOARDS
// ============================================================================

/// Cell coordinates, `0 <= x < W`, `0 <= y < H`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Terrain grid plus the per-match parameters carried by a map.
///
/// Tanks and shells are entities owned by the engine; the board only ever
/// stores static terrain. Edges wrap in both axes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    name: String,
    width: usize,
    height: usize,
    max_steps: usize,
    num_shells: usize,
    zero_shell_steps: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Create an all-empty board
    pub fn new(name: &str, width: usize, height: usize, max_steps: usize, num_shells: usize) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            max_steps,
            num_shells,
            zero_shell_steps: DEFAULT_ZERO_SHELL_STEPS,
            cells: vec![Cell::Empty; width * height],
        }
    }

    /// Override the zero-shell countdown threshold (maps may configure it)
    pub fn with_zero_shell_steps(mut self, steps: usize) -> Self {
        self.zero_shell_steps = steps;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn num_shells(&self) -> usize {
        self.num_shells
    }

    pub fn zero_shell_steps(&self) -> usize {
        self.zero_shell_steps
    }

    pub fn cell(&self, p: Point) -> Cell {
        self.cells[p.y * self.width + p.x]
    }

    pub fn set_cell(&mut self, p: Point, cell: Cell) {
        self.cells[p.y * self.width + p.x] = cell;
    }

    /// Toroidal step: `((x + dx + W) mod W, (y + dy + H) mod H)`
    pub fn step(&self, p: Point, dir: Direction) -> Point {
        let (dx, dy) = dir.delta();
        Point {
            x: (p.x as i32 + dx).rem_euclid(self.width as i32) as usize,
            y: (p.y as i32 + dy).rem_euclid(self.height as i32) as usize,
        }
    }

    /// Render the terrain as text, one row per line
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(self.cell(Point::new(x, y)).glyph());
            }
            if y + 1 < self.height {
                out.push('\n');
            }
        }
        out
    }
}

// ============================================================================
// SATELLITE VIEWS
// ============================================================================

/// Read-only snapshot of the board handed to players and strategies
pub trait SatelliteView {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Glyph at `(x, y)`; out-of-range reads return a wall
    fn object_at(&self, x: usize, y: usize) -> char;
}

/// Concrete satellite view over a rendered character grid.
///
/// The engine renders one of these per `GetBattleInfo` request, marking the
/// requesting tank with [`OWN_TANK_GLYPH`] so multi-tank players can tell
/// their tanks apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardView {
    grid: Vec<Vec<char>>,
}

impl BoardView {
    pub fn new(grid: Vec<Vec<char>>) -> Self {
        Self { grid }
    }

    /// Clone of `self` with the requesting tank marked
    pub fn with_marker(&self, pos: Point) -> Self {
        let mut grid = self.grid.clone();
        grid[pos.y][pos.x] = OWN_TANK_GLYPH;
        Self { grid }
    }

    /// Parse a snapshot; unrecognized glyphs canonicalize to empty
    pub fn parse(text: &str) -> Self {
        const KNOWN: &[char] = &[' ', '#', '=', '@', '*', '%'];
        let grid = text
            .lines()
            .map(|line| {
                line.chars()
                    .map(|c| {
                        if KNOWN.contains(&c) || tank_player_from_glyph(c).is_some() {
                            c
                        } else {
                            ' '
                        }
                    })
                    .collect()
            })
            .collect();
        Self { grid }
    }

    pub fn to_text(&self) -> String {
        self.grid
            .iter()
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl SatelliteView for BoardView {
    fn width(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    fn height(&self) -> usize {
        self.grid.len()
    }

    fn object_at(&self, x: usize, y: usize) -> char {
        self.grid
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or('#')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toroidal_step_wraps() {
        let board = Board::new("t", 5, 3, 100, 10);
        assert_eq!(board.step(Point::new(4, 0), Direction::Right), Point::new(0, 0));
        assert_eq!(board.step(Point::new(0, 0), Direction::Left), Point::new(4, 0));
        assert_eq!(board.step(Point::new(0, 0), Direction::Up), Point::new(0, 2));
        assert_eq!(board.step(Point::new(2, 2), Direction::DownRight), Point::new(3, 0));
    }

    #[test]
    fn test_rotation_table() {
        // right90 maps (dx, dy) -> (-dy, dx)
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            assert_eq!(dir.rotate_right90().delta(), (-dy, dx));
        }
        assert_eq!(Direction::Up.rotate_right45(), Direction::UpRight);
        assert_eq!(Direction::Up.rotate_left45(), Direction::UpLeft);
        assert_eq!(Direction::Left.rotate_left90(), Direction::Down);
        assert_eq!(Direction::Right.opposite(), Direction::Left);
    }

    #[test]
    fn test_rotation_inverses() {
        for dir in Direction::ALL {
            assert_eq!(dir.rotate_right45().rotate_left45(), dir);
            assert_eq!(dir.rotate_right90().rotate_left90(), dir);
        }
    }

    #[test]
    fn test_steps_to() {
        assert_eq!(Direction::Up.steps_to(Direction::UpRight), 1);
        assert_eq!(Direction::Up.steps_to(Direction::UpLeft), -1);
        assert_eq!(Direction::Up.steps_to(Direction::Down), 4);
        assert_eq!(Direction::Right.steps_to(Direction::Up), -2);
    }

    #[test]
    fn test_cell_glyph_round_trip() {
        for cell in [Cell::Empty, Cell::Wall, Cell::DamagedWall, Cell::Mine] {
            assert_eq!(Cell::from_glyph(cell.glyph()), Some(cell));
        }
        assert_eq!(Cell::from_glyph('?'), None);
    }

    #[test]
    fn test_tank_glyphs() {
        assert_eq!(tank_player_from_glyph('1'), Some(1));
        assert_eq!(tank_player_from_glyph('9'), Some(9));
        assert_eq!(tank_player_from_glyph('0'), None);
        assert_eq!(tank_player_from_glyph('#'), None);
    }

    #[test]
    fn test_board_to_text() {
        let mut board = Board::new("t", 3, 2, 10, 1);
        board.set_cell(Point::new(0, 0), Cell::Wall);
        board.set_cell(Point::new(2, 1), Cell::Mine);
        assert_eq!(board.to_text(), "#  \n  @");
    }

    #[test]
    fn test_board_view_round_trip() {
        let text = "# =@\n12*%\n####";
        let view = BoardView::parse(text);
        assert_eq!(view.to_text(), text);
        assert_eq!(view.object_at(2, 1), '*');
        // Out of range reads as wall
        assert_eq!(view.object_at(99, 0), '#');
    }

    #[test]
    fn test_board_view_canonicalizes_unknown() {
        let view = BoardView::parse("a#b");
        assert_eq!(view.to_text(), " # ");
    }
}
