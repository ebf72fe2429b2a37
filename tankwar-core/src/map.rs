//! Map file reading
//!
//! Plain-text format: the first line names the map, followed by header lines
//! `MaxSteps = <n>`, `NumShells = <n>`, `Rows = <n>`, `Cols = <n>` (any
//! spacing around the `=`), then `Rows` lines of terrain. An optional
//! `ZeroShellSteps = <n>` header overrides the empty-magazine countdown.
//! Short body lines are padded with empty cells, long ones truncated, and
//! unrecognized glyphs read as empty.

use std::path::Path;

use thiserror::Error;

use crate::board::{tank_player_from_glyph, Board, BoardView, Cell, Point, DEFAULT_ZERO_SHELL_STEPS};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing header line: {0}")]
    MissingHeader(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("map has zero rows or columns")]
    ZeroDimension,
}

/// A parsed map: terrain board plus tank spawn cells in scan order
#[derive(Clone, Debug)]
pub struct MapData {
    pub board: Board,
    /// `(cell, player_id)` in row-major scan order
    pub spawns: Vec<(Point, u8)>,
}

impl MapData {
    /// Initial satellite view handed to the engine: terrain with tank
    /// glyphs overlaid.
    pub fn view(&self) -> BoardView {
        let mut grid: Vec<Vec<char>> = (0..self.board.height())
            .map(|y| {
                (0..self.board.width())
                    .map(|x| self.board.cell(Point::new(x, y)).glyph())
                    .collect()
            })
            .collect();
        for &(pos, player) in &self.spawns {
            grid[pos.y][pos.x] = (b'0' + player) as char;
        }
        BoardView::new(grid)
    }
}

/// Read and parse a map file; the board keeps the file stem as its name
pub fn read_map(path: &Path) -> Result<MapData, MapError> {
    let text = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    parse_map(&name, &text)
}

/// Parse map text. `name` is used only if the text's first line is empty.
pub fn parse_map(name: &str, text: &str) -> Result<MapData, MapError> {
    let mut lines = text.lines();

    let title = lines.next().unwrap_or("").trim();
    let display_name = if title.is_empty() { name } else { title };

    // Header lines in fixed order, tolerant about spacing.
    let max_steps = parse_header(lines.next(), "MaxSteps")?;
    let num_shells = parse_header(lines.next(), "NumShells")?;
    let rows = parse_header(lines.next(), "Rows")?;
    let cols = parse_header(lines.next(), "Cols")?;
    if rows == 0 || cols == 0 {
        return Err(MapError::ZeroDimension);
    }

    // Peek for the optional countdown override before the body starts.
    let mut body: Vec<&str> = lines.collect();
    let mut zero_shell_steps = DEFAULT_ZERO_SHELL_STEPS;
    if let Some(first) = body.first().copied() {
        if let Some(("ZeroShellSteps", value)) = split_header(first) {
            zero_shell_steps = value.parse().map_err(|_| MapError::InvalidValue {
                key: "ZeroShellSteps",
                value: value.to_string(),
            })?;
            body.remove(0);
        }
    }

    let mut board = Board::new(display_name, cols, rows, max_steps, num_shells)
        .with_zero_shell_steps(zero_shell_steps);
    let mut spawns = Vec::new();

    for y in 0..rows {
        let line = body.get(y).copied().unwrap_or("");
        for x in 0..cols {
            let glyph = line.chars().nth(x).unwrap_or(' ');
            let pos = Point::new(x, y);
            if let Some(cell) = Cell::from_glyph(glyph) {
                board.set_cell(pos, cell);
            } else if let Some(player) = tank_player_from_glyph(glyph) {
                spawns.push((pos, player));
            } else {
                tracing::warn!(glyph = %glyph, x, y, "unrecognized map glyph read as empty");
            }
        }
    }

    Ok(MapData { board, spawns })
}

fn split_header(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    Some((key.trim(), value.trim()))
}

fn parse_header(line: Option<&str>, key: &'static str) -> Result<usize, MapError> {
    let line = line.ok_or(MapError::MissingHeader(key))?;
    let (found_key, value) = split_header(line).ok_or(MapError::MissingHeader(key))?;
    if found_key != key {
        return Err(MapError::MissingHeader(key));
    }
    value.parse().map_err(|_| MapError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
