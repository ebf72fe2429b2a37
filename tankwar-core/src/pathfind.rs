//! Breadth-first path-finding over the 8-connected toroidal grid

use std::collections::VecDeque;

use crate::board::{Direction, Point};

/// Shortest path from `start` to the nearest goal cell.
///
/// Returns the cells to visit in order, ending on the goal and excluding
/// `start`; `None` when no goal is reachable. `passable` decides which cells
/// may be entered (goals are exempt so a blocked target can still terminate
/// the search). Neighbor expansion follows compass order, which keeps the
/// result deterministic.
pub fn shortest_path(
    width: usize,
    height: usize,
    passable: impl Fn(Point) -> bool,
    start: Point,
    is_goal: impl Fn(Point) -> bool,
) -> Option<Vec<Point>> {
    if width == 0 || height == 0 {
        return None;
    }
    if is_goal(start) {
        return Some(Vec::new());
    }

    let index = |p: Point| p.y * width + p.x;
    let mut parent: Vec<Option<Point>> = vec![None; width * height];
    let mut visited = vec![false; width * height];
    let mut queue = VecDeque::new();

    visited[index(start)] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            let next = Point {
                x: (current.x as i32 + dx).rem_euclid(width as i32) as usize,
                y: (current.y as i32 + dy).rem_euclid(height as i32) as usize,
            };
            if visited[index(next)] {
                continue;
            }
            if is_goal(next) {
                let mut path = vec![next, current];
                let mut cursor = current;
                while let Some(prev) = parent[index(cursor)] {
                    path.push(prev);
                    cursor = prev;
                }
                path.pop(); // drop `start`
                path.reverse();
                return Some(path);
            }
            if !passable(next) {
                continue;
            }
            visited[index(next)] = true;
            parent[index(next)] = Some(current);
            queue.push_back(next);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> (usize, usize, Vec<Vec<char>>) {
        let cells: Vec<Vec<char>> = rows.iter().map(|r| r.chars().collect()).collect();
        (cells[0].len(), cells.len(), cells)
    }

    fn find(rows: &[&str], start: Point, goal_glyph: char) -> Option<Vec<Point>> {
        let (w, h, cells) = grid(rows);
        shortest_path(
            w,
            h,
            |p| cells[p.y][p.x] != '#',
            start,
            |p| cells[p.y][p.x] == goal_glyph,
        )
    }

    #[test]
    fn test_straight_line() {
        let path = find(&["S G  "], Point::new(0, 0), 'G').unwrap();
        assert_eq!(path, vec![Point::new(1, 0), Point::new(2, 0)]);
    }

    #[test]
    fn test_wraps_around_edges() {
        // Going left off the board is one step; going right would be three.
        let path = find(&["S##G "], Point::new(0, 0), 'G').unwrap();
        assert_eq!(path, vec![Point::new(4, 0), Point::new(3, 0)]);
    }

    #[test]
    fn test_diagonal_shortcut() {
        let rows = ["S    ", "     ", "  G  ", "     ", "     "];
        let path = find(&rows, Point::new(0, 0), 'G').unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.last(), Some(&Point::new(2, 2)));
    }

    #[test]
    fn test_walls_block() {
        let rows = ["#####", "#S#G#", "#####"];
        assert_eq!(find(&rows, Point::new(1, 1), 'G'), None);
    }

    #[test]
    fn test_goal_cell_may_be_blocked() {
        // The goal itself does not need to be passable.
        let (w, h, cells) = grid(&["S 2"]);
        let path = shortest_path(
            w,
            h,
            |p| cells[p.y][p.x] == ' ' || cells[p.y][p.x] == 'S',
            Point::new(0, 0),
            |p| cells[p.y][p.x] == '2',
        )
        .unwrap();
        assert_eq!(path.last(), Some(&Point::new(2, 0)));
    }

    #[test]
    fn test_start_on_goal() {
        let path = find(&["G"], Point::new(0, 0), 'G').unwrap();
        assert!(path.is_empty());
    }
}
