//! Path queries and a grid navigation mesh

use crate::error::{AiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BinaryHeap, HashMap, HashSet};
use vigil_math::{Aabb, Vec3};
use vigil_physics::{CollisionLayer, CollisionQuery, LayerMask, QueryFilter};

/// Black-box path service
pub trait PathQuery {
    /// Corners from `from` to `to`, starting with `from`. `None` when `to`
    /// cannot be reached.
    fn query(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>>;
}

/// Walkable grid on the ground plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavGrid {
    /// World position of the corner of cell (0, 0)
    origin: Vec3,
    cell_size: f32,
    cols: usize,
    rows: usize,
    walkable: Vec<bool>,
}

impl NavGrid {
    /// Create a fully walkable grid covering `width` x `depth` from `origin`
    pub fn new(origin: Vec3, width: f32, depth: f32, cell_size: f32) -> Result<Self> {
        if cell_size <= 0.0 || width <= 0.0 || depth <= 0.0 {
            return Err(AiError::InvalidNavGrid(format!(
                "width {width}, depth {depth} and cell size {cell_size} must be positive"
            )));
        }
        let cols = (width / cell_size).ceil() as usize;
        let rows = (depth / cell_size).ceil() as usize;
        Ok(Self {
            origin,
            cell_size,
            cols,
            rows,
            walkable: vec![true; cols * rows],
        })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell containing a world position
    pub fn cell_at(&self, point: Vec3) -> Option<(usize, usize)> {
        let local = point - self.origin;
        let col = (local.x / self.cell_size).floor();
        let row = (local.z / self.cell_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f32 || row >= self.rows as f32 {
            return None;
        }
        Some((col as usize, row as usize))
    }

    /// World position of a cell center at the grid height
    pub fn cell_center(&self, col: usize, row: usize) -> Vec3 {
        self.origin
            + Vec3::new(
                (col as f32 + 0.5) * self.cell_size,
                0.0,
                (row as f32 + 0.5) * self.cell_size,
            )
    }

    pub fn is_walkable(&self, col: usize, row: usize) -> bool {
        col < self.cols && row < self.rows && self.walkable[row * self.cols + col]
    }

    pub fn set_walkable(&mut self, col: usize, row: usize, walkable: bool) {
        if col < self.cols && row < self.rows {
            self.walkable[row * self.cols + col] = walkable;
        }
    }

    /// Mark every cell whose column overlaps `bounds` as blocked
    pub fn block_region(&mut self, bounds: &Aabb) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                if bounds.intersects(&self.cell_column(col, row, bounds.min.y, bounds.max.y)) {
                    self.set_walkable(col, row, false);
                }
            }
        }
    }

    /// Block cells where level geometry fills the space between `clearance_min`
    /// and `clearance_max` above the grid
    pub fn bake_obstacles(&mut self, world: &dyn CollisionQuery, clearance_min: f32, clearance_max: f32) {
        let filter = QueryFilter::new(LayerMask::from_layers(&[CollisionLayer::ENVIRONMENT]));
        let mut blocked = 0;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let column = self.cell_column(
                    col,
                    row,
                    self.origin.y + clearance_min,
                    self.origin.y + clearance_max,
                );
                if !world.overlap_aabb(&column, &filter).is_empty() {
                    self.set_walkable(col, row, false);
                    blocked += 1;
                }
            }
        }
        log::debug!("Nav grid baked, {} of {} cells blocked", blocked, self.cols * self.rows);
    }

    fn cell_column(&self, col: usize, row: usize, min_y: f32, max_y: f32) -> Aabb {
        let min = self.origin + Vec3::new(col as f32 * self.cell_size, 0.0, row as f32 * self.cell_size);
        Aabb::new(
            min.with_y(min_y),
            Vec3::new(min.x + self.cell_size, max_y, min.z + self.cell_size),
        )
    }

    /// Walkable cells around `(col, row)` with the cost of stepping there.
    /// Diagonal steps need both orthogonal cells they pass between to be open.
    fn neighbors(&self, col: usize, row: usize) -> impl Iterator<Item = ((usize, usize), f32)> + '_ {
        const OFFSETS: [(i64, i64); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (-1, 1),
            (1, -1),
            (1, 1),
        ];
        let open = move |c: i64, r: i64| c >= 0 && r >= 0 && self.is_walkable(c as usize, r as usize);
        let (col, row) = (col as i64, row as i64);
        OFFSETS.into_iter().filter_map(move |(dc, dr)| {
            let (c, r) = (col + dc, row + dr);
            if !open(c, r) {
                return None;
            }
            if dc != 0 && dr != 0 {
                if !open(col + dc, row) || !open(col, row + dr) {
                    return None;
                }
                return Some(((c as usize, r as usize), self.cell_size * std::f32::consts::SQRT_2));
            }
            Some(((c as usize, r as usize), self.cell_size))
        })
    }

    /// A* over walkable cells
    fn astar(&self, start: (usize, usize), goal: (usize, usize)) -> Option<Vec<(usize, usize)>> {
        #[derive(Clone, Copy)]
        struct Node {
            cell: (usize, usize),
            f_score: f32,
        }

        impl PartialEq for Node {
            fn eq(&self, other: &Self) -> bool {
                self.cell == other.cell
            }
        }

        impl Eq for Node {}

        impl PartialOrd for Node {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for Node {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                other.f_score.total_cmp(&self.f_score)
            }
        }

        // Octile distance
        let heuristic = |cell: (usize, usize)| {
            let dx = cell.0.abs_diff(goal.0) as f32;
            let dz = cell.1.abs_diff(goal.1) as f32;
            (dx.max(dz) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dz)) * self.cell_size
        };

        let mut open_set = BinaryHeap::new();
        let mut came_from = HashMap::new();
        let mut g_score: HashMap<(usize, usize), f32> = HashMap::new();
        let mut closed_set = HashSet::new();

        g_score.insert(start, 0.0);
        open_set.push(Node { cell: start, f_score: heuristic(start) });

        while let Some(current) = open_set.pop() {
            if current.cell == goal {
                let mut path = vec![goal];
                let mut cell = goal;
                while let Some(&prev) = came_from.get(&cell) {
                    path.push(prev);
                    cell = prev;
                }
                path.reverse();
                return Some(path);
            }

            if !closed_set.insert(current.cell) {
                continue;
            }

            let current_g = g_score.get(&current.cell).copied().unwrap_or(f32::MAX);
            for (neighbor, cost) in self.neighbors(current.cell.0, current.cell.1) {
                if closed_set.contains(&neighbor) {
                    continue;
                }
                let tentative_g = current_g + cost;
                if tentative_g < g_score.get(&neighbor).copied().unwrap_or(f32::MAX) {
                    came_from.insert(neighbor, current.cell);
                    g_score.insert(neighbor, tentative_g);
                    open_set.push(Node {
                        cell: neighbor,
                        f_score: tentative_g + heuristic(neighbor),
                    });
                }
            }
        }

        None
    }
}

impl PathQuery for NavGrid {
    fn query(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
        let start = self.cell_at(from)?;
        let goal = self.cell_at(to)?;
        if !self.is_walkable(goal.0, goal.1) {
            return None;
        }
        if start == goal {
            return Some(vec![from, to]);
        }

        let cells = self.astar(start, goal)?;

        // Keep only the cells where the heading changes
        let mut corners = vec![from];
        for window in cells.windows(3) {
            let (a, b, c) = (window[0], window[1], window[2]);
            let first = (b.0 as i64 - a.0 as i64, b.1 as i64 - a.1 as i64);
            let second = (c.0 as i64 - b.0 as i64, c.1 as i64 - b.1 as i64);
            if first != second {
                corners.push(self.cell_center(b.0, b.1).with_y(from.y));
            }
        }
        corners.push(to);
        Some(corners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> NavGrid {
        NavGrid::new(Vec3::ZERO, 10.0, 10.0, 1.0).unwrap()
    }

    #[test]
    fn test_straight_path_has_two_corners() {
        let path = grid().query(Vec3::new(0.5, 0.0, 0.5), Vec3::new(0.5, 0.0, 8.5)).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[1], Vec3::new(0.5, 0.0, 8.5));
    }

    #[test]
    fn test_path_bends_around_wall() {
        let mut grid = grid();
        grid.block_region(&Aabb::new(Vec3::new(0.0, 0.0, 4.0), Vec3::new(8.0, 2.0, 5.0)));
        let path = grid.query(Vec3::new(0.5, 0.0, 0.5), Vec3::new(0.5, 0.0, 8.5)).unwrap();
        assert!(path.len() > 2);
        // Every corner stays off the blocked row
        for corner in &path {
            let (col, row) = grid.cell_at(*corner).unwrap();
            assert!(row != 4 || col >= 8);
        }
    }

    #[test]
    fn test_unreachable_goal() {
        let mut grid = grid();
        grid.block_region(&Aabb::new(Vec3::new(0.0, 0.0, 4.0), Vec3::new(10.0, 2.0, 5.0)));
        assert!(grid.query(Vec3::new(0.5, 0.0, 0.5), Vec3::new(0.5, 0.0, 8.5)).is_none());
        assert!(grid.query(Vec3::new(0.5, 0.0, 0.5), Vec3::new(50.0, 0.0, 0.5)).is_none());
    }

    #[test]
    fn test_open_diagonal_is_a_single_leg() {
        let grid = grid();
        let path = grid.query(Vec3::new(0.5, 0.0, 0.5), Vec3::new(7.5, 0.0, 7.5)).unwrap();
        assert_eq!(path, vec![Vec3::new(0.5, 0.0, 0.5), Vec3::new(7.5, 0.0, 7.5)]);

        let cells = grid.astar((0, 0), (7, 7)).unwrap();
        assert_eq!(cells.len(), 8);
    }

    #[test]
    fn test_diagonal_step_costs_root_two() {
        let grid = grid();
        let steps: Vec<_> = grid.neighbors(5, 5).collect();
        assert_eq!(steps.len(), 8);
        for ((col, row), cost) in steps {
            let expected = if col != 5 && row != 5 { std::f32::consts::SQRT_2 } else { 1.0 };
            assert_relative_eq!(cost, expected);
        }
        // Grid edge
        assert_eq!(grid.neighbors(0, 0).count(), 3);
    }

    #[test]
    fn test_diagonal_does_not_cut_corners() {
        let mut grid = grid();
        grid.set_walkable(1, 0, false);
        let steps: Vec<_> = grid.neighbors(0, 0).map(|(cell, _)| cell).collect();
        assert_eq!(steps, vec![(0, 1)]);

        // Has to go around the blocked cell instead of squeezing past its corner
        let cells = grid.astar((0, 0), (2, 1)).unwrap();
        assert!(cells.contains(&(0, 1)) || cells.contains(&(1, 1)));
        for pair in cells.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.0 != b.0 && a.1 != b.1 {
                assert!(grid.is_walkable(b.0, a.1) && grid.is_walkable(a.0, b.1));
            }
        }
    }

    #[test]
    fn test_invalid_grid() {
        assert!(NavGrid::new(Vec3::ZERO, 10.0, 10.0, 0.0).is_err());
    }
}
