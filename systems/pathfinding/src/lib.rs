#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized weighted route search over the terrain grid.
//!
//! Routes are computed with a Dijkstra search over 4-directional adjacency.
//! Terrain weights are inverted against [`ROAD_WEIGHT`] so that heavier cells
//! are cheaper to cross, and every relaxation adds a small random noise term.
//! Neighbour visitation order is shuffled for each expanded cell, which makes
//! equal-cost alternatives resolve differently from run to run. All
//! randomness flows from the [`PathFinder`]'s own seeded generator.

use std::{cmp::Reverse, collections::BinaryHeap};

use castle_defence_core::{
    CellCoord, ConfigError, Grid, Route, CASTLE_WEIGHT, ROAD_WEIGHT, SPAWN_WEIGHT,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Largest noise term added to a single edge cost.
pub const PATH_NOISE: u32 = 2;
/// Smallest number of road cells a route may pass through before it is cut.
pub const ROUTE_ROAD_BUDGET_MIN: u32 = 60;
/// Largest number of road cells a route may pass through before it is cut.
pub const ROUTE_ROAD_BUDGET_MAX: u32 = 100;

/// Route planner owning the random generator used for noise and tie-breaks.
#[derive(Clone, Debug)]
pub struct PathFinder {
    rng: ChaCha8Rng,
}

impl PathFinder {
    /// Creates a path finder whose randomness is fully determined by `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Computes a route from `start` toward `goal`.
    ///
    /// Returns a single-cell route when both endpoints coincide and an empty
    /// route when no chain of nonzero-weight cells connects them. The route is
    /// cut after a randomly drawn number of [`ROAD_WEIGHT`] cells, so it may
    /// stop short of `goal`.
    ///
    /// # Panics
    ///
    /// Panics if `start` or `goal` lies outside the grid.
    pub fn find_path(&mut self, grid: &Grid, start: CellCoord, goal: CellCoord) -> Route {
        let Some(start_index) = grid.index(start) else {
            panic!("route start {start:?} lies outside the grid");
        };
        let Some(goal_index) = grid.index(goal) else {
            panic!("route goal {goal:?} lies outside the grid");
        };

        if start == goal {
            return Route::new(vec![start]);
        }

        let Some(previous) = self.search(grid, start_index, goal_index) else {
            debug!(?start, ?goal, "no route connects the endpoints");
            return Route::unreachable();
        };

        let full = reconstruct(grid, &previous, start_index, goal_index);
        let budget = self
            .rng
            .gen_range(ROUTE_ROAD_BUDGET_MIN..=ROUTE_ROAD_BUDGET_MAX);
        Route::new(trim_by_road_budget(grid, full, budget))
    }

    /// Picks a random spawn cell on the border of the grid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSpawnPoint`] when no edge cell carries
    /// [`SPAWN_WEIGHT`].
    pub fn find_random_spawn_point(&mut self, grid: &Grid) -> Result<CellCoord, ConfigError> {
        spawn_points(grid)
            .choose(&mut self.rng)
            .copied()
            .ok_or(ConfigError::MissingSpawnPoint)
    }

    /// Locates the castle cell enemies walk toward.
    ///
    /// The first cell in row-major order wins if several carry the marker.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCastle`] when no cell carries
    /// [`CASTLE_WEIGHT`].
    pub fn find_castle_point(grid: &Grid) -> Result<CellCoord, ConfigError> {
        grid.cells()
            .find(|&(_, weight)| weight == CASTLE_WEIGHT)
            .map(|(cell, _)| cell)
            .ok_or(ConfigError::MissingCastle)
    }

    fn search(&mut self, grid: &Grid, start: usize, goal: usize) -> Option<Vec<Option<usize>>> {
        let cell_count = grid.len();
        let mut costs = vec![u32::MAX; cell_count];
        let mut previous: Vec<Option<usize>> = vec![None; cell_count];
        let mut settled = vec![false; cell_count];
        let mut frontier = BinaryHeap::new();

        costs[start] = 0;
        frontier.push(Reverse((0u32, start)));

        while let Some(Reverse((cost, index))) = frontier.pop() {
            if settled[index] {
                continue;
            }
            settled[index] = true;

            if index == goal {
                return Some(previous);
            }

            let Some(cell) = grid.cell_at(index) else {
                continue;
            };

            let mut neighbors = Neighbors::around(cell, grid.columns(), grid.rows());
            neighbors.as_mut_slice().shuffle(&mut self.rng);

            for &neighbor in neighbors.as_mut_slice().iter() {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if settled[neighbor_index] {
                    continue;
                }

                let weight = grid.weight_at(neighbor_index).unwrap_or(0);
                if weight == 0 {
                    continue;
                }

                let noise = self.rng.gen_range(0..=PATH_NOISE);
                let step = ROAD_WEIGHT.saturating_sub(weight).saturating_add(noise);
                let candidate = cost.saturating_add(step);

                if candidate < costs[neighbor_index] {
                    costs[neighbor_index] = candidate;
                    previous[neighbor_index] = Some(index);
                    frontier.push(Reverse((candidate, neighbor_index)));
                }
            }
        }

        None
    }
}

/// Enumerates every border cell carrying [`SPAWN_WEIGHT`] in row-major order.
#[must_use]
pub fn spawn_points(grid: &Grid) -> Vec<CellCoord> {
    grid.cells()
        .filter(|&(cell, weight)| weight == SPAWN_WEIGHT && grid.is_edge(cell))
        .map(|(cell, _)| cell)
        .collect()
}

fn reconstruct(
    grid: &Grid,
    previous: &[Option<usize>],
    start: usize,
    goal: usize,
) -> Vec<CellCoord> {
    let mut chain = Vec::new();
    let mut cursor = Some(goal);

    while let Some(index) = cursor {
        if let Some(cell) = grid.cell_at(index) {
            chain.push(cell);
        }
        if index == start {
            break;
        }
        cursor = previous.get(index).copied().flatten();
    }

    chain.reverse();
    chain
}

fn trim_by_road_budget(grid: &Grid, full: Vec<CellCoord>, budget: u32) -> Vec<CellCoord> {
    let mut trimmed = Vec::with_capacity(full.len());
    let mut roads_crossed = 0u32;

    for cell in full {
        trimmed.push(cell);
        if grid.weight(cell) == Some(ROAD_WEIGHT) {
            roads_crossed += 1;
            if roads_crossed >= budget {
                break;
            }
        }
    }

    trimmed
}

#[derive(Clone, Copy, Debug)]
struct Neighbors {
    buffer: [CellCoord; 4],
    len: usize,
}

impl Neighbors {
    fn around(cell: CellCoord, width: u32, height: u32) -> Self {
        let mut neighbors = Self {
            buffer: [cell; 4],
            len: 0,
        };

        if let Some(row) = cell.row().checked_sub(1) {
            neighbors.push(CellCoord::new(cell.column(), row));
        }
        if cell.column() + 1 < width {
            neighbors.push(CellCoord::new(cell.column() + 1, cell.row()));
        }
        if cell.row() + 1 < height {
            neighbors.push(CellCoord::new(cell.column(), cell.row() + 1));
        }
        if let Some(column) = cell.column().checked_sub(1) {
            neighbors.push(CellCoord::new(column, cell.row()));
        }

        neighbors
    }

    fn push(&mut self, cell: CellCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = cell;
            self.len += 1;
        }
    }

    fn as_mut_slice(&mut self) -> &mut [CellCoord] {
        &mut self.buffer[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_respect_grid_bounds() {
        let mut corner = Neighbors::around(CellCoord::new(0, 0), 3, 3);
        let mut cells = corner.as_mut_slice().to_vec();
        cells.sort();
        assert_eq!(cells, vec![CellCoord::new(0, 1), CellCoord::new(1, 0)]);

        let mut center = Neighbors::around(CellCoord::new(1, 1), 3, 3);
        assert_eq!(center.as_mut_slice().len(), 4);
    }

    #[test]
    fn trimming_stops_after_budget_road_cells() {
        let grid = Grid::from_rows(&[vec![ROAD_WEIGHT, 3, ROAD_WEIGHT, ROAD_WEIGHT, 3]])
            .expect("valid grid");
        let full: Vec<_> = (0..5).map(|column| CellCoord::new(column, 0)).collect();

        let trimmed = trim_by_road_budget(&grid, full.clone(), 2);
        assert_eq!(trimmed, full[..3].to_vec());

        let untouched = trim_by_road_budget(&grid, full.clone(), 5);
        assert_eq!(untouched, full);
    }

    #[test]
    fn castle_lookup_prefers_first_row_major_cell() {
        let grid = Grid::from_rows(&[vec![1, 1, CASTLE_WEIGHT], vec![CASTLE_WEIGHT, 1, 1]])
            .expect("valid grid");
        assert_eq!(
            PathFinder::find_castle_point(&grid),
            Ok(CellCoord::new(2, 0))
        );
    }
}
